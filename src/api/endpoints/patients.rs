//! Patient record endpoints.
//!
//! - `GET /api/patients`: list, or search with `?field=&q=`
//! - `GET /api/patients/:id`: one record
//! - `POST /api/patients`: add a record
//! - `PUT /api/patients/:id`: replace the record currently stored under `:id`
//! - `DELETE /api/patients/:id`: remove the record stored under `:id`

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use super::run_blocking;
use crate::api::error::ApiError;
use crate::api::types::{
    ApiContext, DeleteResponse, PatientListResponse, PatientQuery, DEFAULT_SEARCH_FIELD,
};
use crate::models::PatientRecord;

pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<PatientQuery>,
) -> Result<Json<PatientListResponse>, ApiError> {
    let field = query.field.unwrap_or_else(|| DEFAULT_SEARCH_FIELD.to_string());
    let term = query.q.unwrap_or_default();

    let snapshot = run_blocking(move || Ok(ctx.core.search_or_empty(&field, &term)?)).await?;
    Ok(Json(snapshot.into()))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<PatientRecord>, ApiError> {
    run_blocking(move || {
        ctx.core
            .store()
            .get(&patient_id)?
            .map(Json)
            .ok_or_else(|| ApiError::NotFound(format!("Patient not found: {patient_id}")))
    })
    .await
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Json(record): Json<PatientRecord>,
) -> Result<(StatusCode, Json<PatientRecord>), ApiError> {
    let stored = run_blocking(move || Ok(ctx.core.insert(record)?)).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
    Json(record): Json<PatientRecord>,
) -> Result<Json<PatientRecord>, ApiError> {
    let stored = run_blocking(move || Ok(ctx.core.update(&patient_id, record)?)).await?;
    Ok(Json(stored))
}

pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = patient_id.clone();
    let deleted = run_blocking(move || Ok(ctx.core.delete(&id)?)).await?;
    Ok(Json(DeleteResponse {
        patient_id,
        deleted,
    }))
}
