//! Export endpoints.
//!
//! - `GET /api/export?format=`: download the records (csv, tsv or json)
//! - `POST /api/export`: write the records to a path on this machine

use std::path::PathBuf;

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::run_blocking;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ExportQuery, ExportRequest};
use crate::export::{self, ExportFormat, ExportResult};

fn parse_format(raw: Option<&str>) -> Result<ExportFormat, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => Ok(s.parse::<ExportFormat>()?),
        None => Ok(ExportFormat::default()),
    }
}

pub async fn download(
    State(ctx): State<ApiContext>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let format = parse_format(query.format.as_deref())?;
    let body = run_blocking(move || Ok(export::render(ctx.core.store(), format)?)).await?;

    let disposition = format!(
        "attachment; filename=\"patient_records.{}\"",
        format.extension()
    );
    Ok((
        [
            (header::CONTENT_TYPE, format.mime_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

pub async fn save(
    State(ctx): State<ApiContext>,
    Json(request): Json<ExportRequest>,
) -> Result<Json<ExportResult>, ApiError> {
    let destination = request.destination.trim();
    if destination.is_empty() {
        return Err(ApiError::BadRequest("Export destination is required".into()));
    }
    let destination = PathBuf::from(destination);
    let format = parse_format(request.format.as_deref())?;

    let result =
        run_blocking(move || Ok(export::write_to(ctx.core.store(), format, &destination)?)).await?;
    Ok(Json(result))
}
