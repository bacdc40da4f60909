//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.
//!
//! Layer stack (outermost → innermost):
//! 1. CORS → 2. `Cache-Control: no-store` → 3. Access log → Handler
//!
//! CORS only answers origins listed in the configuration. With an empty list
//! no `Access-Control-Allow-Origin` header is ever sent, so browsers keep
//! other sites from reading or writing records.

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router over `core`, allowing cross-origin calls only from
/// `allowed_origins`.
pub fn api_router(core: Arc<CoreState>, allowed_origins: Vec<HeaderValue>) -> Router {
    let ctx = ApiContext::new(core);

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route(
            "/patients/:id",
            get(endpoints::patients::detail)
                .put(endpoints::patients::update)
                .delete(endpoints::patients::remove),
        )
        .route(
            "/export",
            get(endpoints::export::download).post(endpoints::export::save),
        )
        .with_state(ctx);

    Router::new()
        .nest("/api", routes)
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(cors_layer(allowed_origins))
}

fn cors_layer(allowed_origins: Vec<HeaderValue>) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .into_iter()
        .filter(|origin| origin.as_bytes() != b"*")
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::api::types::PatientListResponse;
    use crate::models::PatientRecord;

    fn test_app() -> (Router, Arc<CoreState>, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let core = Arc::new(CoreState::open(tmp.path().join("patient_records.csv")).unwrap());
        (api_router(core.clone(), Vec::new()), core, tmp)
    }

    fn seed(core: &CoreState, id: &str, name: &str, disease: &str) {
        core.insert(PatientRecord {
            patient_id: id.into(),
            name: name.into(),
            age: "30".into(),
            disease: disease.into(),
            ..Default::default()
        })
        .unwrap();
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    #[tokio::test]
    async fn health_reports_records_file() {
        let (app, core, _tmp) = test_app();

        let response = app.oneshot(get_request("/api/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("Cache-Control").unwrap(), "no-store");
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(
            json["records_file"],
            core.store().path().display().to_string()
        );
    }

    #[tokio::test]
    async fn create_then_list() {
        let (app, _core, _tmp) = test_app();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/patients",
                json!({"patient_id": "P1", "name": "Alice", "age": 30, "disease": "Flu"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["age"], "30");
        assert!(!created["admission_date"].as_str().unwrap().is_empty());

        let response = app.oneshot(get_request("/api/patients")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let list: PatientListResponse =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(list.count, 1);
        assert!(!list.degraded);
        assert_eq!(list.records[0].name, "Alice");
    }

    #[tokio::test]
    async fn duplicate_create_conflicts() {
        let (app, core, _tmp) = test_app();
        seed(&core, "P1", "Alice", "");

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/patients",
                json!({"patient_id": "P1", "name": "Other", "age": "40"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(core.store().list_all().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_age_is_bad_request() {
        let (app, _core, _tmp) = test_app();

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/patients",
                json!({"patient_id": "P1", "name": "Alice", "age": "151"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["message"], "Age must be between 0 and 150");
    }

    #[tokio::test]
    async fn search_filters_by_field() {
        let (app, core, _tmp) = test_app();
        seed(&core, "P1", "Alice", "Asthma");
        seed(&core, "P2", "Bob", "Flu");

        let response = app
            .oneshot(get_request("/api/patients?field=Disease&q=flu"))
            .await
            .unwrap();

        let list: PatientListResponse =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(list.count, 1);
        assert_eq!(list.records[0].patient_id, "P2");
    }

    #[tokio::test]
    async fn search_defaults_to_name() {
        let (app, core, _tmp) = test_app();
        seed(&core, "P1", "John SMITH", "");
        seed(&core, "P2", "Jane Doe", "");

        let response = app
            .oneshot(get_request("/api/patients?q=smith"))
            .await
            .unwrap();

        let list: PatientListResponse =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(list.count, 1);
        assert_eq!(list.records[0].patient_id, "P1");
    }

    #[tokio::test]
    async fn search_unknown_field_is_bad_request() {
        let (app, _core, _tmp) = test_app();

        let response = app
            .oneshot(get_request("/api/patients?field=Shoe%20Size&q=9"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn detail_found_and_missing() {
        let (app, core, _tmp) = test_app();
        seed(&core, "P1", "Alice", "");

        let response = app.clone().oneshot(get_request("/api/patients/P1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["name"], "Alice");

        let response = app.oneshot(get_request("/api/patients/P9")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_by_selected_id() {
        let (app, core, _tmp) = test_app();
        seed(&core, "P1", "Alice", "");

        let response = app
            .oneshot(json_request(
                "PUT",
                "/api/patients/P1",
                json!({"patient_id": "P10", "name": "Alice B", "age": 31}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!core.store().exists("P1").unwrap());
        assert_eq!(core.store().get("P10").unwrap().unwrap().name, "Alice B");
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let (app, _core, _tmp) = test_app();

        let response = app
            .oneshot(json_request(
                "PUT",
                "/api/patients/P9",
                json!({"patient_id": "P9", "name": "Nobody", "age": 30}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_then_delete_again() {
        let (app, core, _tmp) = test_app();
        seed(&core, "P1", "Alice", "");

        let request = Request::builder()
            .method("DELETE")
            .uri("/api/patients/P1")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["deleted"], 1);

        let request = Request::builder()
            .method("DELETE")
            .uri("/api/patients/P1")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn export_download_is_raw_table() {
        let (app, core, _tmp) = test_app();
        seed(&core, "P1", "Alice", "Flu");

        let response = app.oneshot(get_request("/api/export")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "text/csv; charset=utf-8"
        );
        let body = body_bytes(response).await;
        assert_eq!(body, std::fs::read(core.store().path()).unwrap());
    }

    #[tokio::test]
    async fn export_download_rejects_unknown_format() {
        let (app, _core, _tmp) = test_app();

        let response = app
            .oneshot(get_request("/api/export?format=xlsx"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn export_save_writes_destination() {
        let (app, core, tmp) = test_app();
        seed(&core, "P1", "Alice", "Flu");
        let destination = tmp.path().join("exports/records.tsv");

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/export",
                json!({"destination": destination.to_string_lossy(), "format": "tsv"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["format"], "tsv");
        let written = std::fs::read_to_string(&destination).unwrap();
        assert!(written.starts_with("Patient ID\tName"));
    }

    #[tokio::test]
    async fn export_save_requires_destination() {
        let (app, _core, _tmp) = test_app();

        let response = app
            .oneshot(json_request("POST", "/api/export", json!({"destination": "  "})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // ───────────────────────────────────────
    // CORS
    // ───────────────────────────────────────

    const TRUSTED_ORIGIN: &str = "http://localhost:3000";

    fn app_with_trusted_origin() -> (Router, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let core = Arc::new(CoreState::open(tmp.path().join("patient_records.csv")).unwrap());
        let app = api_router(core, vec![HeaderValue::from_static(TRUSTED_ORIGIN)]);
        (app, tmp)
    }

    fn preflight(uri: &str, origin: &str) -> Request<Body> {
        Request::builder()
            .method("OPTIONS")
            .uri(uri)
            .header("Origin", origin)
            .header("Access-Control-Request-Method", "POST")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn foreign_origin_gets_no_cors_grant() {
        let (app, core, _tmp) = test_app();
        seed(&core, "P1", "Alice", "Flu");

        let request = Request::builder()
            .uri("/api/patients")
            .header("Origin", "https://evil.example")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert!(response
            .headers()
            .get("Access-Control-Allow-Origin")
            .is_none());

        let response = app
            .oneshot(preflight("/api/export", "https://evil.example"))
            .await
            .unwrap();
        assert!(response
            .headers()
            .get("Access-Control-Allow-Origin")
            .is_none());
    }

    #[tokio::test]
    async fn configured_origin_is_echoed() {
        let (app, _tmp) = app_with_trusted_origin();

        let request = Request::builder()
            .uri("/api/patients")
            .header("Origin", TRUSTED_ORIGIN)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get("Access-Control-Allow-Origin").unwrap(),
            TRUSTED_ORIGIN
        );

        let response = app
            .oneshot(preflight("/api/export", "https://evil.example"))
            .await
            .unwrap();
        assert!(response
            .headers()
            .get("Access-Control-Allow-Origin")
            .is_none());
    }

    #[test]
    fn wildcard_origin_is_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let core = Arc::new(CoreState::open(tmp.path().join("patient_records.csv")).unwrap());
        // AllowOrigin::list panics on "*"; it must be filtered out first.
        let _app = api_router(core, vec![HeaderValue::from_static("*")]);
    }
}
