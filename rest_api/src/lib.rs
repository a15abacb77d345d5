// rest_api/src/lib.rs

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error as AnyhowError};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};

use lib::errors::ClinicalError;
use lib::service::{ClinicalService, HealthReport, StatusReport};
use models::{PatientId, VitalInput};

#[derive(Debug, Error)]
pub enum RestApiError {
    #[error("{0}")]
    Clinical(#[from] ClinicalError),
    #[error("Malformed request body: {0}")]
    MalformedBody(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<JsonRejection> for RestApiError {
    fn from(rejection: JsonRejection) -> Self {
        RestApiError::MalformedBody(rejection.body_text())
    }
}

impl RestApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            RestApiError::MalformedBody(_) | RestApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RestApiError::Clinical(e) => match e {
                ClinicalError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                ClinicalError::NotFound(_) => StatusCode::NOT_FOUND,
                ClinicalError::InvalidData(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for RestApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            warn!("Request failed with {}: {}", status, self);
        } else {
            debug!("Request rejected with {}: {}", status, self);
        }

        let body = Json(json!({
            "status": "error",
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[derive(Clone)]
struct AppState {
    service: Arc<ClinicalService>,
}

#[derive(Debug, Deserialize)]
struct LatestVitalQuery {
    patient_id: Option<String>,
}

// GET /
async fn health_check_handler(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.service.health().await)
}

// POST /api/vitals
async fn receive_vitals_handler(
    State(state): State<AppState>,
    payload: Result<Json<VitalInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), RestApiError> {
    let Json(input) = payload?;
    let record = state.service.ingest(input).await?;
    debug!("Received vitals {} for {}", record.id, record.patient_id);
    Ok((StatusCode::CREATED, Json(json!({ "status": "success" }))))
}

// GET /api/get_latest_vital?patient_id=
async fn latest_vital_handler(
    State(state): State<AppState>,
    Query(query): Query<LatestVitalQuery>,
) -> Result<Json<StatusReport>, RestApiError> {
    let patient_id = match query.patient_id {
        Some(raw) => PatientId::new(raw).map_err(|e| RestApiError::InvalidInput(e.to_string()))?,
        None => PatientId::default(),
    };
    let report = state.service.latest_status(&patient_id).await?;
    Ok(Json(report))
}

/// Builds the API router around a shared service.
pub fn router(service: Arc<ClinicalService>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/", get(health_check_handler))
        .route("/api/vitals", post(receive_vitals_handler))
        .route("/api/get_latest_vital", get(latest_vital_handler))
        .with_state(AppState { service })
        .layer(cors)
}

/// Serves the API until `shutdown_rx` fires.
pub async fn start_server(
    addr: SocketAddr,
    service: Arc<ClinicalService>,
    shutdown_rx: oneshot::Receiver<()>,
) -> Result<(), AnyhowError> {
    let app = router(service);

    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind to address: {}", addr))?;
    info!("EzyMedi AI node listening on {}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
            info!("Received shutdown signal.");
        })
        .await
        .context("REST API server failed to start or run")?;

    info!("REST API server stopped.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use lib::config::ClinicalThresholds;
    use lib::storage_engine::{InMemoryStorage, VitalStore};
    use std::time::Duration;
    use tower::ServiceExt;

    fn app_with_store() -> Router {
        let store: Arc<dyn VitalStore> = Arc::new(InMemoryStorage::new());
        router(Arc::new(ClinicalService::new(
            Some(store),
            None,
            ClinicalThresholds::default(),
            Duration::from_secs(1),
        )))
    }

    fn offline_app() -> Router {
        router(Arc::new(ClinicalService::new(None, None, ClinicalThresholds::default(), Duration::from_secs(1))))
    }

    fn post_vitals(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/vitals")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_store_and_model_state() {
        let response = offline_app().oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "online");
        assert_eq!(body["service"], "EzyMedi AI Node");
        assert_eq!(body["database"], "offline");
        assert_eq!(body["ai_model"], "missing");
    }

    #[tokio::test]
    async fn post_then_get_latest_vital() {
        let app = app_with_store();
        let response = app
            .clone()
            .oneshot(post_vitals(r#"{"patient_id":"patient_002","spo2_percent":89,"ecg_bpm":150}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await, json!({ "status": "success" }));

        let response = app.oneshot(get_request("/api/get_latest_vital?patient_id=patient_002")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["vitals"]["patient_id"], "patient_002");
        assert_eq!(body["vitals"]["humidity_percent"], 50.0);
        assert_eq!(body["vitals"]["block_hash"].as_str().unwrap().len(), 64);
        assert_eq!(body["anomaly_report"]["status"], "abnormal");
        assert_eq!(body["anomaly_report"]["alerts"][0], "HYPOXIA");
        assert_eq!(body["anomaly_report"]["forecast"], "LEARNING_BASELINE");
        assert_eq!(body["forecast_description"], "Learning baseline signature");
        assert_eq!(body["alert_messages"], json!(["CRITICAL: HYPOXIA DETECTED"]));
        assert_eq!(body["abp_progress"], 0.1);
        assert_eq!(body["mode"], "Clinical Validation Node");
    }

    #[tokio::test]
    async fn latest_vital_defaults_to_first_patient() {
        let app = app_with_store();
        app.clone()
            .oneshot(post_vitals(r#"{"patient_id":"patient_001","spo2_percent":98,"ecg_bpm":72}"#))
            .await
            .unwrap();
        let body = json_body(app.oneshot(get_request("/api/get_latest_vital")).await.unwrap()).await;
        assert_eq!(body["vitals"]["patient_id"], "patient_001");
        assert_eq!(body["anomaly_report"]["status"], "normal");
    }

    #[tokio::test]
    async fn unknown_patient_is_404() {
        let response = app_with_store().oneshot(get_request("/api/get_latest_vital?patient_id=nobody")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_body_is_400() {
        let response = app_with_store().oneshot(post_vitals("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = app_with_store().oneshot(post_vitals(r#"{"patient_id":""}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = app_with_store().oneshot(post_vitals(r#"{"ecg_bpm":80}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn offline_store_is_503() {
        let response = offline_app()
            .oneshot(post_vitals(r#"{"patient_id":"patient_001","ecg_bpm":80}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let response = offline_app().oneshot(get_request("/api/get_latest_vital")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["status"], "error");
    }
}
