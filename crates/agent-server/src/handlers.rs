//! HTTP Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use agent_core::RunStatus;
use clinical_agent::{PatientId, PatientRun};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub model_connected: bool,
}

#[derive(Debug, Deserialize)]
pub struct PatientRequest {
    #[serde(default)]
    pub patient_id: String,
}

/// Envelope returned for every processed patient
#[derive(Debug, Serialize, Deserialize)]
pub struct PatientResponse {
    pub success: bool,
    pub patient_id: String,
    pub status: RunStatus,
    pub message: String,
    /// Full transcript of the run
    pub output: String,
    pub turns: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<PatientRun> for PatientResponse {
    fn from(run: PatientRun) -> Self {
        let status = run.status();
        let message = format!("Processing {status} for patient {}", run.patient_id);
        let output = run.transcript();
        let (turns, error) = match &run.outcome {
            Ok(report) => (Some(report.turns), None),
            Err(e) => (None, Some(e.user_message())),
        };

        Self {
            success: status == RunStatus::Completed,
            patient_id: run.patient_id.to_string(),
            status,
            message,
            output,
            turns,
            error,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let model_connected = state.provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        model_connected,
    })
}

/// `POST /patient` with `{"patient_id": ...}`
pub async fn process_patient(
    State(state): State<AppState>,
    Json(payload): Json<PatientRequest>,
) -> ApiResult<PatientResponse> {
    run_patient(&state, &payload.patient_id).await
}

/// `GET` or `POST /patient/{patient_id}`
pub async fn process_patient_by_path(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> ApiResult<PatientResponse> {
    run_patient(&state, &patient_id).await
}

async fn run_patient(state: &AppState, raw_id: &str) -> ApiResult<PatientResponse> {
    let patient_id = PatientId::parse(raw_id).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "patient_id is required".into(),
                code: "INVALID_PATIENT_ID".into(),
            }),
        )
    })?;

    let run = state.workflow.run(patient_id).await;
    if let Err(e) = &run.outcome {
        tracing::error!(patient_id = %run.patient_id, status = %run.status(), "Agent error: {}", e);
    }

    Ok(Json(PatientResponse::from(run)))
}
