//! HTTP trigger for the clinical workflow agent
//!
//! Every request runs one isolated patient workflow and answers with the
//! transcript and a structured status.

pub mod handlers;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use state::AppState;

use crate::handlers::{health_check, process_patient, process_patient_by_path};

/// Application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/patient", post(process_patient))
        .route(
            "/patient/{patient_id}",
            get(process_patient_by_path).post(process_patient_by_path),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
