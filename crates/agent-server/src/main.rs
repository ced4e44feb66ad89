//! Clinical agent HTTP server

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_runtime::provider_from_env;
use agent_server::{AppState, router};
use clinical_agent::{ClinicalConfig, ClinicalServices, ClinicalWorkflow};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment before anything reads it
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClinicalConfig::from_env()?;
    let (provider, options) = provider_from_env()?;

    match provider.health_check().await {
        Ok(true) => tracing::info!(model = %options.model, "✓ Model provider reachable"),
        Ok(false) | Err(_) => {
            tracing::warn!(model = %options.model, "⚠ Model provider not reachable - runs will fail");
        }
    }

    let services = ClinicalServices::from_config(&config)?;
    let workflow =
        ClinicalWorkflow::with_provider(provider.clone(), options, services, &config.limits)?;

    tracing::info!("Registered {} tools:", workflow.agent().tools().len());
    for name in workflow.agent().tools().names() {
        tracing::info!("  • {}", name);
    }
    tracing::info!(
        max_turns = config.limits.max_turns,
        deadline_secs = config.limits.run_deadline.as_secs(),
        "Run limits"
    );

    let app = router(AppState {
        workflow: Arc::new(workflow),
        provider,
    });

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🚀 clinical agent listening on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health               - Health check");
    tracing::info!("  POST /patient              - Process patient (JSON body)");
    tracing::info!("  GET  /patient/{{patient_id}} - Process patient");
    tracing::info!("  POST /patient/{{patient_id}} - Process patient");

    axum::serve(listener, app).await?;

    Ok(())
}
