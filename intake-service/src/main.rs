use anyhow::Context;
use intake_service::{ServiceConfig, create_app, init_tracing};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env();
    init_tracing(config.log_format);

    let app = create_app(&config).context("Failed to load demo fixtures")?;

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    let addr = listener.local_addr()?;

    info!("IntakePal demo service starting on {}", addr);
    info!("Landing content: http://{}/", addr);
    info!("Voice assistant: POST http://{}/chat/start", addr);
    info!("Intake wizard: POST http://{}/intake/start", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
