use dotenvy::dotenv;
use register_core::observability::init_tracing;
use register_core::HttpRegistrationClient;
use register_frontend::config::get_configuration;
use register_frontend::startup::build_router;
use register_frontend::AppState;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "register-frontend",
        &configuration.telemetry.log_level,
        configuration.telemetry.otlp_endpoint.as_deref(),
    );

    register_frontend::services::metrics::init_metrics();

    let client = HttpRegistrationClient::new(configuration.registration.base_url.clone())
        .map_err(|e| anyhow::anyhow!("Registration client error: {}", e))?;
    info!(
        base_url = %client.base_url(),
        path = %configuration.registration.register_path,
        "Registration endpoint configured"
    );

    let state = AppState::new(Arc::new(client), &configuration.registration);
    let app = build_router(state);

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!("Starting register-frontend on {}", address);
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
