use std::net::SocketAddr;

use anyhow::Context;

use taskdeck::config::AppConfig;
use taskdeck::logging::init_logging;
use taskdeck::web::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env().context("loading configuration")?;
    if config.uses_default_key() {
        tracing::warn!("APP_SECURE_KEY not set; using the built-in development key");
    }

    let port = config.port;
    let state = AppState::initialize(config)
        .await
        .context("connecting to the database")?;
    let app = taskdeck::web::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "taskdeck listening");
    axum::serve(listener, app).await.context("serving")?;
    Ok(())
}
