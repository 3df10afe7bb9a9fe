use anyhow::{Context, Result};
use hackrx_api::{build_router, config::Settings, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment variables and logging
    dotenv::dotenv().ok();
    env_logger::init();

    let settings = Settings::from_env()?;
    let state = AppState::from_settings(&settings)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
