use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use raggate::core::config::AppPaths;
use raggate::core::logging;
use raggate::server::router;
use raggate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = AppPaths::new();
    logging::init(&paths);

    let state = AppState::initialize(&paths)?;

    let bind_addr = format!(
        "{}:{}",
        state.config.server.host, state.config.server.port
    );

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    tracing::info!("Listening on {}", addr);

    let app: Router = router::router(state);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
