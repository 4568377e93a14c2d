use std::net::SocketAddr;
use std::time::Duration;
use tokio::task;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seatmap_service::{app, config::Config, AppState};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Seatmap API ({})", config.app.environment);
    info!("Venue backend: {}", config.upstream.base_url);

    let addr: SocketAddr = format!("{}:{}", config.app.host, config.app.port).parse()?;
    let session_ttl = Duration::from_secs(config.sessions.ttl_seconds);
    let sweep_interval = Duration::from_secs(config.sessions.sweep_interval_seconds);
    let state = AppState::new(config).await?;

    // --- Фоновые задачи ---

    // Брошенные сеансы редактора иначе копились бы в памяти
    let sessions = state.sessions.clone();
    task::spawn(async move {
        loop {
            tokio::time::sleep(sweep_interval).await;
            sessions.sweep_idle(session_ttl).await;
        }
    });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);
    axum::serve(listener, app(state).into_make_service()).await?;
    Ok(())
}
