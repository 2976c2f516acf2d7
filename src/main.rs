use std::net::SocketAddr;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use classpulse::config::Config;
use classpulse::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    let state = AppState::new(&config)?;
    tracing::info!("✅ AppState initialized");

    let app = classpulse::router(state.clone());

    // Sessions are also reaped opportunistically on registry reads; this
    // loop catches idle periods.
    let reaper_state = state.clone();
    let reaper_interval = Duration::from_secs(config.reaper_interval_secs);
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(reaper_interval).await;
            let reaped = reaper_state.registry.reap(chrono::Utc::now()).await;
            if reaped > 0 {
                tracing::info!(reaped, "🧹 Reaped expired quiz sessions");
            }
        }
    });

    let addr: SocketAddr = config.bind_addr.parse()?;
    tracing::info!("🚀 Server listening on http://{}", addr);
    tracing::info!("✅ Background session reaper started");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
