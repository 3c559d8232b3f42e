// main.rs
use poem::{Server, listener::TcpListener};
use tracing_subscriber::EnvFilter;

use blog_api::{AppState, Config, app, store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    let state = AppState::connect(&config).await?;
    store::ensure_schema(&state.db).await?;

    let addr = config.bind_addr();
    tracing::info!(addr = %addr, "server running");
    Server::new(TcpListener::bind(addr)).run(app(state)).await?;
    Ok(())
}
