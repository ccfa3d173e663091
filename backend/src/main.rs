use clubhub_backend::{start_server, AppConfig};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Loading configuration");
    let config = AppConfig::load()?;
    info!("Starting in {:?} mode on port {}", config.environment, config.port);

    start_server(config).await
}
