//! zonesync server
//!
//! ```bash
//! zonesync --config zonesync.json
//! ZONESYNC_CONFIG=/etc/zonesync.json zonesync --bind 127.0.0.1:8080
//! ```

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zonesync_api::{build_router, ApiState};
use zonesync_common::ServiceConfig;

#[derive(Parser)]
#[command(name = "zonesync")]
#[command(version)]
#[command(about = "Subscriber/zone reconciliation and device provisioning API", long_about = None)]
struct Cli {
    /// Service configuration file
    #[arg(long, short, env = "ZONESYNC_CONFIG", default_value = "zonesync.json")]
    config: String,

    /// Listen address, overrides the configuration file
    #[arg(long, env = "ZONESYNC_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ServiceConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config))?;
    let state = ApiState::from_config(&config)?;
    let zones = state.registry.len();

    let addr = cli.bind.unwrap_or_else(|| config.bind_addr.clone());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!(%addr, zones, "zonesync listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
