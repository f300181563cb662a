use anyhow::{Context, Result};
use disc_watcher::{AppConfig, Watcher};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("disc_watcher=info".parse()?),
        )
        .init();

    info!("Starting disc watcher run...");

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let watcher = Watcher::from_config(&config)?;
    let summary = watcher.run().await?;

    for delta in &summary.deltas {
        info!("New: [{}] {} ({})", delta.vendor, delta.title, delta.category);
    }

    Ok(())
}
