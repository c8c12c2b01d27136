//! Popwatch - popup auto-closer for Linux desktops
//!
//! Runs the watch loop against the live session until Ctrl+C.

use popwatch::config::WatchConfig;
use popwatch::{desktop, watcher::Watcher};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (stderr, so console status lines stay on stdout)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".to_string().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting popup watcher");

    let config = WatchConfig::default();
    let desktop = desktop::connect()?;
    let mut watcher = Watcher::new(config, desktop)?;

    let outcome = tokio::select! {
        res = watcher.run() => Some(res),
        _ = tokio::signal::ctrl_c() => None,
    };

    match outcome {
        Some(res) => res?,
        None => {
            watcher.record_stop();
            println!("\nPopup watcher stopped");
        }
    }

    Ok(())
}
