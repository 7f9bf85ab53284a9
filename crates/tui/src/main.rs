mod app;

use std::{
    fs::{self, OpenOptions},
    path::Path,
    sync::Mutex,
};

use anyhow::{Context, Result};
use parkline_core::{
    config::{self, AppConfig},
    Bootstrap, ParkingSession, SnapshotStore,
};
use tracing::{error, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    init_logging(&config.log_dir)?;

    let store = SnapshotStore::new(config.snapshot_path.clone());
    let (bootstrap, notice) = match ParkingSession::bootstrap(&store) {
        Ok(bootstrap) => (bootstrap, None),
        Err(err) if err.is_structural() => {
            error!(?err, "Refusing to start from an invalid snapshot");
            return Err(err).with_context(|| {
                format!(
                    "fix or remove {} to start a new simulation",
                    store.path().display()
                )
            });
        }
        Err(err) => {
            warn!(?err, "Snapshot unreadable, starting a new lot");
            let notice = format!("Could not read saved state ({err}); starting fresh");
            (Bootstrap::AwaitingCapacity, Some(notice))
        }
    };

    let mut app = app::ParkingApp::new(store, bootstrap, config.default_capacity);
    if let Some(notice) = notice {
        app = app.with_notice(notice);
    }
    app.run().await?;
    println!("Exiting simulation.");
    Ok(())
}

fn init_logging(log_dir: &Path) -> Result<()> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;
    let log_path = log_dir.join("parkline.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // The terminal UI owns stdout, so logs only go to the file.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
