//! Worker binary for the Tally engagement pipeline.
//!
//! Consumes engagement facts from NATS and applies them to the durable
//! `PostgreSQL` store. This is the other half of the optimistic write
//! path: the request side acknowledges after cache update and publish,
//! and this worker makes the facts durable.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `tally-config.yaml`
//! 2. Initialize structured logging (tracing) at the configured level
//! 3. Connect to `PostgreSQL` and run migrations
//! 4. Connect to NATS
//! 5. Consume facts until the subscription ends or Ctrl-C

mod error;

use std::path::Path;
use std::time::Duration;

use tally_core::TallyConfig;
use tally_events::EngagementConsumer;
use tally_store::{FactStore, PostgresPool};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::WorkerError;

/// Environment variable overriding the config file location.
const CONFIG_ENV: &str = "TALLY_CONFIG";

/// Default config file, resolved against the working directory.
const CONFIG_FILE: &str = "tally-config.yaml";

/// Application entry point for the worker.
///
/// # Errors
///
/// Returns an error if any startup step or the consumption loop fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. This happens before logging init because the
    //    configured level seeds the default filter.
    let config_path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| CONFIG_FILE.to_owned());
    let (config, loaded_from_file) = load_config(Path::new(&config_path))?;

    // 2. Initialize structured logging. RUST_LOG wins when set; otherwise
    //    the configured level applies.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("tally-worker starting");
    if loaded_from_file {
        info!(
            path = config_path,
            topic = config.pipeline.topic,
            level = config.logging.level,
            "Configuration loaded"
        );
    } else {
        info!(path = config_path, "Config file not found, using defaults");
    }

    // 3. Connect to PostgreSQL and run migrations.
    let pool = PostgresPool::connect(
        &config.infrastructure.postgres_url,
        Duration::from_secs(10),
    )
    .await
    .map_err(WorkerError::from)?;
    pool.run_migrations().await.map_err(WorkerError::from)?;
    info!("Database connected, migrations applied");

    let store = FactStore::new(pool.pool().clone());

    // 4. Connect to NATS.
    let client = tally_events::connect(&config.infrastructure.nats_url)
        .await
        .map_err(WorkerError::from)?;
    info!(nats_url = config.infrastructure.nats_url, "NATS connected");

    // 5. Consume until the subscription ends or Ctrl-C.
    let consumer = EngagementConsumer::new(client, config.pipeline.topic, store);
    tokio::select! {
        result = consumer.run() => {
            result.map_err(WorkerError::from)?;
            info!("fact subscription ended");
        }
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(|e| WorkerError::Signal {
                message: format!("{e}"),
            })?;
            info!("shutdown signal received");
        }
    }

    pool.close().await;
    info!("tally-worker shutdown complete");
    Ok(())
}

/// Load the pipeline configuration from `path`.
///
/// A missing file falls back to defaults (reported by the second tuple
/// element); a malformed file is an error.
fn load_config(path: &Path) -> Result<(TallyConfig, bool), WorkerError> {
    if path.exists() {
        let config = TallyConfig::load_from_path(path)?;
        Ok((config, true))
    } else {
        Ok((TallyConfig::default(), false))
    }
}
