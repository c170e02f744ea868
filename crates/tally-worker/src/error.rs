//! Error type for the worker binary.
//!
//! [`WorkerError`] wraps the failure modes of worker startup and the
//! consumption loop so `main` can propagate everything with `?`.

/// Top-level error for the worker binary.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: tally_core::ConfigError,
    },

    /// Database connection or migration failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: tally_store::StoreError,
    },

    /// NATS connection or subscription failed.
    #[error("events error: {source}")]
    Events {
        /// The underlying events error.
        #[from]
        source: tally_events::EventsError,
    },

    /// Shutdown signal handling failed.
    #[error("signal error: {message}")]
    Signal {
        /// Description of the signal failure.
        message: String,
    },
}
