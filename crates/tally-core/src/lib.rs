//! Core of the Tally engagement pipeline: configuration and the
//! orchestrator that decides, per operation, between the optimistic
//! cache+queue path and synchronous direct persistence.
//!
//! # Modules
//!
//! - [`config`] -- typed YAML configuration with defaults
//! - [`engagement`] -- the [`EngagementService`] orchestrator
//! - [`error`] -- the user-visible error taxonomy
//!
//! # Metric Naming Convention
//!
//! All pipeline crates emit counters through the [`metrics`] facade with an
//! `engagement_` prefix and a `_total` suffix; the exporter is chosen by
//! the host process. Labels: `result` (hit/miss), `kind` (fact kind),
//! `operation` (like/unlike/view/comment).

pub mod config;
pub mod engagement;
pub mod error;

pub use config::{
    CacheConfig, ConfigError, InfrastructureConfig, LoggingConfig, PipelineConfig, TallyConfig,
};
pub use engagement::{CommentReceipt, EngagementOutcome, EngagementService};
pub use error::EngagementError;
