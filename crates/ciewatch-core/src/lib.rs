//! Shared domain types for the appointment watcher: configuration, office
//! targets, availability records, the target filter and the dedup state.

pub mod app_config;
pub mod config;
pub mod filter;
pub mod record;
pub mod targets;
pub mod watcher;

pub use app_config::{AppConfig, ExtractionMode, SelectionMode, TelegramConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use filter::{filter_candidates, first_candidate, is_well_formed_date, FilterCriteria};
pub use record::AvailabilityRecord;
pub use targets::{parse_targets, Target};
pub use watcher::{detect_new_slots, NewSlot, WatcherState};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
