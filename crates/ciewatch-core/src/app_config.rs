use std::path::PathBuf;

use crate::targets::Target;

/// Where the availability rows are read from once the wizard reaches its
/// final step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Positional cells of the rendered availability table.
    Dom,
    /// JSON body of the availability network response.
    Response,
}

impl std::fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionMode::Dom => write!(f, "dom"),
            ExtractionMode::Response => write!(f, "response"),
        }
    }
}

/// How many candidates each target may produce per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// First candidate in source order only.
    First,
    /// Every candidate, each tracked separately.
    All,
}

#[derive(Clone)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[redacted]")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub start_url: String,
    pub targets: Vec<Target>,
    pub selection: SelectionMode,
    pub location: String,
    pub extraction_mode: ExtractionMode,
    pub availability_endpoint: String,
    pub poll_interval_secs: u64,
    pub poll_jitter_secs: u64,
    pub step_timeout_secs: u64,
    pub availability_timeout_secs: u64,
    pub typing_delay_ms: u64,
    pub headless: bool,
    pub log_level: String,
    pub notify_errors: bool,
    pub notify_max_retries: u32,
    pub state_path: Option<PathBuf>,
    pub telegram: Option<TelegramConfig>,
}
