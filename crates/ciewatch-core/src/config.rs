use crate::app_config::{AppConfig, ExtractionMode, SelectionMode, TelegramConfig};
use crate::targets::parse_targets;
use crate::ConfigError;

pub const DEFAULT_START_URL: &str =
    "https://www.prenotazionicie.interno.gov.it/cittadino/n/sc/wizardAppuntamentoCittadino/home";

/// Upper bound for step and availability timeouts (one day).
pub const MAX_TIMEOUT_SECS: u64 = 86_400;
/// Upper bound for the poll interval and its jitter (one week).
pub const MAX_POLL_SECS: u64 = 604_800;
/// Upper bound for the inter-keystroke delay (one minute).
pub const MAX_TYPING_DELAY_MS: u64 = 60_000;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str, max: u64| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        let value = raw.trim().parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
        if value > max {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("{value} exceeds the maximum of {max}"),
            });
        }
        Ok(value)
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.trim().parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_flag = |var: &str, default: &str| -> Result<bool, ConfigError> {
        parse_bool(var, &or_default(var, default))
    };

    let start_url = or_default("CIEWATCH_START_URL", DEFAULT_START_URL);
    let targets = parse_targets("CIEWATCH_TARGETS", &or_default("CIEWATCH_TARGETS", "Municipio I"))?;
    let selection = if parse_flag("CIEWATCH_SINGLE_TARGET", "true")? {
        SelectionMode::First
    } else {
        SelectionMode::All
    };
    let location = or_default("CIEWATCH_LOCATION", "ROMA");
    let extraction_mode = parse_extraction_mode(&or_default("CIEWATCH_EXTRACTION_MODE", "dom"))?;
    let availability_endpoint = or_default("CIEWATCH_AVAILABILITY_ENDPOINT", "disponibilita");

    let poll_interval_secs = parse_u64("CIEWATCH_POLL_INTERVAL_SECS", "300", MAX_POLL_SECS)?;
    let poll_jitter_secs = parse_u64("CIEWATCH_POLL_JITTER_SECS", "60", MAX_POLL_SECS)?;
    let step_timeout_secs = parse_u64("CIEWATCH_STEP_TIMEOUT_SECS", "10", MAX_TIMEOUT_SECS)?;
    let availability_timeout_secs =
        parse_u64("CIEWATCH_AVAILABILITY_TIMEOUT_SECS", "15", MAX_TIMEOUT_SECS)?;
    let typing_delay_ms = parse_u64("CIEWATCH_TYPING_DELAY_MS", "100", MAX_TYPING_DELAY_MS)?;

    if step_timeout_secs == 0 || availability_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: if step_timeout_secs == 0 {
                "CIEWATCH_STEP_TIMEOUT_SECS".to_string()
            } else {
                "CIEWATCH_AVAILABILITY_TIMEOUT_SECS".to_string()
            },
            reason: "timeouts must be greater than zero".to_string(),
        });
    }

    let headless = parse_flag("CIEWATCH_HEADLESS", "true")?;
    let log_level = or_default("CIEWATCH_LOG_LEVEL", "info");
    let notify_errors = parse_flag("CIEWATCH_NOTIFY_ERRORS", "false")?;
    let notify_max_retries = parse_u32("CIEWATCH_NOTIFY_MAX_RETRIES", "2")?;
    let state_path = lookup("CIEWATCH_STATE_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let telegram = match lookup("TELEGRAM_TOKEN").ok().filter(|t| !t.is_empty()) {
        Some(token) => {
            let chat_id = lookup("TELEGRAM_CHAT_ID")
                .ok()
                .filter(|c| !c.is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar("TELEGRAM_CHAT_ID".to_string()))?;
            Some(TelegramConfig { token, chat_id })
        }
        None => None,
    };

    Ok(AppConfig {
        start_url,
        targets,
        selection,
        location,
        extraction_mode,
        availability_endpoint,
        poll_interval_secs,
        poll_jitter_secs,
        step_timeout_secs,
        availability_timeout_secs,
        typing_delay_ms,
        headless,
        log_level,
        notify_errors,
        notify_max_retries,
        state_path,
        telegram,
    })
}

fn parse_extraction_mode(s: &str) -> Result<ExtractionMode, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "dom" | "table" => Ok(ExtractionMode::Dom),
        "response" | "json" => Ok(ExtractionMode::Response),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CIEWATCH_EXTRACTION_MODE".to_string(),
            reason: format!("unknown extraction mode '{other}' (expected 'dom' or 'response')"),
        }),
    }
}

fn parse_bool(var: &str, s: &str) -> Result<bool, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
