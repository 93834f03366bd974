//! services/learner/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Timings that drive the notes persistence policy and the study timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkspaceTiming {
    /// Idle time after the last edit before notes are saved.
    pub save_debounce: Duration,
    /// Period of the flush that saves dirty notes regardless of typing activity.
    pub autosave_interval: Duration,
    /// Study sessions shorter than this are not reported.
    pub min_study_session: Duration,
    /// How often a running study timer republishes its elapsed time.
    pub timer_tick: Duration,
}

impl Default for WorkspaceTiming {
    fn default() -> Self {
        Self {
            save_debounce: Duration::from_millis(2_000),
            autosave_interval: Duration::from_secs(30),
            min_study_session: Duration::from_secs(30),
            timer_tick: Duration::from_secs(1),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub store_path: PathBuf,
    pub log_level: Level,
    pub request_timeout: Duration,
    pub timing: WorkspaceTiming,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- API and Storage Settings ---
        let api_base_url = lookup("LEARNER_API_BASE_URL")
            .unwrap_or_else(|| "http://localhost:8000/api/v1".to_string());
        let api_base_url = api_base_url.trim_end_matches('/').to_string();
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(
                "LEARNER_API_BASE_URL".to_string(),
                format!("'{}' is not an http(s) URL", api_base_url),
            ));
        }

        let store_path = lookup("LEARNER_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./learner-store.json"));

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let request_timeout =
            Duration::from_secs(parse_number(&lookup, "LEARNER_REQUEST_TIMEOUT_SECS", 30)?);

        // --- Workspace Timing ---
        let timing = WorkspaceTiming {
            save_debounce: Duration::from_millis(parse_number(
                &lookup,
                "LEARNER_SAVE_DEBOUNCE_MS",
                2_000,
            )?),
            autosave_interval: Duration::from_secs(parse_number(
                &lookup,
                "LEARNER_AUTOSAVE_INTERVAL_SECS",
                30,
            )?),
            min_study_session: Duration::from_secs(parse_number(
                &lookup,
                "LEARNER_MIN_STUDY_SESSION_SECS",
                30,
            )?),
            ..WorkspaceTiming::default()
        };
        if timing.autosave_interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "LEARNER_AUTOSAVE_INTERVAL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            api_base_url,
            store_path,
            log_level,
            request_timeout,
            timing,
        })
    }
}

fn parse_number<F>(lookup: &F, name: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_match_the_workspace_policy() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8000/api/v1");
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.timing, WorkspaceTiming::default());
        assert_eq!(config.timing.save_debounce, Duration::from_secs(2));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = Config::from_lookup(lookup_from(&[(
            "LEARNER_API_BASE_URL",
            "https://learn.example.com/api/v1/",
        )]))
        .unwrap();
        assert_eq!(config.api_base_url, "https://learn.example.com/api/v1");
    }

    #[test]
    fn rejects_bad_numbers_and_levels() {
        let err = Config::from_lookup(lookup_from(&[("LEARNER_SAVE_DEBOUNCE_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name, _) if name == "LEARNER_SAVE_DEBOUNCE_MS"));

        let err = Config::from_lookup(lookup_from(&[("RUST_LOG", "chatty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name, _) if name == "RUST_LOG"));
    }

    #[test]
    fn rejects_zero_autosave_interval() {
        let err = Config::from_lookup(lookup_from(&[("LEARNER_AUTOSAVE_INTERVAL_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(..)));
    }
}
