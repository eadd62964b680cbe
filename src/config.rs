//! Configuration loader and validator for the moderation pipeline.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub app: App,
    pub prediction: Prediction,
    pub notification: Notification,
}

/// Pipeline-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct App {
    /// Number of concurrent moderation workers.
    pub workers: usize,
    /// Sleep between result polls against a prediction service.
    pub poll_interval_secs: u64,
    /// Any toxicity category score strictly above this rejects the draft.
    pub toxicity_threshold: f64,
}

/// Endpoints of the two prediction services (same predict/poll shape).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Prediction {
    pub toxicity_url: String,
    pub country_url: String,
}

/// Notification service endpoint and shared API key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub url: String,
    pub api_key: String,
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.workers == 0 {
        return Err(ConfigError::Invalid("app.workers must be > 0"));
    }
    if cfg.app.poll_interval_secs == 0 {
        return Err(ConfigError::Invalid("app.poll_interval_secs must be > 0"));
    }
    if !(0.0..=1.0).contains(&cfg.app.toxicity_threshold) {
        return Err(ConfigError::Invalid(
            "app.toxicity_threshold must be within [0, 1]",
        ));
    }

    if cfg.prediction.toxicity_url.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "prediction.toxicity_url must be non-empty",
        ));
    }
    if cfg.prediction.country_url.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "prediction.country_url must be non-empty",
        ));
    }

    if cfg.notification.url.trim().is_empty() {
        return Err(ConfigError::Invalid("notification.url must be non-empty"));
    }
    if cfg.notification.api_key.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "notification.api_key must be non-empty",
        ));
    }

    Ok(())
}

/// Canonical example YAML, also used by config tests.
pub fn example() -> &'static str {
    r#"app:
  workers: 10
  poll_interval_secs: 5
  toxicity_threshold: 0.6

prediction:
  toxicity_url: "http://toxicity-service:5001"
  country_url: "http://country-service:5002"

notification:
  url: "http://notification-service:8084"
  api_key: "NOTIFICATION_API_KEY"
"#
}
