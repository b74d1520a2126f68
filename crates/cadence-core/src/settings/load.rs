//! Settings loading and configuration errors

use std::path::Path;

use super::Settings;

/// Configuration error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Unparseable step token
    #[error("Invalid step '{token}': {reason}")]
    InvalidStep { token: String, reason: String },
    /// Retention outside (0, 1)
    #[error("Request retention must be between 0 and 1 (exclusive), got {0}")]
    InvalidRetention(f64),
    /// Maximum interval outside 1..=36500 days
    #[error("Maximum interval must be between 1 and 36500 days, got {0}")]
    InvalidMaximumInterval(u32),
    /// Weight vector of the wrong length
    #[error("{algorithm} expects {expected} weights, found {found}")]
    WeightCount {
        algorithm: &'static str,
        expected: usize,
        found: usize,
    },
    /// NaN or infinite weight
    #[error("{algorithm} weight w{index} is not finite")]
    NonFiniteWeight { algorithm: &'static str, index: usize },
    /// Non-positive easiness or multiplier
    #[error("Invalid {field}: {value}")]
    InvalidEasiness { field: &'static str, value: f64 },
    /// Minimum interval outside [1, maximum]
    #[error("Interval bounds out of order: minimum {minimum}, maximum {maximum}")]
    IntervalBounds { minimum: u32, maximum: u32 },
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed JSON
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Read, parse and validate a settings file.
///
/// Missing fields take their defaults.
pub fn load_settings(path: impl AsRef<Path>) -> Result<Settings, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)?;
    let settings: Settings = serde_json::from_str(&raw)?;
    settings.validate()?;
    tracing::debug!(path = %path.display(), algorithm = %settings.algorithm, "Loaded settings");
    Ok(settings)
}
