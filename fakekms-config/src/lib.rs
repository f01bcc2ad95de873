//! Configuration management for the fake KMS engine

use fakekms_logging::LogFormat;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Prefix for environment variables read by [`FakeKmsConfig::from_env`]
pub const ENV_PREFIX: &str = "FAKEKMS";

/// Longest accepted destroy schedule, 120 days
pub const MAX_DESTROY_SCHEDULED_DURATION_SECS: u64 = 120 * 24 * 60 * 60;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FakeKmsConfig {
    /// Artificial delay before key material generation starts, in milliseconds
    pub generation_delay_ms: u64,
    /// How long a version stays DESTROY_SCHEDULED before it is destroyed
    pub destroy_scheduled_duration_secs: u64,
    /// Interval used by clients polling for generation to complete
    pub poll_interval_ms: u64,
    /// How long clients wait for a version to leave PENDING_GENERATION
    pub generation_timeout_secs: u64,
    pub log_level: String,
    /// Parsed by [`LogFormat`]
    pub log_format: String,
}

impl Default for FakeKmsConfig {
    fn default() -> Self {
        Self {
            generation_delay_ms: 0,
            destroy_scheduled_duration_secs: 24 * 60 * 60,
            poll_interval_ms: 10,
            generation_timeout_secs: 60,
            log_level: "info".to_string(),
            log_format: "json".to_string(),
        }
    }
}

impl FakeKmsConfig {
    /// Load configuration from environment variables
    ///
    /// Reads a `.env` file when present, then overlays every `FAKEKMS_*`
    /// variable (for example `FAKEKMS_GENERATION_DELAY_MS=50`) on top of the
    /// defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        let loaded: Self = config::Config::builder()
            .set_default("generation_delay_ms", defaults.generation_delay_ms)?
            .set_default(
                "destroy_scheduled_duration_secs",
                defaults.destroy_scheduled_duration_secs,
            )?
            .set_default("poll_interval_ms", defaults.poll_interval_ms)?
            .set_default("generation_timeout_secs", defaults.generation_timeout_secs)?
            .set_default("log_level", defaults.log_level)?
            .set_default("log_format", defaults.log_format)?
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid("log_level must not be empty".to_string()));
        }
        if self.destroy_scheduled_duration_secs > MAX_DESTROY_SCHEDULED_DURATION_SECS {
            return Err(ConfigError::Invalid(format!(
                "destroy_scheduled_duration_secs must be at most {}, got {}",
                MAX_DESTROY_SCHEDULED_DURATION_SECS, self.destroy_scheduled_duration_secs
            )));
        }
        self.log_format()?;
        Ok(())
    }

    pub fn log_format(&self) -> Result<LogFormat, ConfigError> {
        self.log_format.parse().map_err(ConfigError::Invalid)
    }

    pub fn generation_delay(&self) -> Duration {
        Duration::from_millis(self.generation_delay_ms)
    }

    pub fn destroy_scheduled_duration(&self) -> Duration {
        Duration::from_secs(self.destroy_scheduled_duration_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Get log level, defaulting to "info"
    pub fn log_level(&self) -> &str {
        if self.log_level.is_empty() {
            "info"
        } else {
            &self.log_level
        }
    }
}
