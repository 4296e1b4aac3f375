use serde::{Deserialize, Serialize};

use crate::billing::TrialConfig;
use crate::utils::{get_env_with_prefix, parse_env_with_prefix};

/// Main configuration for the entitlement core
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub trial: TrialConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json")]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    false
}

/// Builder for Config with environment variable support
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_trial(mut self, trial: TrialConfig) -> Self {
        self.config.trial = trial;
        self
    }

    pub fn with_trial_duration_days(mut self, days: u32) -> Self {
        self.config.trial.duration_days = days;
        self
    }

    pub fn with_grace_period_days(mut self, days: u32) -> Self {
        self.config.trial.grace_period_days = days;
        self
    }

    /// Load configuration from environment variables with EDUDASH_ prefix
    ///
    /// Unparseable values are logged and ignored; the current value is kept.
    pub fn from_env(mut self) -> Self {
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = parse_env_with_prefix("LOG_JSON") {
            self.config.logging.json = json;
        }
        if let Some(days) = parse_env_with_prefix("TRIAL_DURATION_DAYS") {
            self.config.trial.duration_days = days;
        }
        if let Some(days) = parse_env_with_prefix("TRIAL_GRACE_PERIOD_DAYS") {
            self.config.trial.grace_period_days = days;
        }

        self
    }

    /// Build the configuration, validating all settings
    ///
    /// # Errors
    ///
    /// Returns an error if the log level is unknown or the trial
    /// configuration is unusable.
    pub fn build(self) -> crate::error::Result<Config> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(crate::error::EduDashError::bad_request(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        self.config.trial.validate()?;

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
