//! Main configuration type.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult, LoggingConfig, ServerConfig, XhrConfig, LOG_LEVELS};

/// Complete Hyacinth configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from
/// files, strings and environment variables.
///
/// # Example
///
/// ```
/// use hyacinth_config::HyacinthConfig;
/// use hyacinth_core::DeliveryPolicy;
///
/// let config = HyacinthConfig::default();
/// assert_eq!(config.xhr.delivery_policy(), DeliveryPolicy::WholeBody);
/// assert!(!config.server.log_unmatched);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct HyacinthConfig {
    /// Fake request settings.
    #[serde(default)]
    pub xhr: XhrConfig,

    /// Expectation server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HyacinthConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if:
    /// - `xhr.chunk_size` is present and zero
    /// - `logging.level` is not one of trace, debug, info, warn, error
    pub fn validate(&self) -> ConfigResult<()> {
        if self.xhr.chunk_size == Some(0) {
            return Err(ConfigError::invalid_value(
                "xhr.chunk_size",
                "must be greater than 0",
            ));
        }

        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!(
                    "expected one of {}, got '{}'",
                    LOG_LEVELS.join(", "),
                    self.logging.level
                ),
            ));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Pretty debug logging with source locations, and unmatched requests
    /// logged at `warn`.
    ///
    /// ```
    /// use hyacinth_config::HyacinthConfig;
    ///
    /// let config = HyacinthConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// assert!(config.server.log_unmatched);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = hyacinth_telemetry::LogFormat::Pretty;
        config.logging.include_location = true;

        config.server.log_unmatched = true;

        config
    }
}
