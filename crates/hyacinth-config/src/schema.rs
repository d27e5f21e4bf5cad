//! Configuration sections.

use hyacinth_core::DeliveryPolicy;
use hyacinth_telemetry::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};

/// Log levels accepted by [`LoggingConfig::level`].
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Fake request settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct XhrConfig {
    /// Deliver response bodies in chunks of this many characters, one
    /// LOADING transition per chunk. Unset delivers the whole body at once.
    #[serde(default)]
    pub chunk_size: Option<usize>,
}

impl XhrConfig {
    /// Returns the delivery policy these settings describe.
    ///
    /// ```
    /// use hyacinth_config::XhrConfig;
    /// use hyacinth_core::DeliveryPolicy;
    ///
    /// let xhr = XhrConfig { chunk_size: Some(10) };
    /// assert_eq!(xhr.delivery_policy(), DeliveryPolicy::Chunked(10));
    /// ```
    #[must_use]
    pub fn delivery_policy(&self) -> DeliveryPolicy {
        DeliveryPolicy::from_chunk_size(self.chunk_size)
    }
}

/// Expectation server settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Log requests no expectation answered at `warn` instead of `debug`.
    #[serde(default)]
    pub log_unmatched: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// Converts to the telemetry crate's [`LogConfig`].
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            format: self.format,
            file_line_info: self.include_location,
            ..LogConfig::default()
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
