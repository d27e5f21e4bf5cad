//! Typed configuration for Hyacinth.
//!
//! Settings that shape how fakes behave and what gets logged:
//! - [`XhrConfig`] - response delivery (whole body or chunked)
//! - [`ServerConfig`] - expectation server behaviour
//! - [`LoggingConfig`] - level and format handed to `hyacinth-telemetry`
//!
//! Unknown fields are rejected. Layers apply in order defaults, file or
//! string, then `PREFIX__SECTION__KEY` environment variables.
//!
//! # Example
//!
//! ```no_run
//! use hyacinth_config::ConfigLoader;
//!
//! # fn main() -> Result<(), hyacinth_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("hyacinth.toml")?
//!     .with_env_prefix("HYACINTH")
//!     .load()?;
//!
//! println!("delivery: {:?}", config.xhr.delivery_policy());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [xhr]
//! chunk_size = 10
//!
//! [server]
//! log_unmatched = true
//!
//! [logging]
//! level = "debug"
//! format = "pretty"
//! include_location = false
//! ```

#![doc(html_root_url = "https://docs.rs/hyacinth-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::HyacinthConfig;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use schema::{LoggingConfig, ServerConfig, XhrConfig, LOG_LEVELS};
