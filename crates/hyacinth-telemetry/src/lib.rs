//! # Hyacinth Telemetry
//!
//! Logging setup for Hyacinth.
//!
//! The fake request, the router and the server emit `tracing` events
//! (state transitions, routing decisions, swallowed listener failures).
//! Nothing is printed until a subscriber is installed; [`init_logging`]
//! installs one from a [`LogConfig`].
//!
//! ```rust,ignore
//! use hyacinth_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::testing())?;
//! ```

#![doc(html_root_url = "https://docs.rs/hyacinth-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};
