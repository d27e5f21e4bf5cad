//! # Hyacinth
//!
//! **A fake `XMLHttpRequest` and an expectation server for testing HTTP
//! client code without a network.**
//!
//! - [`core`] - the event model and the [`FakeXhr`](core::FakeXhr) state
//!   machine, plus the ambient constructor slot application code creates
//!   requests through
//! - [`server`] - register expectations, launch, and every request the
//!   application sends is answered by the first matching handler or a 404
//! - [`config`] / [`telemetry`] - layered settings and `tracing` output
//!
//! ## Quick Start
//!
//! ```rust
//! use hyacinth::prelude::*;
//!
//! let server = Server::new();
//! server.get("/", |_req, res, _next| {
//!     res.send("hello world")?;
//!     Ok(())
//! });
//! let guard = server.launch();
//!
//! // application code
//! let xhr = ambient::create_request();
//! xhr.open("GET", "/").unwrap();
//! xhr.send(None).unwrap();
//!
//! assert_eq!(xhr.ready_state(), ReadyState::Done);
//! assert_eq!(xhr.response_text().as_deref(), Some("hello world"));
//! server.shutdown(guard);
//! ```

#![doc(html_root_url = "https://docs.rs/hyacinth/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export the fake request and event model
pub use hyacinth_core as core;

// Re-export the expectation server
pub use hyacinth_server as server;

// Re-export configuration
pub use hyacinth_config as config;

// Re-export logging setup
pub use hyacinth_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```rust
/// use hyacinth::prelude::*;
/// ```
pub mod prelude {
    pub use hyacinth_core::ambient;
    pub use hyacinth_core::{
        DeliveryPolicy, Event, EventKind, EventSource, EventTarget, FakeXhr, Headers, Listener,
        OpenOptions, ReadyState, ResponseType, ResponseValue, XhrError, XhrResult,
    };

    pub use hyacinth_server::{
        Expectation, LaunchGuard, Next, Outcome, Request, Response, Server, ServerError,
        ServerOptions, UrlMatcher,
    };

    pub use hyacinth_config::{ConfigLoader, HyacinthConfig};

    pub use hyacinth_telemetry::{init_logging, LogConfig};
}
