//! # Hyacinth Server
//!
//! Expectation-based router for fake requests.
//!
//! A [`Server`] collects [`Expectation`]s (method + URL matcher + handler)
//! and, once launched, answers every request created through the ambient
//! constructor when it is sent:
//!
//! - [`Server`] / [`LaunchGuard`] - registration, launch and exact restore on shutdown
//! - [`Expectation`] / [`UrlMatcher`] - exact or pattern URL rules
//! - [`Request`] / [`Response`] - the handler-facing facade over a [`FakeXhr`](hyacinth_core::FakeXhr)
//! - [`look_up`] / [`Next`] - first-match routing with explicit continuation and 404 fallback
//!
//! # Example
//!
//! ```rust
//! use hyacinth_core::{ambient, ResponseValue};
//! use hyacinth_server::Server;
//! use serde_json::json;
//!
//! let server = Server::new();
//! server.get("/greeting", |_req, res, _next| {
//!     res.json(&json!({"hello": "salut"}))?;
//!     Ok(())
//! });
//! let guard = server.launch();
//!
//! let xhr = ambient::create_request();
//! xhr.open("GET", "/greeting").unwrap();
//! xhr.send(None).unwrap();
//! assert_eq!(xhr.response(), ResponseValue::Json(json!({"hello": "salut"})));
//!
//! server.shutdown(guard);
//! ```

#![doc(html_root_url = "https://docs.rs/hyacinth-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod expectation;
mod query;
mod request;
mod response;
mod router;
mod server;

pub use error::{ServerError, ServerResult};
pub use expectation::{Expectation, ExpectationBuilder, Handler, UrlMatcher};
pub use query::{parse_query, Query};
pub use request::Request;
pub use response::{Reply, Response};
pub use router::{look_up, not_found_body, Next, Outcome};
pub use server::{LaunchGuard, Server, ServerOptions};
