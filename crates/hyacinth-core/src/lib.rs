//! # Hyacinth Core
//!
//! Scripted stand-in for the browser's `XMLHttpRequest`.
//!
//! This crate provides the pieces a request mock is built from:
//!
//! - [`Event`], [`EventTarget`] and the [`EventSource`] trait - listener registry with
//!   `on<type>` handler slots
//! - [`XhrEventTarget`] - target with the transfer lifecycle slots pre-declared
//! - [`FakeXhr`] - the request state machine (`open` → `send` → `respond`, plus abort,
//!   error and timeout)
//! - [`Headers`] - ordered, case-insensitive header list and the unsafe header rules
//! - [`Document`] - parsed `responseXML`
//! - [`ambient`] - the thread-local request constructor a server swaps while launched
//! - [`XhrError`] - typed failures carrying a DOM exception [`ErrorKind`]

#![doc(html_root_url = "https://docs.rs/hyacinth-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod ambient;
mod document;
mod error;
mod event;
mod fake_xhr;
mod headers;
mod status;
mod xhr_target;

pub use document::{is_xml_mime, mime_essence, Document, DocumentKind};
pub use error::{ErrorKind, XhrError, XhrResult};
pub use event::{
    Event, EventKind, EventListener, EventSource, EventTarget, Listener, ListenerError,
    ListenerRegistry, ListenerResult,
};
pub use fake_xhr::{
    DeliveryPolicy, FakeXhr, OpenOptions, ReadyState, ResponseType, ResponseValue, SendHook,
};
pub use headers::{is_hidden_response_header, is_unsafe_header, Headers};
pub use status::reason_phrase;
pub use xhr_target::XhrEventTarget;
