//! The scripted request double.
//!
//! [`FakeXhr`] answers the full request lifecycle contract of a browser
//! `XMLHttpRequest`: `open` → `send` → headers received → loading → done,
//! plus the abort, network error and timeout side paths. Nothing touches a
//! network. Responses are scripted through [`FakeXhr::respond`] (or the
//! lower-level [`FakeXhr::set_response_headers`] and
//! [`FakeXhr::set_response_body`]), usually from a send hook installed by a
//! server.
//!
//! All transitions run synchronously in the caller's stack. The `async` flag
//! decides which transitions fire observable `readystatechange` events and
//! whether `timeout` is writable; it never defers work.
//!
//! The state lives behind a `RefCell`. Every operation releases its borrow
//! before dispatching events or calling the send hook, so listeners and
//! hooks may call back into the same request.
//!
//! # Example
//!
//! ```rust
//! use hyacinth_core::{FakeXhr, ReadyState};
//!
//! let xhr = FakeXhr::new();
//! xhr.open("get", "/greeting").unwrap();
//! xhr.send(None).unwrap();
//! xhr.respond(200, [("Content-Type", "text/plain")], "hello").unwrap();
//!
//! assert_eq!(xhr.ready_state(), ReadyState::Done);
//! assert_eq!(xhr.method(), "GET");
//! assert_eq!(xhr.response_text().as_deref(), Some("hello"));
//! ```

use crate::document::Document;
use crate::error::{XhrError, XhrResult};
use crate::event::{Event, EventKind, EventSource, ListenerRegistry};
use crate::headers::{is_hidden_response_header, is_unsafe_header, Headers};
use crate::status::reason_phrase;
use crate::xhr_target::XhrEventTarget;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace, warn};

/// Methods normalized to uppercase by `open`.
const KNOWN_METHODS: [&str; 6] = ["DELETE", "GET", "HEAD", "OPTIONS", "POST", "PUT"];

/// Methods `open` refuses.
const FORBIDDEN_METHODS: [&str; 3] = ["CONNECT", "TRACE", "TRACK"];

/// Content type applied by `send` when none was set.
const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Request lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ReadyState {
    /// Constructed, or reset by `abort`.
    #[default]
    Unsent,
    /// `open` succeeded.
    Opened,
    /// Response headers are available.
    HeadersReceived,
    /// The response body is being delivered.
    Loading,
    /// The response is complete, or the request failed.
    Done,
}

impl ReadyState {
    /// Returns the numeric readyState value (0 to 4).
    #[must_use]
    pub const fn value(self) -> u16 {
        match self {
            Self::Unsent => 0,
            Self::Opened => 1,
            Self::HeadersReceived => 2,
            Self::Loading => 3,
            Self::Done => 4,
        }
    }

    /// Looks up a state by its numeric value.
    #[must_use]
    pub const fn from_value(value: u16) -> Option<Self> {
        match value {
            0 => Some(Self::Unsent),
            1 => Some(Self::Opened),
            2 => Some(Self::HeadersReceived),
            3 => Some(Self::Loading),
            4 => Some(Self::Done),
            _ => None,
        }
    }

    /// Returns the constant name, e.g. `HEADERS_RECEIVED`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unsent => "UNSENT",
            Self::Opened => "OPENED",
            Self::HeadersReceived => "HEADERS_RECEIVED",
            Self::Loading => "LOADING",
            Self::Done => "DONE",
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `responseType` of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResponseType {
    /// Never set; reads as `""`.
    #[default]
    Empty,
    /// `"text"`
    Text,
    /// `"json"`
    Json,
    /// `"document"`
    Document,
}

impl ResponseType {
    /// Returns the property value as a script would read it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "",
            Self::Text => "text",
            Self::Json => "json",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `response` property.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResponseValue {
    /// No response, or JSON that failed to parse.
    #[default]
    Null,
    /// The response text.
    Text(String),
    /// The parsed JSON body.
    Json(serde_json::Value),
}

impl ResponseValue {
    /// Returns true for [`ResponseValue::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text, if this is a text response.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the JSON value, if this is a JSON response.
    #[must_use]
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// How `set_response_body` hands the body to `responseText`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryPolicy {
    /// One LOADING transition, then the whole text at once.
    #[default]
    WholeBody,
    /// One LOADING transition per chunk of this many characters.
    ///
    /// Each LOADING fires before its chunk is appended, so the first one
    /// observes an empty `responseText`. An empty body still yields one
    /// LOADING. A size of zero is treated as one.
    Chunked(usize),
}

impl DeliveryPolicy {
    /// Builds a policy from an optional chunk size.
    #[must_use]
    pub fn from_chunk_size(chunk_size: Option<usize>) -> Self {
        chunk_size.map_or(Self::WholeBody, Self::Chunked)
    }
}

/// Optional arguments of [`FakeXhr::open_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOptions {
    /// Whether the request is asynchronous. Defaults to true.
    pub asynchronous: bool,
    /// Credentials user name.
    pub user: Option<String>,
    /// Credentials password.
    pub password: Option<String>,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            asynchronous: true,
            user: None,
            password: None,
        }
    }
}

impl OpenOptions {
    /// Options for an asynchronous request without credentials.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the request synchronous.
    #[must_use]
    pub fn synchronous(mut self) -> Self {
        self.asynchronous = false;
        self
    }

    /// Sets the user name.
    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Sets the password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

/// Callback run at the end of a successful `send`.
pub type SendHook = Rc<dyn Fn(&FakeXhr) -> anyhow::Result<()>>;

#[derive(Debug)]
struct XhrState {
    ready_state: ReadyState,
    method: String,
    url: String,
    user: Option<String>,
    password: Option<String>,
    asynchronous: bool,
    send_flag: bool,
    error_flag: bool,
    aborted: bool,
    upload_complete: bool,
    upload_events: bool,
    request_headers: Headers,
    request_body: Option<String>,
    response_headers: Headers,
    response_text: Option<String>,
    response_xml: Option<Document>,
    response: ResponseValue,
    response_type: ResponseType,
    status: u16,
    status_text: Option<String>,
    mime_override: Option<String>,
    timeout: u32,
    delivery: DeliveryPolicy,
}

impl Default for XhrState {
    fn default() -> Self {
        Self {
            ready_state: ReadyState::Unsent,
            method: String::new(),
            url: String::new(),
            user: None,
            password: None,
            asynchronous: true,
            send_flag: false,
            error_flag: false,
            aborted: false,
            upload_complete: false,
            upload_events: false,
            request_headers: Headers::new(),
            request_body: None,
            response_headers: Headers::new(),
            response_text: None,
            response_xml: None,
            response: ResponseValue::Null,
            response_type: ResponseType::Empty,
            status: 0,
            status_text: Some(String::new()),
            mime_override: None,
            timeout: 0,
            delivery: DeliveryPolicy::WholeBody,
        }
    }
}

impl XhrState {
    fn clear_response(&mut self) {
        self.status = 0;
        self.status_text = Some(String::new());
        self.response_text = match self.response_type {
            ResponseType::Empty | ResponseType::Text => Some(String::new()),
            _ => None,
        };
        self.response_xml = None;
        self.response = ResponseValue::Null;
        self.response_headers = Headers::new();
    }

    /// Marks the upload complete, returning whether it was still pending.
    fn finish_upload(&mut self) -> bool {
        let pending = !self.upload_complete;
        self.upload_complete = true;
        pending
    }

    fn effective_mime(&self) -> Option<String> {
        self.mime_override
            .clone()
            .or_else(|| self.response_headers.get("Content-Type").map(String::from))
    }
}

struct XhrInner {
    id: u64,
    state: RefCell<XhrState>,
    registry: ListenerRegistry<FakeXhr>,
    upload: XhrEventTarget,
    send_hook: RefCell<Option<SendHook>>,
}

/// A scripted `XMLHttpRequest`.
///
/// Cloning yields another handle to the same request.
#[derive(Clone)]
pub struct FakeXhr {
    inner: Rc<XhrInner>,
}

impl Default for FakeXhr {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for FakeXhr {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for FakeXhr {}

impl fmt::Debug for FakeXhr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("FakeXhr")
            .field("id", &self.inner.id)
            .field("method", &state.method)
            .field("url", &state.url)
            .field("ready_state", &state.ready_state)
            .field("status", &state.status)
            .finish_non_exhaustive()
    }
}

impl EventSource for FakeXhr {
    fn registry(&self) -> &ListenerRegistry<Self> {
        &self.inner.registry
    }
}

impl FakeXhr {
    /// Creates an unsent request.
    #[must_use]
    pub fn new() -> Self {
        let mut slots = EventKind::TRANSFER.to_vec();
        slots.push(EventKind::ReadyStateChange);
        Self {
            inner: Rc::new(XhrInner {
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                state: RefCell::new(XhrState::default()),
                registry: ListenerRegistry::with_handler_slots(&slots),
                upload: XhrEventTarget::new(),
                send_hook: RefCell::new(None),
            }),
        }
    }

    fn state(&self) -> Ref<'_, XhrState> {
        self.inner.state.borrow()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut XhrState) -> R) -> R {
        f(&mut self.inner.state.borrow_mut())
    }

    /// Dispatches a lifecycle event on the request, logging listener failures.
    fn fire(&self, kind: EventKind) {
        trace!(xhr = self.inner.id, event = kind.as_str(), "dispatching event");
        if let Err(error) = self.inner.registry.dispatch(self, &Event::from(kind)) {
            warn!(
                xhr = self.inner.id,
                event = kind.as_str(),
                error = %error,
                "event listener failed"
            );
        }
    }

    /// Dispatches a lifecycle event on the upload channel.
    fn fire_upload(&self, kind: EventKind) {
        trace!(xhr = self.inner.id, event = kind.as_str(), "dispatching upload event");
        let upload = &self.inner.upload;
        if let Err(error) = upload.registry().dispatch(upload, &Event::from(kind)) {
            warn!(
                xhr = self.inner.id,
                event = kind.as_str(),
                error = %error,
                "upload event listener failed"
            );
        }
    }

    fn fire_end_sequence(&self, kind: EventKind, upload_pending: bool) {
        for event in [EventKind::Progress, kind, EventKind::LoadEnd] {
            self.fire(event);
        }
        if upload_pending {
            for event in [EventKind::Progress, kind, EventKind::LoadEnd] {
                self.fire_upload(event);
            }
        }
    }

    /// Assigns the readyState and fires `readystatechange`.
    fn set_ready_state(&self, state: ReadyState) {
        let previous = self.with_state(|s| std::mem::replace(&mut s.ready_state, state));
        debug!(xhr = self.inner.id, from = %previous, to = %state, "readyState transition");
        self.fire(EventKind::ReadyStateChange);
    }

    /// Moves to `state`, firing events only for asynchronous requests.
    fn advance(&self, state: ReadyState, asynchronous: bool) {
        if asynchronous {
            self.set_ready_state(state);
        } else {
            self.with_state(|s| s.ready_state = state);
        }
    }

    /// Returns a process-unique id, used in log output.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Opens an asynchronous request without credentials.
    ///
    /// # Errors
    ///
    /// See [`open_with`](Self::open_with).
    pub fn open(&self, method: &str, url: &str) -> XhrResult<()> {
        self.open_with(method, url, OpenOptions::default())
    }

    /// Opens the request.
    ///
    /// Known verbs are uppercased, anything else is kept verbatim. Request
    /// headers, response fields and flags are reset for a new cycle, then
    /// the request moves to OPENED and fires `readystatechange`.
    ///
    /// # Errors
    ///
    /// - [`XhrError::ForbiddenMethod`] for CONNECT, TRACE and TRACK in any case.
    /// - [`XhrError::InvalidAccess`] when opening synchronously while a
    ///   timeout is set.
    pub fn open_with(&self, method: &str, url: &str, options: OpenOptions) -> XhrResult<()> {
        let upper = method.to_ascii_uppercase();
        if FORBIDDEN_METHODS.contains(&upper.as_str()) {
            return Err(XhrError::ForbiddenMethod {
                method: method.to_string(),
            });
        }
        let method = if KNOWN_METHODS.contains(&upper.as_str()) {
            upper
        } else {
            method.to_string()
        };

        self.with_state(|s| {
            if !options.asynchronous && s.timeout != 0 {
                return Err(XhrError::invalid_access(
                    "synchronous requests cannot have a timeout",
                ));
            }
            let response_type = s.response_type;
            let timeout = s.timeout;
            let delivery = s.delivery;
            *s = XhrState {
                method,
                url: url.to_string(),
                user: options.user,
                password: options.password,
                asynchronous: options.asynchronous,
                response_type,
                timeout,
                delivery,
                ..XhrState::default()
            };
            Ok(())
        })?;

        debug!(xhr = self.inner.id, method = %self.method(), url, "request opened");
        self.set_ready_state(ReadyState::Opened);
        Ok(())
    }

    /// Adds a request header, joining repeated names with `", "`.
    ///
    /// # Errors
    ///
    /// - [`XhrError::InvalidState`] unless the request is OPENED and not sent.
    /// - [`XhrError::UnsafeHeader`] for transport-controlled header names.
    pub fn set_request_header(&self, name: &str, value: &str) -> XhrResult<()> {
        self.with_state(|s| {
            if s.ready_state != ReadyState::Opened || s.send_flag {
                return Err(XhrError::invalid_state(
                    "setRequestHeader",
                    "request must be opened and not yet sent",
                    s.ready_state,
                ));
            }
            if is_unsafe_header(name) {
                return Err(XhrError::UnsafeHeader {
                    name: name.to_string(),
                });
            }
            s.request_headers.append(name, value);
            Ok(())
        })
    }

    /// Sends the request.
    ///
    /// Normalizes the `Content-Type` charset to utf-8 (defaulting to
    /// `text/plain`), drops the body for GET and HEAD, fires
    /// `readystatechange` for OPENED and `loadstart` on the request and the
    /// pending upload, then runs the send hook.
    ///
    /// # Errors
    ///
    /// - [`XhrError::InvalidState`] unless the request is OPENED and not sent.
    /// - [`XhrError::SendHook`] when the send hook fails.
    pub fn send(&self, body: Option<&str>) -> XhrResult<()> {
        let upload_pending = self.with_state(|s| {
            if s.ready_state != ReadyState::Opened || s.send_flag {
                return Err(XhrError::invalid_state(
                    "send",
                    "request must be opened and not yet sent",
                    s.ready_state,
                ));
            }

            let content_type = s
                .request_headers
                .get_entry("Content-Type")
                .map(|(name, value)| (name.to_string(), value.to_string()));
            match content_type {
                Some((name, value)) => {
                    let mime = value.split(';').next().unwrap_or_default().trim();
                    s.request_headers
                        .insert(name, format!("{mime}; charset=utf-8"));
                }
                None => s
                    .request_headers
                    .insert("Content-Type", DEFAULT_CONTENT_TYPE),
            }

            s.request_body = match s.method.as_str() {
                "GET" | "HEAD" => None,
                _ => body.map(String::from),
            };
            if s.request_body.is_none() {
                s.upload_complete = true;
            }
            s.error_flag = false;
            if s.asynchronous {
                s.send_flag = true;
            }
            s.upload_events = self.inner.upload.registry().has_any();
            Ok(!s.upload_complete)
        })?;

        debug!(
            xhr = self.inner.id,
            method = %self.method(),
            url = %self.url(),
            "request sent"
        );
        self.set_ready_state(ReadyState::Opened);
        self.fire(EventKind::LoadStart);
        if upload_pending {
            self.fire_upload(EventKind::LoadStart);
        }

        let hook = self.inner.send_hook.borrow().clone();
        if let Some(hook) = hook {
            hook(self).map_err(XhrError::SendHook)?;
        }
        Ok(())
    }

    /// Stores the response headers and moves to HEADERS_RECEIVED.
    ///
    /// Fires `readystatechange` for asynchronous requests only.
    ///
    /// # Errors
    ///
    /// [`XhrError::InvalidState`] unless the request is OPENED.
    pub fn set_response_headers(&self, headers: impl Into<Headers>) -> XhrResult<()> {
        let headers = headers.into();
        let asynchronous = self.with_state(|s| {
            if s.ready_state != ReadyState::Opened {
                return Err(XhrError::invalid_state(
                    "setResponseHeaders",
                    "request must be opened",
                    s.ready_state,
                ));
            }
            s.response_headers = headers;
            Ok(s.asynchronous)
        })?;
        self.advance(ReadyState::HeadersReceived, asynchronous);
        Ok(())
    }

    /// Delivers the response body and completes the request.
    ///
    /// The body reaches `responseText` according to the
    /// [`DeliveryPolicy`]. Afterwards `responseXML` is parsed for XML-like
    /// content types and `response` is derived from the text; the request
    /// then moves to DONE and fires `progress`, `load` and `loadend`, on the
    /// upload channel too if it was still pending.
    ///
    /// # Errors
    ///
    /// [`XhrError::InvalidState`] unless headers were received and no body
    /// was delivered yet in this cycle.
    pub fn set_response_body(&self, body: &str) -> XhrResult<()> {
        let (asynchronous, delivery) = self.with_state(|s| {
            if s.ready_state != ReadyState::HeadersReceived {
                return Err(XhrError::invalid_state(
                    "setResponseBody",
                    "headers must be received and the body not yet delivered",
                    s.ready_state,
                ));
            }
            s.response_text = Some(String::new());
            Ok((s.asynchronous, s.delivery))
        })?;

        let step = match delivery {
            DeliveryPolicy::WholeBody => None,
            DeliveryPolicy::Chunked(size) => Some(size.max(1)),
        };
        let mut rest = body;
        loop {
            self.advance(ReadyState::Loading, asynchronous);
            if self.ready_state() != ReadyState::Loading {
                debug!(xhr = self.inner.id, "body delivery interrupted");
                return Ok(());
            }
            let split = step
                .and_then(|step| rest.char_indices().nth(step))
                .map_or(rest.len(), |(index, _)| index);
            let (chunk, tail) = rest.split_at(split);
            self.with_state(|s| {
                s.response_text.get_or_insert_with(String::new).push_str(chunk);
            });
            rest = tail;
            if rest.is_empty() {
                break;
            }
        }

        self.with_state(|s| {
            let text = s.response_text.clone().unwrap_or_default();
            s.response_xml = match s.effective_mime() {
                Some(mime) if !text.is_empty() => Document::parse_for_mime(&text, &mime),
                _ => None,
            };
            s.response = match s.response_type {
                ResponseType::Json => serde_json::from_str(&text)
                    .map_or(ResponseValue::Null, ResponseValue::Json),
                _ => ResponseValue::Text(text),
            };
            s.send_flag = false;
        });

        self.advance(ReadyState::Done, asynchronous);
        let upload_pending = self.with_state(XhrState::finish_upload);
        self.fire_end_sequence(EventKind::Load, upload_pending);
        Ok(())
    }

    /// Completes the upload, then responds with `status`, `headers` and `body`.
    ///
    /// `statusText` comes from the standard reason phrase table and is
    /// `None` for unknown codes.
    ///
    /// # Errors
    ///
    /// [`XhrError::InvalidState`] unless the request is OPENED.
    pub fn respond(&self, status: u16, headers: impl Into<Headers>, body: &str) -> XhrResult<()> {
        let upload_pending = self.with_state(|s| {
            if s.ready_state != ReadyState::Opened {
                return Err(XhrError::invalid_state(
                    "respond",
                    "request must be opened",
                    s.ready_state,
                ));
            }
            Ok(s.finish_upload())
        })?;
        if upload_pending {
            for event in [EventKind::Progress, EventKind::Load, EventKind::LoadEnd] {
                self.fire_upload(event);
            }
        }

        self.with_state(|s| {
            s.status = status;
            s.status_text = reason_phrase(status).map(String::from);
        });
        debug!(xhr = self.inner.id, status, "responding");
        self.set_response_headers(headers)?;
        self.set_response_body(body)
    }

    /// Aborts the request.
    ///
    /// Clears the response and, when a send is in flight, moves through DONE
    /// firing `readystatechange`, then `progress`, `abort` and `loadend`.
    /// The request always ends UNSENT and can be opened again.
    ///
    /// # Errors
    ///
    /// [`XhrError::Aborted`] for a synchronous request that is still OPENED.
    /// The request is left DONE in that case.
    pub fn abort(&self) -> XhrResult<()> {
        let in_flight = self.with_state(|s| {
            s.aborted = true;
            s.error_flag = true;
            s.clear_response();
            if !s.asynchronous && s.ready_state == ReadyState::Opened {
                s.ready_state = ReadyState::Done;
                s.send_flag = false;
                return Err(XhrError::Aborted);
            }
            Ok(s.send_flag && !matches!(s.ready_state, ReadyState::Unsent | ReadyState::Done))
        })?;

        debug!(xhr = self.inner.id, in_flight, "request aborted");
        if in_flight {
            self.set_ready_state(ReadyState::Done);
            let upload_pending = self.with_state(XhrState::finish_upload);
            self.fire_end_sequence(EventKind::Abort, upload_pending);
        }

        self.with_state(|s| {
            s.send_flag = false;
            s.ready_state = ReadyState::Unsent;
        });
        Ok(())
    }

    /// Simulates a network error.
    ///
    /// Clears the response and, unless the request is UNSENT or DONE, moves
    /// to DONE and fires `progress`, `error` and `loadend`.
    pub fn error(&self) {
        self.request_error(EventKind::Error);
    }

    /// Simulates the request timing out. Same steps as [`error`](Self::error)
    /// with a `timeout` event.
    pub fn trigger_timeout(&self) {
        self.request_error(EventKind::Timeout);
    }

    fn request_error(&self, kind: EventKind) {
        let in_flight = self.with_state(|s| {
            s.error_flag = true;
            s.send_flag = false;
            s.clear_response();
            !matches!(s.ready_state, ReadyState::Unsent | ReadyState::Done)
        });
        debug!(xhr = self.inner.id, event = kind.as_str(), in_flight, "request failed");
        if in_flight {
            self.set_ready_state(ReadyState::Done);
            let upload_pending = self.with_state(XhrState::finish_upload);
            self.fire_end_sequence(kind, upload_pending);
        }
    }

    /// Returns a response header, ignoring case.
    ///
    /// `None` before headers are received, after an error, or for
    /// `Set-Cookie`/`Set-Cookie2`.
    #[must_use]
    pub fn get_response_header(&self, name: &str) -> Option<String> {
        let s = self.state();
        if s.ready_state < ReadyState::HeadersReceived
            || s.error_flag
            || is_hidden_response_header(name)
        {
            return None;
        }
        s.response_headers.get(name).map(String::from)
    }

    /// Returns every exposed response header as `Name: value\r\n` lines.
    #[must_use]
    pub fn get_all_response_headers(&self) -> String {
        let s = self.state();
        if s.ready_state < ReadyState::HeadersReceived || s.error_flag {
            return String::new();
        }
        s.response_headers
            .iter()
            .filter(|(name, _)| !is_hidden_response_header(name))
            .map(|(name, value)| format!("{name}: {value}\r\n"))
            .collect()
    }

    /// Overrides the response MIME type used for `responseXML`.
    ///
    /// # Errors
    ///
    /// [`XhrError::InvalidState`] while LOADING or DONE.
    pub fn override_mime_type(&self, mime: &str) -> XhrResult<()> {
        self.with_state(|s| {
            if matches!(s.ready_state, ReadyState::Loading | ReadyState::Done) {
                return Err(XhrError::invalid_state(
                    "overrideMimeType",
                    "response is already loading",
                    s.ready_state,
                ));
            }
            s.mime_override = Some(mime.to_string());
            Ok(())
        })
    }

    /// Sets `responseType`.
    ///
    /// # Errors
    ///
    /// - [`XhrError::InvalidState`] while LOADING or DONE.
    /// - [`XhrError::InvalidAccess`] on a synchronous request.
    pub fn set_response_type(&self, response_type: ResponseType) -> XhrResult<()> {
        self.with_state(|s| {
            if matches!(s.ready_state, ReadyState::Loading | ReadyState::Done) {
                return Err(XhrError::invalid_state(
                    "responseType",
                    "response is already loading",
                    s.ready_state,
                ));
            }
            if !s.asynchronous {
                return Err(XhrError::invalid_access(
                    "responseType cannot be set on a synchronous request",
                ));
            }
            s.response_type = response_type;
            Ok(())
        })
    }

    /// Sets `responseType` without the state and mode checks.
    ///
    /// For responders that pick the type while answering, including
    /// synchronous requests.
    pub fn force_response_type(&self, response_type: ResponseType) {
        self.with_state(|s| s.response_type = response_type);
    }

    /// Returns `responseType`.
    #[must_use]
    pub fn response_type(&self) -> ResponseType {
        self.state().response_type
    }

    /// Sets `timeout` in milliseconds. Bookkeeping only; nothing is scheduled.
    ///
    /// # Errors
    ///
    /// [`XhrError::InvalidAccess`] on a synchronous request.
    pub fn set_timeout(&self, millis: u32) -> XhrResult<()> {
        self.with_state(|s| {
            if !s.asynchronous {
                return Err(XhrError::invalid_access(
                    "timeout cannot be set on a synchronous request",
                ));
            }
            s.timeout = millis;
            Ok(())
        })
    }

    /// Returns `timeout` in milliseconds, always 0 for synchronous requests.
    #[must_use]
    pub fn timeout(&self) -> u32 {
        let s = self.state();
        if s.asynchronous {
            s.timeout
        } else {
            0
        }
    }

    /// Sets how response bodies are delivered.
    pub fn set_delivery_policy(&self, policy: DeliveryPolicy) {
        self.with_state(|s| s.delivery = policy);
    }

    /// Returns the delivery policy.
    #[must_use]
    pub fn delivery_policy(&self) -> DeliveryPolicy {
        self.state().delivery
    }

    /// Installs the hook run at the end of every successful `send`.
    pub fn set_send_hook<F>(&self, hook: F)
    where
        F: Fn(&FakeXhr) -> anyhow::Result<()> + 'static,
    {
        *self.inner.send_hook.borrow_mut() = Some(Rc::new(hook));
    }

    /// Removes the send hook.
    pub fn clear_send_hook(&self) {
        self.inner.send_hook.borrow_mut().take();
    }

    /// Returns true if a send hook is installed.
    #[must_use]
    pub fn has_send_hook(&self) -> bool {
        self.inner.send_hook.borrow().is_some()
    }

    /// Returns the upload progress channel.
    #[must_use]
    pub fn upload(&self) -> &XhrEventTarget {
        &self.inner.upload
    }

    /// Returns `readyState`.
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        self.state().ready_state
    }

    /// Returns the method given to `open`, after normalization.
    #[must_use]
    pub fn method(&self) -> String {
        self.state().method.clone()
    }

    /// Returns the URL given to `open`.
    #[must_use]
    pub fn url(&self) -> String {
        self.state().url.clone()
    }

    /// Returns the user given to `open`.
    #[must_use]
    pub fn user(&self) -> Option<String> {
        self.state().user.clone()
    }

    /// Returns the password given to `open`.
    #[must_use]
    pub fn password(&self) -> Option<String> {
        self.state().password.clone()
    }

    /// Returns true for asynchronous requests.
    #[must_use]
    pub fn is_async(&self) -> bool {
        self.state().asynchronous
    }

    /// Returns a copy of the request headers.
    #[must_use]
    pub fn request_headers(&self) -> Headers {
        self.state().request_headers.clone()
    }

    /// Returns a request header, ignoring case.
    #[must_use]
    pub fn request_header(&self, name: &str) -> Option<String> {
        self.state().request_headers.get(name).map(String::from)
    }

    /// Returns the body stored by `send`.
    #[must_use]
    pub fn request_body(&self) -> Option<String> {
        self.state().request_body.clone()
    }

    /// Returns a copy of the response headers, hidden ones included.
    #[must_use]
    pub fn response_headers(&self) -> Headers {
        self.state().response_headers.clone()
    }

    /// Returns `status`.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.state().status
    }

    /// Returns `statusText`; `None` for codes without a reason phrase.
    #[must_use]
    pub fn status_text(&self) -> Option<String> {
        self.state().status_text.clone()
    }

    /// Returns `responseText`; `None` right after `open`.
    #[must_use]
    pub fn response_text(&self) -> Option<String> {
        self.state().response_text.clone()
    }

    /// Returns `responseXML`.
    #[must_use]
    pub fn response_xml(&self) -> Option<Document> {
        self.state().response_xml.clone()
    }

    /// Returns `response`.
    #[must_use]
    pub fn response(&self) -> ResponseValue {
        self.state().response.clone()
    }

    /// Returns true once `abort` was called in this cycle.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.state().aborted
    }

    /// Returns the error flag.
    #[must_use]
    pub fn error_flag(&self) -> bool {
        self.state().error_flag
    }

    /// Returns the send flag.
    #[must_use]
    pub fn send_flag(&self) -> bool {
        self.state().send_flag
    }

    /// Returns true once the upload phase is over.
    #[must_use]
    pub fn upload_complete(&self) -> bool {
        self.state().upload_complete
    }

    /// Returns true if upload listeners were registered when `send` ran.
    #[must_use]
    pub fn upload_events(&self) -> bool {
        self.state().upload_events
    }

    /// Returns the MIME override.
    #[must_use]
    pub fn mime_override(&self) -> Option<String> {
        self.state().mime_override.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::event::Listener;

    fn record_states(xhr: &FakeXhr) -> Rc<RefCell<Vec<ReadyState>>> {
        let states = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&states);
        xhr.set_handler(
            EventKind::ReadyStateChange,
            Some(Listener::new(move |xhr: &FakeXhr, _: &Event| {
                sink.borrow_mut().push(xhr.ready_state());
            })),
        );
        states
    }

    fn sent(method: &str) -> FakeXhr {
        let xhr = FakeXhr::new();
        xhr.open(method, "/").unwrap();
        xhr.send(None).unwrap();
        xhr
    }

    #[test]
    fn test_ready_state_values() {
        assert_eq!(ReadyState::Unsent.value(), 0);
        assert_eq!(ReadyState::Done.value(), 4);
        assert_eq!(ReadyState::from_value(2), Some(ReadyState::HeadersReceived));
        assert_eq!(ReadyState::from_value(5), None);
        assert!(ReadyState::Opened < ReadyState::Loading);
        assert_eq!(ReadyState::HeadersReceived.to_string(), "HEADERS_RECEIVED");
    }

    #[test]
    fn test_open_sets_properties() {
        let xhr = FakeXhr::new();
        xhr.open_with(
            "get",
            "/foo",
            OpenOptions::new().user("kevin").password("secret"),
        )
        .unwrap();

        assert_eq!(xhr.method(), "GET");
        assert_eq!(xhr.url(), "/foo");
        assert_eq!(xhr.user().as_deref(), Some("kevin"));
        assert_eq!(xhr.password().as_deref(), Some("secret"));
        assert!(xhr.is_async());
        assert_eq!(xhr.response_text(), None);
        assert!(xhr.request_headers().is_empty());
        assert!(!xhr.send_flag());
        assert_eq!(xhr.ready_state(), ReadyState::Opened);
    }

    #[test]
    fn test_open_keeps_unknown_method_verbatim() {
        let xhr = FakeXhr::new();
        xhr.open("patch", "/").unwrap();
        assert_eq!(xhr.method(), "patch");
    }

    #[test]
    fn test_open_rejects_forbidden_methods() {
        let xhr = FakeXhr::new();
        for method in ["CONNECT", "trace", "Track"] {
            let err = xhr.open(method, "/").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Security);
        }
        assert_eq!(xhr.ready_state(), ReadyState::Unsent);
    }

    #[test]
    fn test_open_fires_readystatechange() {
        let xhr = FakeXhr::new();
        let states = record_states(&xhr);
        xhr.open("GET", "/").unwrap();
        assert_eq!(*states.borrow(), vec![ReadyState::Opened]);
    }

    #[test]
    fn test_set_request_header_guards() {
        let xhr = FakeXhr::new();
        let err = xhr.set_request_header("X-Fake", "yes").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        xhr.open("GET", "/").unwrap();
        let err = xhr.set_request_header("Cookie", "a=b").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Security);
        assert!(xhr.request_headers().is_empty());

        xhr.send(None).unwrap();
        let err = xhr.set_request_header("X-Fake", "yes").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_send_bodies_and_content_type() {
        let get = FakeXhr::new();
        get.open("GET", "/").unwrap();
        get.send(Some("ignored")).unwrap();
        assert_eq!(get.request_body(), None);
        assert!(get.upload_complete());
        assert_eq!(
            get.request_header("content-type").as_deref(),
            Some("text/plain; charset=utf-8")
        );

        let post = FakeXhr::new();
        post.open("POST", "/").unwrap();
        post.set_request_header("Content-Type", "application/json").unwrap();
        post.send(Some("{}")).unwrap();
        assert_eq!(post.request_body().as_deref(), Some("{}"));
        assert!(!post.upload_complete());
        assert_eq!(
            post.request_header("Content-Type").as_deref(),
            Some("application/json; charset=utf-8")
        );
    }

    #[test]
    fn test_send_flag_only_for_async() {
        assert!(sent("GET").send_flag());

        let xhr = FakeXhr::new();
        xhr.open_with("GET", "/", OpenOptions::new().synchronous()).unwrap();
        xhr.send(None).unwrap();
        assert!(!xhr.send_flag());
    }

    #[test]
    fn test_send_twice_fails() {
        let xhr = sent("GET");
        assert_eq!(xhr.send(None).unwrap_err().kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_send_hook_receives_request() {
        let xhr = FakeXhr::new();
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        xhr.set_send_hook(move |xhr| {
            *sink.borrow_mut() = Some(xhr.url());
            Ok(())
        });
        xhr.open("GET", "/hooked").unwrap();
        xhr.send(None).unwrap();
        assert_eq!(seen.borrow().as_deref(), Some("/hooked"));
    }

    #[test]
    fn test_send_hook_error_propagates() {
        let xhr = FakeXhr::new();
        xhr.set_send_hook(|_| Err(anyhow::anyhow!("no route")));
        xhr.open("GET", "/").unwrap();
        let err = xhr.send(None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SendHook);
    }

    #[test]
    fn test_sync_request_answered_inside_hook() {
        let xhr = FakeXhr::new();
        xhr.set_send_hook(|xhr| {
            xhr.set_response_headers(Headers::new())?;
            xhr.set_response_body("Oh Yeah")?;
            Ok(())
        });
        xhr.open_with("GET", "/", OpenOptions::new().synchronous()).unwrap();
        xhr.send(None).unwrap();
        assert_eq!(xhr.response_text().as_deref(), Some("Oh Yeah"));
        assert_eq!(xhr.ready_state(), ReadyState::Done);
    }

    #[test]
    fn test_set_response_headers_async_fires() {
        let xhr = sent("GET");
        let states = record_states(&xhr);
        xhr.set_response_headers([("X-Test", "1")]).unwrap();
        assert_eq!(*states.borrow(), vec![ReadyState::HeadersReceived]);
    }

    #[test]
    fn test_sync_transitions_are_silent() {
        let xhr = FakeXhr::new();
        xhr.open_with("GET", "/", OpenOptions::new().synchronous()).unwrap();
        xhr.send(None).unwrap();
        let states = record_states(&xhr);

        xhr.set_response_headers(Headers::new()).unwrap();
        assert_eq!(xhr.ready_state(), ReadyState::HeadersReceived);
        xhr.set_response_body("hello world super body").unwrap();

        assert_eq!(xhr.ready_state(), ReadyState::Done);
        assert!(states.borrow().is_empty());
    }

    #[test]
    fn test_whole_body_fires_loading_once() {
        let xhr = sent("GET");
        xhr.set_response_headers(Headers::new()).unwrap();
        let states = record_states(&xhr);
        xhr.set_response_body("Some text goes in here ok?").unwrap();
        assert_eq!(*states.borrow(), vec![ReadyState::Loading, ReadyState::Done]);
    }

    #[test]
    fn test_chunked_delivery_counts() {
        for (size, expected) in [(10, 4), (20, 3)] {
            let xhr = sent("GET");
            xhr.set_delivery_policy(DeliveryPolicy::Chunked(size));
            xhr.set_response_headers(Headers::new()).unwrap();
            let states = record_states(&xhr);
            xhr.set_response_body("Some text goes in here ok?").unwrap();
            assert_eq!(states.borrow().len(), expected, "chunk size {size}");
        }
    }

    #[test]
    fn test_chunked_delivery_partial_text() {
        let xhr = sent("GET");
        xhr.set_delivery_policy(DeliveryPolicy::Chunked(9));
        xhr.set_response_headers(Headers::new()).unwrap();
        let pieces = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&pieces);
        xhr.add_event_listener(
            "readystatechange",
            Listener::new(move |xhr: &FakeXhr, _: &Event| {
                sink.borrow_mut().push(xhr.response_text().unwrap_or_default());
            }),
        );

        xhr.set_response_body("Some text goes in here ok?").unwrap();

        let pieces = pieces.borrow();
        assert_eq!(pieces[0], "");
        assert_eq!(pieces[1], "Some text");
        assert_eq!(xhr.response_text().as_deref(), Some("Some text goes in here ok?"));
    }

    #[test]
    fn test_set_response_body_guards() {
        let unsent = FakeXhr::new();
        assert_eq!(
            unsent.set_response_body("").unwrap_err().kind(),
            ErrorKind::InvalidState
        );

        let xhr = sent("GET");
        assert_eq!(
            xhr.set_response_body("").unwrap_err().kind(),
            ErrorKind::InvalidState
        );

        xhr.set_response_headers(Headers::new()).unwrap();
        xhr.set_response_body("").unwrap();
        assert_eq!(
            xhr.set_response_body("").unwrap_err().kind(),
            ErrorKind::InvalidState
        );
    }

    #[test]
    fn test_respond_defaults_and_status_text() {
        let xhr = sent("GET");
        xhr.respond(200, Headers::new(), "").unwrap();
        assert_eq!(xhr.status(), 200);
        assert_eq!(xhr.status_text().as_deref(), Some("OK"));
        assert_eq!(xhr.get_all_response_headers(), "");
        assert_eq!(xhr.response_text().as_deref(), Some(""));

        let created = sent("POST");
        created.respond(201, Headers::new(), "").unwrap();
        assert_eq!(created.status_text().as_deref(), Some("Created"));

        let unknown = sent("GET");
        unknown.respond(299, Headers::new(), "").unwrap();
        assert_eq!(unknown.status_text(), None);
    }

    #[test]
    fn test_respond_untabled_status_has_no_text() {
        for status in [418, 429, 507, 511] {
            let xhr = sent("GET");
            xhr.respond(status, Headers::new(), "").unwrap();
            assert_eq!(xhr.status(), status);
            assert_eq!(xhr.status_text(), None, "status {status}");
        }
    }

    #[test]
    fn test_respond_fires_done_once() {
        let xhr = sent("GET");
        let states = record_states(&xhr);
        xhr.respond(200, Headers::new(), "").unwrap();
        let done = states
            .borrow()
            .iter()
            .filter(|state| **state == ReadyState::Done)
            .count();
        assert_eq!(done, 1);
    }

    #[test]
    fn test_respond_completes_when_listener_fails() {
        let xhr = sent("GET");
        xhr.set_delivery_policy(DeliveryPolicy::Chunked(10));
        let calls = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&calls);
        xhr.set_handler(
            EventKind::ReadyStateChange,
            Some(Listener::try_new(move |_: &FakeXhr, _: &Event| {
                *sink.borrow_mut() += 1;
                Err(anyhow::anyhow!("listener failure"))
            })),
        );

        xhr.respond(200, Headers::new(), "\"tis some body text").unwrap();

        assert_eq!(*calls.borrow(), 4);
        assert_eq!(xhr.ready_state(), ReadyState::Done);
        assert_eq!(xhr.response_text().as_deref(), Some("\"tis some body text"));
    }

    #[test]
    fn test_response_headers_hidden_until_received() {
        let xhr = FakeXhr::new();
        xhr.open("GET", "/").unwrap();
        assert_eq!(xhr.get_response_header("Content-Type"), None);
        xhr.send(None).unwrap();
        assert_eq!(xhr.get_response_header("Content-Type"), None);
        assert_eq!(xhr.get_all_response_headers(), "");
    }

    #[test]
    fn test_response_header_lookup() {
        let xhr = sent("GET");
        xhr.respond(
            200,
            [
                ("Content-Type", "text/plain"),
                ("Set-Cookie", "a=b"),
                ("X-Count", "3"),
            ],
            "",
        )
        .unwrap();

        assert_eq!(xhr.get_response_header("content-type").as_deref(), Some("text/plain"));
        assert_eq!(xhr.get_response_header("Set-Cookie"), None);
        assert_eq!(xhr.get_response_header("X-Missing"), None);
        assert_eq!(
            xhr.get_all_response_headers(),
            "Content-Type: text/plain\r\nX-Count: 3\r\n"
        );
    }

    #[test]
    fn test_sync_response_header_lookup() {
        let xhr = FakeXhr::new();
        xhr.open_with("GET", "/", OpenOptions::new().synchronous()).unwrap();
        xhr.send(None).unwrap();
        xhr.respond(200, [("X-Sync", "yes")], "").unwrap();
        assert_eq!(xhr.get_response_header("x-sync").as_deref(), Some("yes"));
    }

    #[test]
    fn test_response_xml_for_xml_types() {
        let xhr = sent("GET");
        xhr.respond(200, [("Content-Type", "text/xml")], "<root><a/></root>")
            .unwrap();
        let doc = xhr.response_xml().unwrap();
        assert_eq!(doc.document_element_name().as_deref(), Some("root"));

        let plain = sent("GET");
        plain.respond(200, [("Content-Type", "text/plain")], "<root/>").unwrap();
        assert!(plain.response_xml().is_none());

        let empty = sent("GET");
        empty.respond(200, [("Content-Type", "text/xml")], "").unwrap();
        assert!(empty.response_xml().is_none());
    }

    #[test]
    fn test_mime_override_drives_parsing() {
        let xhr = FakeXhr::new();
        xhr.open("GET", "/").unwrap();
        xhr.override_mime_type("application/xml").unwrap();
        xhr.send(None).unwrap();
        xhr.respond(200, [("Content-Type", "text/plain")], "<doc/>").unwrap();
        assert!(xhr.response_xml().is_some());
        assert_eq!(
            xhr.override_mime_type("text/plain").unwrap_err().kind(),
            ErrorKind::InvalidState
        );
    }

    #[test]
    fn test_json_response() {
        let xhr = FakeXhr::new();
        xhr.open("GET", "/").unwrap();
        xhr.set_response_type(ResponseType::Json).unwrap();
        xhr.send(None).unwrap();
        xhr.respond(200, Headers::new(), r#"{"hello":"salut"}"#).unwrap();
        assert_eq!(
            xhr.response(),
            ResponseValue::Json(serde_json::json!({"hello": "salut"}))
        );

        let broken = FakeXhr::new();
        broken.open("GET", "/").unwrap();
        broken.set_response_type(ResponseType::Json).unwrap();
        broken.send(None).unwrap();
        broken.respond(200, Headers::new(), "{not json").unwrap();
        assert!(broken.response().is_null());
    }

    #[test]
    fn test_text_response_mirrors_response_text() {
        let xhr = sent("GET");
        xhr.respond(200, Headers::new(), "plain").unwrap();
        assert_eq!(xhr.response().as_text(), Some("plain"));
        assert_eq!(xhr.response_type().as_str(), "");
    }

    #[test]
    fn test_response_type_guards() {
        let sync = FakeXhr::new();
        sync.open_with("GET", "/", OpenOptions::new().synchronous()).unwrap();
        assert_eq!(
            sync.set_response_type(ResponseType::Json).unwrap_err().kind(),
            ErrorKind::InvalidAccess
        );

        let done = sent("GET");
        done.respond(200, Headers::new(), "").unwrap();
        assert_eq!(
            done.set_response_type(ResponseType::Text).unwrap_err().kind(),
            ErrorKind::InvalidState
        );
    }

    #[test]
    fn test_timeout_rules() {
        let xhr = FakeXhr::new();
        xhr.set_timeout(500).unwrap();
        assert_eq!(xhr.timeout(), 500);
        let err = xhr
            .open_with("GET", "/", OpenOptions::new().synchronous())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAccess);

        let sync = FakeXhr::new();
        sync.open_with("GET", "/", OpenOptions::new().synchronous()).unwrap();
        assert_eq!(sync.set_timeout(10).unwrap_err().kind(), ErrorKind::InvalidAccess);
        assert_eq!(sync.timeout(), 0);
    }

    #[test]
    fn test_abort_in_flight_sequence() {
        let xhr = sent("GET");
        let events = Rc::new(RefCell::new(Vec::new()));
        for kind in [
            EventKind::ReadyStateChange,
            EventKind::Progress,
            EventKind::Abort,
            EventKind::LoadEnd,
        ] {
            let sink = Rc::clone(&events);
            xhr.add_event_listener(
                kind.as_str(),
                Listener::new(move |xhr: &FakeXhr, e: &Event| {
                    sink.borrow_mut()
                        .push(format!("{}:{}", e.event_type(), xhr.ready_state()));
                }),
            );
        }

        xhr.abort().unwrap();

        assert_eq!(
            *events.borrow(),
            vec![
                "readystatechange:DONE",
                "progress:DONE",
                "abort:DONE",
                "loadend:DONE"
            ]
        );
        assert_eq!(xhr.ready_state(), ReadyState::Unsent);
        assert!(xhr.is_aborted());
        assert!(xhr.error_flag());
        assert!(!xhr.send_flag());
        assert_eq!(xhr.status(), 0);
        assert_eq!(xhr.response_text().as_deref(), Some(""));
    }

    #[test]
    fn test_abort_when_idle_is_silent() {
        let xhr = FakeXhr::new();
        let states = record_states(&xhr);
        xhr.abort().unwrap();
        assert!(states.borrow().is_empty());
        assert_eq!(xhr.ready_state(), ReadyState::Unsent);
    }

    #[test]
    fn test_abort_json_clears_text_to_none() {
        let xhr = FakeXhr::new();
        xhr.open("GET", "/").unwrap();
        xhr.set_response_type(ResponseType::Json).unwrap();
        xhr.abort().unwrap();
        assert_eq!(xhr.response_text(), None);
    }

    #[test]
    fn test_sync_abort_while_open() {
        let xhr = FakeXhr::new();
        xhr.open_with("GET", "/", OpenOptions::new().synchronous()).unwrap();
        xhr.send(None).unwrap();
        let err = xhr.abort().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Abort);
        assert_eq!(xhr.ready_state(), ReadyState::Done);
    }

    #[test]
    fn test_reopen_after_abort() {
        let xhr = sent("GET");
        xhr.abort().unwrap();
        xhr.open("GET", "/again").unwrap();
        xhr.send(None).unwrap();
        xhr.respond(200, Headers::new(), "back").unwrap();
        assert!(!xhr.is_aborted());
        assert_eq!(xhr.response_text().as_deref(), Some("back"));
    }

    #[test]
    fn test_error_and_timeout_paths() {
        for (trigger, expected) in [
            (FakeXhr::error as fn(&FakeXhr), "error"),
            (FakeXhr::trigger_timeout as fn(&FakeXhr), "timeout"),
        ] {
            let xhr = sent("GET");
            let fired = Rc::new(RefCell::new(Vec::new()));
            for kind in [EventKind::Error, EventKind::Timeout, EventKind::LoadEnd] {
                let sink = Rc::clone(&fired);
                xhr.add_event_listener(
                    kind.as_str(),
                    Listener::new(move |_: &FakeXhr, e: &Event| {
                        sink.borrow_mut().push(e.event_type().to_string());
                    }),
                );
            }

            trigger(&xhr);

            assert_eq!(*fired.borrow(), vec![expected, "loadend"]);
            assert_eq!(xhr.ready_state(), ReadyState::Done);
            assert!(xhr.error_flag());
            assert_eq!(xhr.get_all_response_headers(), "");
        }
    }

    #[test]
    fn test_upload_events_on_respond() {
        let xhr = FakeXhr::new();
        let fired = Rc::new(RefCell::new(Vec::new()));
        for kind in [EventKind::LoadStart, EventKind::Load, EventKind::LoadEnd] {
            let sink = Rc::clone(&fired);
            xhr.upload().add_event_listener(
                kind.as_str(),
                Listener::new(move |_: &XhrEventTarget, e: &Event| {
                    sink.borrow_mut().push(e.event_type().to_string());
                }),
            );
        }
        xhr.open("POST", "/").unwrap();
        xhr.send(Some("payload")).unwrap();
        assert!(xhr.upload_events());
        xhr.respond(200, Headers::new(), "").unwrap();

        assert_eq!(*fired.borrow(), vec!["loadstart", "load", "loadend"]);
        assert!(xhr.upload_complete());
    }

    #[test]
    fn test_listener_may_reenter_request() {
        let xhr = sent("GET");
        xhr.add_event_listener(
            "load",
            Listener::new(|xhr: &FakeXhr, _: &Event| {
                let _ = xhr.get_all_response_headers();
                let _ = xhr.status();
            }),
        );
        xhr.respond(200, [("A", "b")], "ok").unwrap();
        assert_eq!(xhr.status(), 200);
    }

    #[test]
    fn test_abort_during_loading_stops_delivery() {
        let xhr = sent("GET");
        xhr.set_response_headers(Headers::new()).unwrap();
        xhr.add_event_listener(
            "readystatechange",
            Listener::new(|xhr: &FakeXhr, _: &Event| {
                if xhr.ready_state() == ReadyState::Loading {
                    let _ = xhr.abort();
                }
            }),
        );
        xhr.set_response_body("never delivered").unwrap();
        assert_eq!(xhr.ready_state(), ReadyState::Unsent);
        assert_eq!(xhr.response_text().as_deref(), Some(""));
    }
}
