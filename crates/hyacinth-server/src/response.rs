//! Response builder handed to handlers.

use crate::error::ServerResult;
use hyacinth_core::{FakeXhr, Headers, ResponseType};
use serde::Serialize;
use tracing::debug;

/// Status and body passed to [`Response::send`].
///
/// Converts from a status alone, a body alone (status 200), a
/// `(status, body)` pair, or `()` for an empty 200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Response status.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl Default for Reply {
    fn default() -> Self {
        Self {
            status: 200,
            body: String::new(),
        }
    }
}

impl From<()> for Reply {
    fn from((): ()) -> Self {
        Self::default()
    }
}

impl From<u16> for Reply {
    fn from(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }
}

impl From<&str> for Reply {
    fn from(body: &str) -> Self {
        Self {
            body: body.to_string(),
            ..Self::default()
        }
    }
}

impl From<String> for Reply {
    fn from(body: String) -> Self {
        Self {
            body,
            ..Self::default()
        }
    }
}

impl From<(u16, &str)> for Reply {
    fn from((status, body): (u16, &str)) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

impl From<(u16, String)> for Reply {
    fn from((status, body): (u16, String)) -> Self {
        Self { status, body }
    }
}

/// Buffers headers and answers the bound request.
#[derive(Debug)]
pub struct Response {
    xhr: FakeXhr,
    headers: Headers,
    sent: bool,
}

impl Response {
    /// Creates a response for `xhr`.
    #[must_use]
    pub fn new(xhr: &FakeXhr) -> Self {
        Self {
            xhr: xhr.clone(),
            headers: Headers::new(),
            sent: false,
        }
    }

    /// Buffers a header, replacing any value under the same name.
    pub fn set_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns a buffered header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Returns the buffered headers.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Responds with the buffered headers.
    ///
    /// ```rust,ignore
    /// res.send("hello")?;            // 200, "hello"
    /// res.send(404)?;                // 404, ""
    /// res.send((201, "created"))?;   // 201, "created"
    /// ```
    pub fn send(&mut self, reply: impl Into<Reply>) -> ServerResult<()> {
        let Reply { status, body } = reply.into();
        self.respond(status, &body)
    }

    /// Responds 200 with `data` serialized as JSON.
    ///
    /// Sets `Content-Type: application/json` and the request's
    /// `responseType` to `json`.
    pub fn json<T: Serialize + ?Sized>(&mut self, data: &T) -> ServerResult<()> {
        self.json_with_status(200, data)
    }

    /// Responds with `status` and `data` serialized as JSON.
    pub fn json_with_status<T: Serialize + ?Sized>(
        &mut self,
        status: u16,
        data: &T,
    ) -> ServerResult<()> {
        let body = serde_json::to_string(data)?;
        self.headers.insert("Content-Type", "application/json");
        self.xhr.force_response_type(ResponseType::Json);
        self.respond(status, &body)
    }

    fn respond(&mut self, status: u16, body: &str) -> ServerResult<()> {
        debug!(xhr = self.xhr.id(), status, "sending response");
        self.xhr.respond(status, self.headers.clone(), body)?;
        self.sent = true;
        Ok(())
    }

    /// Returns true once a response was sent.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Returns the bound request.
    #[must_use]
    pub fn xhr(&self) -> &FakeXhr {
        &self.xhr
    }
}
