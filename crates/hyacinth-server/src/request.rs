//! Read-only view of an intercepted request, as seen by handlers.

use crate::error::ServerResult;
use crate::query::{parse_query, query_string, Query};
use hyacinth_core::{Document, FakeXhr, Headers};
use serde::de::DeserializeOwned;

/// An intercepted request.
///
/// The URL, method and query are captured when the view is built; the body
/// and headers are read from the bound [`FakeXhr`] on each call.
#[derive(Debug, Clone)]
pub struct Request {
    xhr: FakeXhr,
    method: String,
    url: String,
    query: Query,
}

impl Request {
    /// Creates a view of `xhr`.
    #[must_use]
    pub fn new(xhr: &FakeXhr) -> Self {
        let url = xhr.url();
        Self {
            xhr: xhr.clone(),
            method: xhr.method(),
            query: parse_query(&url),
            url,
        }
    }

    /// Returns the raw URL, query included.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the URL without its query string.
    #[must_use]
    pub fn path(&self) -> &str {
        self.url.split_once('?').map_or(self.url.as_str(), |(path, _)| path)
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the parsed query parameters.
    #[must_use]
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Returns a query parameter value.
    ///
    /// `None` both for absent keys and keys written without `=`.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).and_then(Option::as_deref)
    }

    /// Returns a query parameter value, percent-decoded.
    ///
    /// Values that do not decode to valid UTF-8 are returned as written.
    /// `+` is left as is.
    #[must_use]
    pub fn decoded_query_param(&self, name: &str) -> Option<String> {
        let raw = self.query_param(name)?;
        let decoded = urlencoding::decode(raw)
            .map_or_else(|_| raw.to_string(), |value| value.into_owned());
        Some(decoded)
    }

    /// Deserializes the query string into `T`.
    ///
    /// Unlike [`query`](Self::query), keys and values are form-decoded.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hyacinth_core::FakeXhr;
    /// use hyacinth_server::Request;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Page {
    ///     page: u32,
    /// }
    ///
    /// let xhr = FakeXhr::new();
    /// xhr.open("GET", "/items?page=3").unwrap();
    ///
    /// let page: Page = Request::new(&xhr).query_as().unwrap();
    /// assert_eq!(page.page, 3);
    /// ```
    pub fn query_as<T: DeserializeOwned>(&self) -> ServerResult<T> {
        let raw = query_string(&self.url).unwrap_or_default();
        Ok(serde_urlencoded::from_str(raw)?)
    }

    /// Returns the raw request body.
    #[must_use]
    pub fn body(&self) -> Option<String> {
        self.xhr.request_body()
    }

    /// Returns the body parsed as JSON, or `Null` when absent or invalid.
    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        self.body()
            .and_then(|body| serde_json::from_str(&body).ok())
            .unwrap_or(serde_json::Value::Null)
    }

    /// Deserializes the JSON body into `T`.
    pub fn json_as<T: DeserializeOwned>(&self) -> ServerResult<T> {
        let body = self.body().unwrap_or_default();
        Ok(serde_json::from_str(&body)?)
    }

    /// Returns the body parsed as an XML document.
    #[must_use]
    pub fn xml(&self) -> Option<Document> {
        self.body().map(|body| Document::parse_xml(&body))
    }

    /// Returns a request header, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        self.xhr.request_header(name)
    }

    /// Returns all request headers.
    #[must_use]
    pub fn headers(&self) -> Headers {
        self.xhr.request_headers()
    }

    /// Returns the bound request.
    #[must_use]
    pub fn xhr(&self) -> &FakeXhr {
        &self.xhr
    }
}
