//! Expectations: method + URL rules bound to a handler.

use crate::error::{ServerError, ServerResult};
use crate::request::Request;
use crate::response::Response;
use crate::router::Next;
use regex::Regex;
use std::fmt;
use std::rc::Rc;

/// A route handler.
///
/// Handlers answer through the [`Response`], or call [`Next::proceed`] to
/// hand the request to the following matching expectation.
pub type Handler = Rc<dyn Fn(&Request, &mut Response, &mut Next) -> anyhow::Result<()>>;

/// How an expectation matches request URLs.
#[derive(Debug, Clone)]
pub enum UrlMatcher {
    /// The URL must equal this string.
    Exact(String),
    /// The URL must contain a match of this pattern.
    Pattern(Regex),
}

impl UrlMatcher {
    /// Compiles a regular expression matcher.
    pub fn pattern(pattern: &str) -> ServerResult<Self> {
        Ok(Self::Pattern(Regex::new(pattern)?))
    }

    /// Returns true for an empty exact URL.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Exact(url) if url.is_empty())
    }

    /// Returns true if `url` matches.
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == url,
            Self::Pattern(pattern) => pattern.is_match(url),
        }
    }
}

impl fmt::Display for UrlMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(url) => write!(f, "{url:?}"),
            Self::Pattern(pattern) => write!(f, "/{}/", pattern.as_str()),
        }
    }
}

impl From<&str> for UrlMatcher {
    fn from(url: &str) -> Self {
        Self::Exact(url.to_string())
    }
}

impl From<String> for UrlMatcher {
    fn from(url: String) -> Self {
        Self::Exact(url)
    }
}

impl From<Regex> for UrlMatcher {
    fn from(pattern: Regex) -> Self {
        Self::Pattern(pattern)
    }
}

/// A rule answering requests whose method and URL match.
///
/// Immutable once built.
pub struct Expectation {
    method: String,
    url: UrlMatcher,
    handler: Handler,
}

impl Expectation {
    /// Creates an expectation without checking its arguments.
    ///
    /// An empty method or URL is kept as given and only ever matches an
    /// empty one. Use [`builder`](Self::builder) to reject them.
    pub fn new<F>(method: impl Into<String>, url: impl Into<UrlMatcher>, handler: F) -> Self
    where
        F: Fn(&Request, &mut Response, &mut Next) -> anyhow::Result<()> + 'static,
    {
        Self {
            method: method.into(),
            url: url.into(),
            handler: Rc::new(handler),
        }
    }

    /// Starts building an expectation whose arguments are checked at build time.
    #[must_use]
    pub fn builder() -> ExpectationBuilder {
        ExpectationBuilder::default()
    }

    /// Returns the expected method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the URL matcher.
    #[must_use]
    pub fn url(&self) -> &UrlMatcher {
        &self.url
    }

    /// Returns true for an exact method match and a matching URL.
    #[must_use]
    pub fn matches(&self, method: &str, url: &str) -> bool {
        self.method == method && self.url.matches(url)
    }

    /// Runs the handler.
    pub fn handle(
        &self,
        request: &Request,
        response: &mut Response,
        next: &mut Next,
    ) -> anyhow::Result<()> {
        (self.handler)(request, response, next)
    }
}

impl fmt::Debug for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expectation")
            .field("method", &self.method)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Expectation`].
#[derive(Default)]
pub struct ExpectationBuilder {
    method: Option<String>,
    url: Option<UrlMatcher>,
    handler: Option<Handler>,
}

impl ExpectationBuilder {
    /// Sets the method.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Sets the URL matcher.
    pub fn url(mut self, url: impl Into<UrlMatcher>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the handler. Defaults to one that does nothing.
    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Request, &mut Response, &mut Next) -> anyhow::Result<()> + 'static,
    {
        self.handler = Some(Rc::new(handler));
        self
    }

    /// Builds the expectation.
    ///
    /// # Errors
    ///
    /// [`ServerError::MissingArgument`] when the method or URL is missing
    /// or empty.
    pub fn build(self) -> ServerResult<Expectation> {
        let method = self
            .method
            .filter(|method| !method.is_empty())
            .ok_or_else(|| ServerError::missing("method"))?;
        let url = self
            .url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ServerError::missing("url"))?;
        let handler: Handler = match self.handler {
            Some(handler) => handler,
            None => Rc::new(ignore),
        };
        Ok(Expectation {
            method,
            url,
            handler,
        })
    }
}

impl fmt::Debug for ExpectationBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpectationBuilder")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

fn ignore(_: &Request, _: &mut Response, _: &mut Next) -> anyhow::Result<()> {
    Ok(())
}
