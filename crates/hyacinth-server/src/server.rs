//! The expectation server.

use crate::error::ServerResult;
use crate::expectation::{Expectation, UrlMatcher};
use crate::request::Request;
use crate::response::Response;
use crate::router::{look_up, Next, Outcome};
use hyacinth_config::HyacinthConfig;
use hyacinth_core::ambient::{self, Constructor};
use hyacinth_core::{DeliveryPolicy, FakeXhr};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, info};

/// Server behaviour settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServerOptions {
    /// Delivery policy applied to every request created while launched.
    pub delivery: DeliveryPolicy,
    /// Log unmatched requests at `warn` instead of `debug`.
    pub log_unmatched: bool,
}

impl ServerOptions {
    /// Derives options from a loaded configuration.
    #[must_use]
    pub fn from_config(config: &HyacinthConfig) -> Self {
        Self {
            delivery: config.xhr.delivery_policy(),
            log_unmatched: config.server.log_unmatched,
        }
    }
}

#[derive(Default)]
struct ServerShared {
    options: ServerOptions,
    expectations: RefCell<Vec<Rc<Expectation>>>,
    requests: RefCell<Vec<FakeXhr>>,
}

impl ServerShared {
    fn route(&self, xhr: &FakeXhr) -> anyhow::Result<Outcome> {
        let snapshot = self.expectations.borrow().clone();
        look_up(&snapshot, xhr, self.options.log_unmatched)
    }

    fn clear(&self) {
        self.expectations.borrow_mut().clear();
        self.requests.borrow_mut().clear();
    }
}

/// Answers requests created through the ambient constructor with scripted
/// expectations.
///
/// # Example
///
/// ```rust
/// use hyacinth_core::ambient;
/// use hyacinth_server::Server;
///
/// let server = Server::new();
/// server.get("/", |_req, res, _next| {
///     res.send("hello world")?;
///     Ok(())
/// });
/// let guard = server.launch();
///
/// let xhr = ambient::create_request();
/// xhr.open("GET", "/").unwrap();
/// xhr.send(None).unwrap();
/// assert_eq!(xhr.status(), 200);
/// assert_eq!(xhr.response_text().as_deref(), Some("hello world"));
///
/// server.shutdown(guard);
/// ```
pub struct Server {
    shared: Rc<ServerShared>,
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

impl Server {
    /// Creates a server with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(ServerOptions::default())
    }

    /// Creates a server with `options`.
    #[must_use]
    pub fn with_options(options: ServerOptions) -> Self {
        Self {
            shared: Rc::new(ServerShared {
                options,
                ..ServerShared::default()
            }),
        }
    }

    /// Creates a server configured from `config`.
    #[must_use]
    pub fn from_config(config: &HyacinthConfig) -> Self {
        Self::with_options(ServerOptions::from_config(config))
    }

    /// Returns the options the server was created with.
    #[must_use]
    pub fn server_options(&self) -> ServerOptions {
        self.shared.options
    }

    /// Installs the fake constructor.
    ///
    /// Every request created through [`ambient::create_request`] until the
    /// guard is released is recorded and routed through this server on
    /// `send`. Launching a second server before shutting down the first is
    /// a caller error.
    pub fn launch(&self) -> LaunchGuard {
        let weak = Rc::downgrade(&self.shared);
        let constructor: Constructor = Rc::new(move || create_routed(&weak));
        let previous = ambient::install(constructor);
        info!(
            expectations = self.expectation_count(),
            "server launched"
        );
        LaunchGuard {
            previous: Some(previous),
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Restores the previous constructor and clears expectations and
    /// recorded requests.
    pub fn shutdown(&self, guard: LaunchGuard) {
        guard.release();
    }

    /// Registers an expectation.
    pub fn add(&self, expectation: Expectation) -> &Self {
        debug!(
            method = expectation.method(),
            url = %expectation.url(),
            "expectation registered"
        );
        self.shared
            .expectations
            .borrow_mut()
            .push(Rc::new(expectation));
        self
    }

    /// Registers an expectation for `method`.
    pub fn expect<F>(&self, method: &str, url: impl Into<UrlMatcher>, handler: F) -> &Self
    where
        F: Fn(&Request, &mut Response, &mut Next) -> anyhow::Result<()> + 'static,
    {
        self.add(Expectation::new(method, url, handler))
    }

    /// Registers an expectation for `method`, rejecting an empty method or URL.
    ///
    /// # Errors
    ///
    /// [`MissingArgument`](crate::ServerError::MissingArgument) for an empty argument.
    pub fn try_expect<F>(
        &self,
        method: &str,
        url: impl Into<UrlMatcher>,
        handler: F,
    ) -> ServerResult<&Self>
    where
        F: Fn(&Request, &mut Response, &mut Next) -> anyhow::Result<()> + 'static,
    {
        let expectation = Expectation::builder()
            .method(method)
            .url(url)
            .handler(handler)
            .build()?;
        Ok(self.add(expectation))
    }

    /// Registers a GET expectation.
    pub fn get<F>(&self, url: impl Into<UrlMatcher>, handler: F) -> &Self
    where
        F: Fn(&Request, &mut Response, &mut Next) -> anyhow::Result<()> + 'static,
    {
        self.expect("GET", url, handler)
    }

    /// Registers a POST expectation.
    pub fn post<F>(&self, url: impl Into<UrlMatcher>, handler: F) -> &Self
    where
        F: Fn(&Request, &mut Response, &mut Next) -> anyhow::Result<()> + 'static,
    {
        self.expect("POST", url, handler)
    }

    /// Registers a PUT expectation.
    pub fn put<F>(&self, url: impl Into<UrlMatcher>, handler: F) -> &Self
    where
        F: Fn(&Request, &mut Response, &mut Next) -> anyhow::Result<()> + 'static,
    {
        self.expect("PUT", url, handler)
    }

    /// Registers a DELETE expectation.
    pub fn delete<F>(&self, url: impl Into<UrlMatcher>, handler: F) -> &Self
    where
        F: Fn(&Request, &mut Response, &mut Next) -> anyhow::Result<()> + 'static,
    {
        self.expect("DELETE", url, handler)
    }

    /// Registers a HEAD expectation.
    pub fn head<F>(&self, url: impl Into<UrlMatcher>, handler: F) -> &Self
    where
        F: Fn(&Request, &mut Response, &mut Next) -> anyhow::Result<()> + 'static,
    {
        self.expect("HEAD", url, handler)
    }

    /// Registers an OPTIONS expectation.
    pub fn options<F>(&self, url: impl Into<UrlMatcher>, handler: F) -> &Self
    where
        F: Fn(&Request, &mut Response, &mut Next) -> anyhow::Result<()> + 'static,
    {
        self.expect("OPTIONS", url, handler)
    }

    /// Registers a PATCH expectation.
    pub fn patch<F>(&self, url: impl Into<UrlMatcher>, handler: F) -> &Self
    where
        F: Fn(&Request, &mut Response, &mut Next) -> anyhow::Result<()> + 'static,
    {
        self.expect("PATCH", url, handler)
    }

    /// Returns the number of registered expectations.
    #[must_use]
    pub fn expectation_count(&self) -> usize {
        self.shared.expectations.borrow().len()
    }

    /// Returns the requests created while launched, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<FakeXhr> {
        self.shared.requests.borrow().clone()
    }

    /// Routes `xhr` through the expectations directly.
    ///
    /// For requests that were not created through the ambient constructor.
    pub fn respond_to(&self, xhr: &FakeXhr) -> anyhow::Result<Outcome> {
        self.shared.route(xhr)
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("options", &self.shared.options)
            .field("expectations", &self.shared.expectations.borrow())
            .field("requests", &self.shared.requests.borrow().len())
            .finish()
    }
}

/// Builds a request that routes through the server behind `weak` on send.
fn create_routed(weak: &Weak<ServerShared>) -> FakeXhr {
    let xhr = FakeXhr::new();
    let Some(shared) = weak.upgrade() else {
        return xhr;
    };
    xhr.set_delivery_policy(shared.options.delivery);
    let hook_target = Weak::clone(weak);
    xhr.set_send_hook(move |xhr| match hook_target.upgrade() {
        Some(shared) => shared.route(xhr).map(|_| ()),
        None => Ok(()),
    });
    shared.requests.borrow_mut().push(xhr.clone());
    debug!(xhr = xhr.id(), "request created");
    xhr
}

/// Holds the ambient constructor slot for a launched [`Server`].
///
/// Releasing the guard, through [`Server::shutdown`] or by dropping it, puts
/// back exactly the constructor that was installed before the launch.
#[must_use = "dropping the guard shuts the server down immediately"]
pub struct LaunchGuard {
    previous: Option<Option<Constructor>>,
    shared: Weak<ServerShared>,
}

impl LaunchGuard {
    /// Shuts the server down.
    pub fn release(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        let Some(previous) = self.previous.take() else {
            return;
        };
        ambient::restore(previous);
        if let Some(shared) = self.shared.upgrade() {
            shared.clear();
        }
        info!("server shut down");
    }
}

impl Drop for LaunchGuard {
    fn drop(&mut self) {
        self.restore();
    }
}

impl fmt::Debug for LaunchGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchGuard")
            .field("active", &self.previous.is_some())
            .finish()
    }
}
