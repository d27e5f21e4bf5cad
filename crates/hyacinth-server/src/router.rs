//! Expectation routing.
//!
//! [`look_up`] walks the expectations in registration order with an explicit
//! cursor. The first match runs; if its handler calls [`Next::proceed`], the
//! walk resumes after it once the handler returns. Handlers along one walk
//! share the same [`Request`] and [`Response`], so headers buffered by an
//! earlier handler reach the final reply. A walk that runs out of
//! expectations without a reply answers 404.

use crate::expectation::Expectation;
use crate::request::Request;
use crate::response::Response;
use hyacinth_core::FakeXhr;
use std::rc::Rc;
use tracing::{debug, debug_span, warn};

/// Continuation handed to handlers.
#[derive(Debug, Default)]
pub struct Next {
    proceed: bool,
}

impl Next {
    /// Creates a continuation that has not been invoked.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Passes the request on to the next matching expectation.
    pub fn proceed(&mut self) {
        self.proceed = true;
    }

    /// Returns true if [`proceed`](Self::proceed) was called.
    #[must_use]
    pub fn proceeded(&self) -> bool {
        self.proceed
    }
}

/// Result of routing one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The expectation at this index handled the request last.
    Handled {
        /// Position in registration order.
        index: usize,
    },
    /// No expectation answered; a 404 was sent.
    NotFound,
}

/// Returns the body of the 404 reply for an unmatched request.
#[must_use]
pub fn not_found_body(method: &str, url: &str) -> String {
    format!("no Expectation setted for: ({method}, \"{url}\")")
}

/// Routes `xhr` through `expectations`.
///
/// # Errors
///
/// Returns the first handler error, or the error of the 404 reply.
pub fn look_up(
    expectations: &[Rc<Expectation>],
    xhr: &FakeXhr,
    log_unmatched: bool,
) -> anyhow::Result<Outcome> {
    let method = xhr.method();
    let url = xhr.url();
    let span = debug_span!("look_up", xhr = xhr.id(), method = %method, url = %url);
    let _enter = span.enter();

    let request = Request::new(xhr);
    let mut response = Response::new(xhr);
    let mut cursor = 0;
    let mut last = None;

    while let Some(offset) = expectations[cursor..]
        .iter()
        .position(|expectation| expectation.matches(&method, &url))
    {
        let index = cursor + offset;
        debug!(index, "expectation matched");
        last = Some(index);

        let mut next = Next::new();
        expectations[index].handle(&request, &mut response, &mut next)?;
        if !next.proceeded() {
            return Ok(Outcome::Handled { index });
        }
        cursor = index + 1;
    }

    if response.is_sent() {
        if let Some(index) = last {
            return Ok(Outcome::Handled { index });
        }
    }

    if log_unmatched {
        warn!(%method, %url, "no expectation matched");
    } else {
        debug!("no expectation matched");
    }
    response.set_header("Content-Type", "text/plain");
    response.send((404, not_found_body(&method, &url)))?;
    Ok(Outcome::NotFound)
}
