//! Error types for the fake request.
//!
//! Every failure a misused [`FakeXhr`](crate::FakeXhr) reports is synchronous
//! and carries one of the DOM exception kinds a browser would raise for the
//! same call sequence. Tests match on [`ErrorKind`] rather than message text.

use crate::ReadyState;
use thiserror::Error;

/// Result type alias using [`XhrError`].
pub type XhrResult<T> = Result<T, XhrError>;

/// DOM exception kind carried by an [`XhrError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Operation attempted in a readyState that forbids it.
    InvalidState,
    /// Forbidden method or unsafe request header.
    Security,
    /// Operation not available on a synchronous request.
    InvalidAccess,
    /// A synchronous request was aborted while still open.
    Abort,
    /// The installed send hook failed.
    SendHook,
}

impl ErrorKind {
    /// Returns the DOM exception name for this kind.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::InvalidState => "InvalidStateError",
            Self::Security => "SecurityError",
            Self::InvalidAccess => "InvalidAccessError",
            Self::Abort => "AbortError",
            Self::SendHook => "SendHookError",
        }
    }
}

/// Errors raised by [`FakeXhr`](crate::FakeXhr) operations.
#[derive(Error, Debug)]
pub enum XhrError {
    /// The operation is not allowed in the current state.
    #[error("InvalidStateError: {operation} not allowed ({reason}, readyState {state})")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// Why the state forbids it.
        reason: &'static str,
        /// The readyState at the time of the call.
        state: ReadyState,
    },

    /// `open` was called with CONNECT, TRACE or TRACK.
    #[error("SecurityError: method {method} is forbidden")]
    ForbiddenMethod {
        /// The rejected method, as supplied.
        method: String,
    },

    /// `setRequestHeader` was called with a transport-controlled header.
    #[error("SecurityError: refused to set unsafe header \"{name}\"")]
    UnsafeHeader {
        /// The rejected header name, as supplied.
        name: String,
    },

    /// The operation is not available for synchronous requests.
    #[error("InvalidAccessError: {reason}")]
    InvalidAccess {
        /// Description of the rejected access.
        reason: &'static str,
    },

    /// A synchronous request was aborted while still open.
    #[error("AbortError: synchronous request aborted before completion")]
    Aborted,

    /// The send hook returned an error.
    #[error("send hook failed: {0}")]
    SendHook(#[source] anyhow::Error),
}

impl XhrError {
    /// Creates an invalid state error.
    #[must_use]
    pub fn invalid_state(operation: &'static str, reason: &'static str, state: ReadyState) -> Self {
        Self::InvalidState {
            operation,
            reason,
            state,
        }
    }

    /// Creates an invalid access error.
    #[must_use]
    pub fn invalid_access(reason: &'static str) -> Self {
        Self::InvalidAccess { reason }
    }

    /// Returns the DOM exception kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::ForbiddenMethod { .. } | Self::UnsafeHeader { .. } => ErrorKind::Security,
            Self::InvalidAccess { .. } => ErrorKind::InvalidAccess,
            Self::Aborted => ErrorKind::Abort,
            Self::SendHook(_) => ErrorKind::SendHook,
        }
    }
}
