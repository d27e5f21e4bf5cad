//! Transfer lifecycle event target.

use crate::event::{EventKind, EventSource, ListenerRegistry};

/// Event target with the transfer lifecycle handler slots pre-declared.
///
/// `onabort`, `onerror`, `onload`, `onloadend`, `onloadstart`, `onprogress`
/// and `ontimeout` exist from construction and start out empty, so
/// consumers can assign them without checking first. Used for the upload
/// channel of a [`FakeXhr`](crate::FakeXhr).
#[derive(Debug)]
pub struct XhrEventTarget {
    registry: ListenerRegistry<XhrEventTarget>,
}

impl XhrEventTarget {
    /// Creates a target with empty transfer handler slots.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: ListenerRegistry::with_handler_slots(&EventKind::TRANSFER),
        }
    }
}

impl Default for XhrEventTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for XhrEventTarget {
    fn registry(&self) -> &ListenerRegistry<Self> {
        &self.registry
    }
}
