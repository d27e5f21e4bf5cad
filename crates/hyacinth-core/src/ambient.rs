//! The ambient request constructor.
//!
//! Code under test obtains requests through [`create_request`] instead of
//! constructing them directly, the way browser code calls
//! `new XMLHttpRequest()`. A server swaps the constructor while it is
//! launched and puts the previous one back on shutdown.
//!
//! The slot is thread-local: requests are single-threaded, and tests running
//! on separate threads do not see each other's installs.

use crate::fake_xhr::FakeXhr;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// A request constructor.
pub type Constructor = Rc<dyn Fn() -> FakeXhr>;

thread_local! {
    static CONSTRUCTOR: RefCell<Option<Constructor>> = const { RefCell::new(None) };
}

/// Installs `constructor`, returning the one it replaces.
pub fn install(constructor: Constructor) -> Option<Constructor> {
    debug!("installing ambient request constructor");
    CONSTRUCTOR.with(|slot| slot.borrow_mut().replace(constructor))
}

/// Puts back a constructor returned by [`install`].
///
/// `None` restores the default, a plain [`FakeXhr::new`].
pub fn restore(previous: Option<Constructor>) {
    debug!(default = previous.is_none(), "restoring ambient request constructor");
    CONSTRUCTOR.with(|slot| *slot.borrow_mut() = previous);
}

/// Returns the installed constructor, if any.
#[must_use]
pub fn current() -> Option<Constructor> {
    CONSTRUCTOR.with(|slot| slot.borrow().clone())
}

/// Returns true if a constructor is installed.
#[must_use]
pub fn is_installed() -> bool {
    CONSTRUCTOR.with(|slot| slot.borrow().is_some())
}

/// Creates a request through the installed constructor.
#[must_use]
pub fn create_request() -> FakeXhr {
    match current() {
        Some(constructor) => constructor(),
        None => FakeXhr::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_default_constructor() {
        assert!(!is_installed());
        let xhr = create_request();
        assert!(!xhr.has_send_hook());
    }

    #[test]
    fn test_install_and_restore_exact() {
        let created = Rc::new(Cell::new(0));
        let counter = Rc::clone(&created);
        let first: Constructor = Rc::new(move || {
            counter.set(counter.get() + 1);
            FakeXhr::new()
        });

        let before = install(Rc::clone(&first));
        assert!(before.is_none());
        let _ = create_request();
        assert_eq!(created.get(), 1);

        let second: Constructor = Rc::new(FakeXhr::new);
        let replaced = install(second);
        assert!(replaced.as_ref().is_some_and(|c| Rc::ptr_eq(c, &first)));

        restore(replaced);
        assert!(current().is_some_and(|c| Rc::ptr_eq(&c, &first)));

        restore(before);
        assert!(!is_installed());
    }

    #[test]
    fn test_constructor_may_read_slot() {
        let nested: Constructor = Rc::new(|| {
            assert!(is_installed());
            FakeXhr::new()
        });
        let previous = install(nested);
        let _ = create_request();
        restore(previous);
    }
}
