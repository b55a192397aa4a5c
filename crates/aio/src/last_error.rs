//! Per-thread "last error" slot.
//!
//! Every failed open and every rejected submission records its message here in
//! addition to returning it. The slot is thread-local, so concurrent callers
//! never observe each other's failures.

use std::cell::RefCell;
use std::fmt::Display;

thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Records `error` as the calling thread's last error.
pub(crate) fn record(error: &impl Display) {
    let message = error.to_string();
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(message));
}

/// Returns the calling thread's last error message, leaving it in place.
#[must_use]
pub fn last_error() -> Option<String> {
    LAST_ERROR.with(|slot| slot.borrow().clone())
}

/// Returns and clears the calling thread's last error message.
pub fn take_last_error() -> Option<String> {
    LAST_ERROR.with(|slot| slot.borrow_mut().take())
}

/// Clears the calling thread's last error message.
pub fn clear_last_error() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}
