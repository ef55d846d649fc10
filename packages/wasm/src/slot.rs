//! Shared ownership of the session between JS callbacks

use std::cell::{Cell, RefCell};
use tracing::warn;

/// Outcome of a close request
#[derive(Debug)]
pub(crate) enum Close<T> {
    /// The slot was free; here is what it held (nothing if already closed)
    Ready(Option<T>),
    /// A callback holds the value; it is handed over when that callback ends
    Deferred,
}

/// Holds the value until closed. Callbacks that fire while another one is
/// still running (or after close) are dropped.
pub(crate) struct Slot<T> {
    value: RefCell<Option<T>>,
    close_requested: Cell<bool>,
}

impl<T> Slot<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            value: RefCell::new(Some(value)),
            close_requested: Cell::new(false),
        }
    }

    /// Run `f` against the value. Returns the value taken out of the slot
    /// when a close was requested while `f` ran; the caller finishes it.
    pub(crate) fn with(&self, f: impl FnOnce(&mut T)) -> Option<T> {
        match self.value.try_borrow_mut() {
            Ok(mut slot) => match slot.as_mut() {
                Some(value) => f(value),
                None => warn!("Callback after close ignored"),
            },
            Err(_) => {
                warn!("Re-entrant callback ignored");
                return None;
            }
        }

        if self.close_requested.replace(false) {
            self.value.borrow_mut().take()
        } else {
            None
        }
    }

    /// Take the value out now, or mark it for hand-over at the end of the
    /// running callback
    pub(crate) fn request_close(&self) -> Close<T> {
        match self.value.try_borrow_mut() {
            Ok(mut slot) => Close::Ready(slot.take()),
            Err(_) => {
                self.close_requested.set(true);
                Close::Deferred
            }
        }
    }

    /// Borrow the value outside any callback
    pub(crate) fn get_mut(&self) -> Option<std::cell::RefMut<'_, T>> {
        let slot = self.value.try_borrow_mut().ok()?;
        std::cell::RefMut::filter_map(slot, Option::as_mut).ok()
    }
}
