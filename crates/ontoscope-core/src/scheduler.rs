//! Deferred-work primitives for the frame scheduler.
//!
//! The editor never recomputes eagerly. Mutations mark work as pending with a
//! [`Debouncer`]; the frame scheduler later calls [`Debouncer::take`] and runs
//! the work once, no matter how many times it was scheduled in between.

use std::{cell::Cell, rc::Rc};

/// Coalescing flag shared between the code that requests work and the code
/// that performs it.
///
/// # Examples
///
/// ```
/// use ontoscope_core::scheduler::Debouncer;
///
/// let debouncer = Debouncer::new();
/// for _ in 0..100 {
///     debouncer.schedule();
/// }
/// assert!(debouncer.take());
/// assert!(!debouncer.take());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Debouncer {
    scheduled: Rc<Cell<bool>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks work as pending.
    pub fn schedule(&self) {
        self.scheduled.set(true);
    }

    /// Clears the pending mark and returns whether work was pending.
    pub fn take(&self) -> bool {
        self.scheduled.replace(false)
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled.get()
    }
}

/// Cancellation flag for a running animation.
///
/// Clones share the flag; cancelling any clone cancels all of them.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debouncer_clones_share_state() {
        let debouncer = Debouncer::new();
        let requester = debouncer.clone();

        assert!(!debouncer.is_scheduled());
        requester.schedule();
        assert!(debouncer.is_scheduled());
        assert!(debouncer.take());
        assert!(!requester.is_scheduled());
    }

    #[test]
    fn test_cancellation_token() {
        let token = CancellationToken::new();
        let running = token.clone();

        assert!(!running.is_cancelled());
        token.cancel();
        assert!(running.is_cancelled());
        assert!(!CancellationToken::new().is_cancelled());
    }
}
