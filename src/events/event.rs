//! # Events emitted by the fiber pool and deferred dispatch passes.
//!
//! The [`EventKind`] enum classifies:
//! - **Pool events**: a new fiber was started
//! - **Failure events**: an isolated subscriber failed or panicked, or a deferred
//!   pass returned an error that had no caller to receive it
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use fibersignal::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::CallbackFailed)
//!     .with_signal("clicked")
//!     .with_fiber(3)
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::CallbackFailed);
//! assert_eq!(ev.signal.as_deref(), Some("clicked"));
//! assert_eq!(ev.fiber, Some(3));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of dispatch events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// The pool started a new fiber because none was idle.
    ///
    /// Sets:
    /// - `fiber`: id of the new fiber
    FiberSpawned,

    /// A subscriber running on an isolated fiber returned an error.
    ///
    /// Sets:
    /// - `signal`: name of the firing signal
    /// - `fiber`: id of the fiber that ran it
    /// - `reason`: error message
    CallbackFailed,

    /// A subscriber running on an isolated fiber panicked.
    ///
    /// Sets:
    /// - `signal`: name of the firing signal
    /// - `fiber`: id of the fiber that ran it
    /// - `reason`: panic payload
    CallbackPanicked,

    /// A pass started by [`Signal::defer`](crate::Signal::defer) returned an error.
    ///
    /// Sets:
    /// - `signal`: name of the signal
    /// - `reason`: the [`SignalError`](crate::SignalError) message
    DeferredPassFailed,
}

/// Dispatch event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the signal involved, if any.
    pub signal: Option<Arc<str>>,
    /// Id of the fiber involved, if any.
    pub fiber: Option<u64>,
    /// Human-readable reason (errors, panic payloads).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            signal: None,
            fiber: None,
            reason: None,
        }
    }

    /// Attaches a signal name.
    #[inline]
    pub fn with_signal(mut self, signal: impl Into<Arc<str>>) -> Self {
        self.signal = Some(signal.into());
        self
    }

    /// Attaches a fiber id.
    #[inline]
    pub fn with_fiber(mut self, fiber: u64) -> Self {
        self.fiber = Some(fiber);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// True for events that report a failed subscriber or deferred pass.
    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(
            self.kind,
            EventKind::CallbackFailed | EventKind::CallbackPanicked | EventKind::DeferredPassFailed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::FiberSpawned);
        let b = Event::new(EventKind::FiberSpawned);
        assert!(b.seq > a.seq);
        assert!(!a.is_failure());
        assert!(Event::new(EventKind::DeferredPassFailed).is_failure());
    }
}
