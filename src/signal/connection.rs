//! # Connection handles.
//!
//! A [`Connection`] is what a subscriber gets back from `connect`. It exposes
//! the subscription's flags and can [`disconnect`](Connection::disconnect) it.
//!
//! ## Rules
//! - `connected` goes from `true` to `false` exactly once.
//! - The handle refers to its signal weakly: it never keeps a signal alive,
//!   and disconnecting after the signal is gone only flips the flag.
//! - After [`Signal::clear`](crate::Signal::clear) the handle keeps reporting
//!   `connected() == true` although the subscriber is no longer reachable.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use crate::signal::list::Slot;

/// Dispatch flags fixed at subscribe time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Flags {
    pub(crate) once: bool,
    pub(crate) may_yield: bool,
    pub(crate) safe: bool,
    pub(crate) bound: bool,
}

/// State shared between a list node and its handles.
#[derive(Debug)]
pub(crate) struct ConnState {
    slot: Slot,
    flags: Flags,
    pub(crate) connected: AtomicBool,
}

impl ConnState {
    pub(crate) fn new(slot: Slot, flags: Flags) -> Self {
        Self {
            slot,
            flags,
            connected: AtomicBool::new(true),
        }
    }

    pub(crate) fn slot(&self) -> Slot {
        self.slot
    }

    pub(crate) fn flags(&self) -> Flags {
        self.flags
    }
}

/// Removes a node from its owner's list.
pub(crate) trait Unlink: Send + Sync {
    fn unlink(&self, slot: Slot);
}

/// Handle to one subscription.
#[derive(Clone)]
pub struct Connection {
    state: Arc<ConnState>,
    owner: Weak<dyn Unlink>,
}

impl Connection {
    pub(crate) fn new(state: Arc<ConnState>, owner: Weak<dyn Unlink>) -> Self {
        Self { state, owner }
    }

    /// Unlinks the subscriber from its signal. Calling it again is a no-op.
    ///
    /// A handler already running on a fiber is not interrupted.
    pub fn disconnect(&self) {
        if !self.state.connected.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(owner) = self.owner.upgrade() {
            owner.unlink(self.state.slot());
        }
    }

    /// False once [`disconnect`](Self::disconnect) ran or a `once` subscriber fired.
    pub fn connected(&self) -> bool {
        self.state.connected.load(Ordering::Acquire)
    }

    /// True if the subscription ends at its first dispatch.
    pub fn is_once(&self) -> bool {
        self.state.flags().once
    }

    /// True if the handler runs on a pooled fiber and may suspend.
    pub fn may_yield(&self) -> bool {
        self.state.flags().may_yield
    }

    /// True if the handler is dispatched in isolation from the firing call.
    pub fn is_safe(&self) -> bool {
        self.state.flags().safe
    }

    /// True if extra arguments were bound at subscribe time.
    pub fn has_bound_args(&self) -> bool {
        self.state.flags().bound
    }

    /// Wraps the handle so that dropping it disconnects.
    pub fn scoped(self) -> ScopedConnection {
        ScopedConnection {
            conn: self,
            armed: true,
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("connected", &self.connected())
            .field("flags", &self.state.flags())
            .finish()
    }
}

/// A [`Connection`] that disconnects when dropped.
#[derive(Debug)]
#[must_use = "dropping a ScopedConnection disconnects it immediately"]
pub struct ScopedConnection {
    conn: Connection,
    armed: bool,
}

impl ScopedConnection {
    /// The wrapped handle.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Gives up scoping and returns the plain handle.
    pub fn release(mut self) -> Connection {
        self.armed = false;
        self.conn.clone()
    }
}

impl Drop for ScopedConnection {
    fn drop(&mut self) {
        if self.armed {
            self.conn.disconnect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        unlinked: Mutex<Vec<Slot>>,
    }

    impl Unlink for Recorder {
        fn unlink(&self, slot: Slot) {
            self.unlinked.lock().unwrap().push(slot);
        }
    }

    fn connection(owner: &Arc<Recorder>) -> Connection {
        let slot = Slot {
            index: 1,
            generation: 0,
        };
        let flags = Flags {
            once: false,
            may_yield: true,
            safe: false,
            bound: true,
        };
        let weak: Weak<Recorder> = Arc::downgrade(owner);
        let owner: Weak<dyn Unlink> = weak;
        Connection::new(Arc::new(ConnState::new(slot, flags)), owner)
    }

    #[test]
    fn disconnect_is_idempotent() {
        let owner = Arc::new(Recorder::default());
        let conn = connection(&owner);
        assert!(conn.connected());
        assert!(conn.may_yield() && !conn.is_safe() && conn.has_bound_args() && !conn.is_once());

        conn.disconnect();
        conn.disconnect();
        assert!(!conn.connected());
        assert_eq!(owner.unlinked.lock().unwrap().len(), 1);
    }

    #[test]
    fn disconnect_after_owner_dropped_only_flips_flag() {
        let owner = Arc::new(Recorder::default());
        let conn = connection(&owner);
        drop(owner);

        conn.disconnect();
        assert!(!conn.connected());
    }

    #[test]
    fn scoped_connection_disconnects_on_drop() {
        let owner = Arc::new(Recorder::default());
        let scoped = connection(&owner).scoped();
        let handle = scoped.connection().clone();
        drop(scoped);
        assert!(!handle.connected());

        let kept = connection(&owner).scoped().release();
        assert!(kept.connected());
    }
}
