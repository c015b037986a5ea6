//! # Host scheduler boundary.
//!
//! Signals never start execution contexts themselves; they go through a
//! [`Scheduler`]. The default [`TokioScheduler`] maps every capability onto the
//! ambient tokio runtime.
//!
//! | Capability         | Method                  | Tokio mapping                           |
//! |--------------------|-------------------------|-----------------------------------------|
//! | spawn now          | [`Scheduler::spawn`]    | `tokio::spawn`                          |
//! | defer to next tick | [`Scheduler::defer`]    | `tokio::spawn` of the closure           |
//! | delay              | [`Scheduler::delay`]    | `tokio::time::sleep` raced with a token |
//! | cancel             | [`DelayHandle::cancel`] | `CancellationToken::cancel`             |
//!
//! Inline resumption is not a scheduler capability: the fiber module polls a
//! job once on the caller's own stack (see `fiber::resume`).

use std::time::Duration;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

/// A unit of deferred or delayed work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Execution primitives a signal needs from its host.
///
/// Implementations must not run the submitted work inline: every method
/// returns before the work starts.
pub trait Scheduler: Send + Sync + 'static {
    /// Starts `fut` immediately, independent of the caller.
    fn spawn(&self, fut: BoxFuture<'static, ()>);

    /// Runs `job` on a later scheduling round.
    fn defer(&self, job: Job);

    /// Runs `job` after `after` unless the returned handle is cancelled first.
    fn delay(&self, after: Duration, job: Job) -> DelayHandle;
}

/// Cancellable handle to a job scheduled with [`Scheduler::delay`].
///
/// Cancelling after the job already ran is a no-op.
#[derive(Clone, Debug, Default)]
pub struct DelayHandle {
    token: CancellationToken,
}

impl DelayHandle {
    /// Creates a fresh, uncancelled handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Aborts the pending job.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// True once [`cancel`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Token observed by the scheduler implementation.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// [`Scheduler`] backed by the current tokio runtime.
///
/// Every method calls `tokio::spawn` and therefore panics when used outside a
/// runtime context.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn spawn(&self, fut: BoxFuture<'static, ()>) {
        tokio::spawn(fut);
    }

    fn defer(&self, job: Job) {
        tokio::spawn(async move { job() });
    }

    fn delay(&self, after: Duration, job: Job) -> DelayHandle {
        let handle = DelayHandle::new();
        let token = handle.token.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(after) => {
                    if !token.is_cancelled() {
                        job();
                    }
                }
            }
        });
        handle
    }
}
