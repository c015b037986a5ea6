//! # Signal: subscriber list and dispatch loop.
//!
//! ## Dispatch pass
//! ```text
//! fire(args) / fire_unsafe(args)
//!   │
//!   ├─► lock, begin_walk, cursor = head.next, unlock
//!   │
//!   loop {
//!   │   ├─► lock: next_visit(cursor)          (captures next, unlinks `once`)
//!   │   ├─► unlock
//!   │   └─► invoke(entry, args.clone()):
//!   │         ├─ noyield            → poll once inline; suspend = SuspendedInline
//!   │         ├─ yield, safe        → FiberPool::submit     (isolated)
//!   │         └─ yield, unsafe      → poll once inline; suspended rest → FiberPool::submit
//!   │                                  failure → return Err, rest of pass skipped
//!   }
//!   └─► lock, end_walk (frees retired slots), unlock
//! ```
//!
//! ## Rules
//! - Subscribers are visited in subscribe order.
//! - The list lock is never held while a handler runs, so handlers may call
//!   back into the signal (`fire`, `connect`, `disconnect`, `clear`).
//! - A subscriber connected during a pass is visited by that pass unless the
//!   walk has already stepped past the old tail.
//! - A subscriber disconnected during a pass, before the walk reaches it, is skipped.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::config::{ConnectOptions, SignalConfig};
use crate::error::{CallbackError, SignalError};
use crate::events::{Event, EventKind};
use crate::fiber::{FiberPool, Job, JobFuture, Resumed, resume_inline};
use crate::handlers::{BoundHandler, HandlerFn, HandlerRef};
use crate::scheduler::Scheduler;
use crate::signal::builder::SignalBuilder;
use crate::signal::connection::{Connection, Flags, Unlink};
use crate::signal::list::{Entry, List, Slot};

/// How yield-capable subscribers are resumed during a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Each subscriber's own `safe` flag decides.
    Respect,
    /// Every yield-capable subscriber is resumed inline.
    ForceUnsafe,
}

pub(crate) struct Shared<T: Send + 'static> {
    pub(crate) name: Arc<str>,
    default_safe: bool,
    list: Mutex<List<T>>,
    pub(crate) pool: Arc<FiberPool>,
    pub(crate) scheduler: Arc<dyn Scheduler>,
}

impl<T: Send + 'static> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, List<T>> {
        self.list.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Send + 'static> Unlink for Shared<T> {
    fn unlink(&self, slot: Slot) {
        let freed = self.lock().unlink(slot);
        drop(freed);
    }
}

/// Publisher holding an ordered list of subscribers.
///
/// `T` is the value passed to every subscriber; use a tuple for several
/// arguments. Cloning a `Signal` yields another handle to the same list.
///
/// # Example
/// ```
/// use std::sync::{Arc, Mutex};
/// use fibersignal::{CallbackError, ConnectOptions, Signal};
///
/// # fn main() -> Result<(), fibersignal::SignalError> {
/// let clicked: Signal<(i32, i32)> = Signal::new("clicked");
/// let seen = Arc::new(Mutex::new(Vec::new()));
///
/// let sink = Arc::clone(&seen);
/// let conn = clicked.connect_with(
///     move |(x, y)| {
///         sink.lock().unwrap().push(x + y);
///         async { Ok::<(), CallbackError>(()) }
///     },
///     ConnectOptions::new().no_yield(),
/// );
///
/// clicked.fire((1, 2))?;
/// conn.disconnect();
/// clicked.fire((3, 4))?;
/// assert_eq!(*seen.lock().unwrap(), vec![3]);
/// # Ok(())
/// # }
/// ```
pub struct Signal<T: Send + 'static> {
    pub(crate) inner: Arc<Shared<T>>,
}

impl<T: Send + 'static> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.inner.name)
            .field("default_safe", &self.inner.default_safe)
            .field("len", &self.inner.lock().len())
            .finish()
    }
}

impl<T: Clone + Send + 'static> Signal<T> {
    /// Creates a signal with default settings and the process-wide fiber pool.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        SignalBuilder::new(SignalConfig::default()).name(name).build()
    }

    /// Starts a builder from the given configuration.
    pub fn builder(cfg: SignalConfig) -> SignalBuilder<T> {
        SignalBuilder::new(cfg)
    }

    pub(crate) fn from_parts(
        cfg: SignalConfig,
        pool: Arc<FiberPool>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            inner: Arc::new(Shared {
                name: cfg.name,
                default_safe: cfg.default_safe,
                list: Mutex::new(List::new()),
                pool,
                scheduler,
            }),
        }
    }

    /// Diagnostic label.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Number of reachable subscribers.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// True if no subscriber is reachable.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The fiber pool this signal dispatches yield-capable subscribers on.
    pub fn pool(&self) -> &Arc<FiberPool> {
        &self.inner.pool
    }

    // ---- Subscription ----

    /// Subscribes `f` with default flags: persistent, yield-capable, and
    /// isolated according to the signal's `default_safe`.
    pub fn connect<F, Fut>(&self, f: F) -> Connection
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
    {
        self.attach(HandlerFn::arc(f), ConnectOptions::new())
    }

    /// Like [`connect`](Self::connect); `f` also receives a clone of `bound`
    /// after the fire-time value.
    pub fn connect_bound<B, F, Fut>(&self, f: F, bound: B) -> Connection
    where
        B: Clone + Send + Sync + 'static,
        F: Fn(T, B) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
    {
        self.attach(BoundHandler::arc(f, bound), ConnectOptions::new())
    }

    /// Subscribes `f` for the next dispatch only.
    pub fn once<F, Fut>(&self, f: F) -> Connection
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
    {
        self.attach(HandlerFn::arc(f), ConnectOptions::new().once())
    }

    /// [`once`](Self::once) with bound arguments.
    pub fn once_bound<B, F, Fut>(&self, f: F, bound: B) -> Connection
    where
        B: Clone + Send + Sync + 'static,
        F: Fn(T, B) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
    {
        self.attach(BoundHandler::arc(f, bound), ConnectOptions::new().once())
    }

    /// Subscribes `f` with explicit [`ConnectOptions`].
    pub fn connect_with<F, Fut>(&self, f: F, opts: ConnectOptions) -> Connection
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
    {
        self.attach(HandlerFn::arc(f), opts)
    }

    /// [`connect_with`](Self::connect_with) with bound arguments.
    pub fn connect_with_bound<B, F, Fut>(&self, f: F, opts: ConnectOptions, bound: B) -> Connection
    where
        B: Clone + Send + Sync + 'static,
        F: Fn(T, B) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
    {
        self.attach(BoundHandler::arc(f, bound), opts)
    }

    /// Subscribes an existing handler. Appends at the tail in O(1).
    pub fn attach(&self, handler: HandlerRef<T>, opts: ConnectOptions) -> Connection {
        let flags = Flags {
            once: opts.once,
            may_yield: !opts.no_yield,
            safe: self.inner.default_safe && !opts.unsafe_resume,
            bound: handler.has_bound_args(),
        };
        let state = self.inner.lock().push_back(handler, flags);
        let weak: Weak<Shared<T>> = Arc::downgrade(&self.inner);
        let owner: Weak<dyn Unlink> = weak;
        Connection::new(state, owner)
    }

    /// Detaches every subscriber.
    ///
    /// Outstanding [`Connection`]s are not revoked: they keep reporting
    /// `connected() == true`, and disconnecting them later is harmless.
    pub fn clear(&self) {
        let freed = self.inner.lock().clear();
        tracing::debug!(signal = %self.inner.name, detached = freed.len(), "signal cleared");
        drop(freed);
    }

    // ---- Firing ----

    /// Dispatches `args` to every connected subscriber, in subscribe order.
    ///
    /// Returns the first failure of a subscriber that runs coupled to this
    /// call (`noyield`, or yield-capable with unsafe resume); the remaining
    /// subscribers of the pass are then skipped.
    ///
    /// # Panics
    /// With the default [`TokioScheduler`](crate::TokioScheduler), panics when
    /// a subscriber needs a fiber and no tokio runtime is running.
    pub fn fire(&self, args: T) -> Result<(), SignalError> {
        self.dispatch(args, Mode::Respect)
    }

    /// Like [`fire`](Self::fire), but every yield-capable subscriber is resumed
    /// inline regardless of its own isolation flag.
    ///
    /// # Panics
    /// With the default [`TokioScheduler`](crate::TokioScheduler), panics when
    /// a subscriber suspends and no tokio runtime is running.
    pub fn fire_unsafe(&self, args: T) -> Result<(), SignalError> {
        self.dispatch(args, Mode::ForceUnsafe)
    }

    /// Schedules a [`fire`](Self::fire) pass on the next scheduler round.
    ///
    /// An error of that pass has no caller to go to; it is logged and
    /// published as [`EventKind::DeferredPassFailed`] on the pool's bus.
    ///
    /// # Panics
    /// With the default [`TokioScheduler`](crate::TokioScheduler), panics when
    /// called outside a tokio runtime.
    pub fn defer(&self, args: T) {
        let signal = self.clone();
        self.inner.scheduler.defer(Box::new(move || {
            if let Err(err) = signal.fire(args) {
                tracing::warn!(
                    signal = %signal.inner.name,
                    error = %err,
                    "deferred dispatch pass failed"
                );
                signal.inner.pool.report(
                    Event::new(EventKind::DeferredPassFailed)
                        .with_signal(Arc::clone(&signal.inner.name))
                        .with_reason(err.to_string()),
                );
            }
        }));
    }

    fn dispatch(&self, args: T, mode: Mode) -> Result<(), SignalError> {
        let walk = Walk::begin(&self.inner);
        let mut cursor = walk.start;
        loop {
            let visit = self.inner.lock().next_visit(&mut cursor);
            let Some(entry) = visit else { break };
            self.invoke(entry, args.clone(), mode)?;
        }
        Ok(())
    }

    fn invoke(&self, entry: Entry<T>, args: T, mode: Mode) -> Result<(), SignalError> {
        let Entry { handler, state } = entry;
        let flags = state.flags();
        let job: JobFuture = Box::pin(async move { handler.call(args).await });

        if !flags.may_yield {
            return match resume_inline(job) {
                Resumed::Done(res) => res.map_err(|err| self.coupled_failure(err)),
                Resumed::Suspended(_) => Err(SignalError::SuspendedInline {
                    signal: Arc::clone(&self.inner.name),
                }),
            };
        }

        if flags.safe && mode == Mode::Respect {
            self.inner
                .pool
                .submit(Job::new(Arc::clone(&self.inner.name), job));
            return Ok(());
        }

        match resume_inline(job) {
            Resumed::Done(res) => res.map_err(|err| self.coupled_failure(err)),
            Resumed::Suspended(rest) => {
                self.inner
                    .pool
                    .submit(Job::new(Arc::clone(&self.inner.name), rest));
                Ok(())
            }
        }
    }

    fn coupled_failure(&self, source: CallbackError) -> SignalError {
        SignalError::Callback {
            signal: Arc::clone(&self.inner.name),
            source,
        }
    }
}

/// Registration of one dispatch pass; ends the walk even when a handler panics.
struct Walk<'a, T: Send + 'static> {
    shared: &'a Shared<T>,
    start: usize,
}

impl<'a, T: Send + 'static> Walk<'a, T> {
    fn begin(shared: &'a Shared<T>) -> Self {
        let start = shared.lock().begin_walk();
        Self { shared, start }
    }
}

impl<T: Send + 'static> Drop for Walk<'_, T> {
    fn drop(&mut self) {
        let freed = self.shared.lock().end_walk();
        drop(freed);
    }
}
