use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use futures::FutureExt;
use tokio::sync::{broadcast, mpsc};

use crate::config::PoolConfig;
use crate::error::CallbackError;
use crate::events::{Bus, Event, EventKind};
use crate::fiber::resume::JobFuture;
use crate::scheduler::{Scheduler, TokioScheduler};

static GLOBAL: OnceLock<Arc<FiberPool>> = OnceLock::new();

/// One subscriber invocation bound for a fiber.
pub(crate) struct Job {
    signal: Arc<str>,
    fut: JobFuture,
}

impl Job {
    pub(crate) fn new(signal: Arc<str>, fut: JobFuture) -> Self {
        Self { signal, fut }
    }
}

/// Exclusive handle to an idle fiber.
///
/// Holding it is the only way to feed the fiber a job; [`Fiber::run`] consumes it.
/// The handle is the only strong sender of the fiber's channel: once nobody
/// holds it, the fiber's receive loop ends.
struct Fiber {
    id: u64,
    tx: mpsc::UnboundedSender<Assignment>,
}

/// A job travelling together with the handle of the fiber that runs it.
struct Assignment {
    job: Job,
    fiber: Fiber,
}

impl Fiber {
    /// Hands `job` to the fiber. Gives the job back if the fiber is gone.
    fn run(self, job: Job) -> Result<(), Job> {
        let tx = self.tx.clone();
        tx.send(Assignment { job, fiber: self })
            .map_err(|mpsc::error::SendError(assignment)| assignment.job)
    }
}

#[derive(Default)]
struct Parked {
    free: Option<Fiber>,
    idle: Vec<Fiber>,
}

/// Pool of reusable fibers.
///
/// Signals use [`FiberPool::global`] unless built with their own pool.
///
/// ### Properties
/// - **Lazy**: no fiber exists until the first yield-capable dispatch.
/// - **Monotonic**: fibers are never retired while the pool and its runtime live;
///   dropping a dedicated pool stops its fibers once their current job ends.
/// - **Observable**: isolated failures are published on [`FiberPool::subscribe`].
pub struct FiberPool {
    parked: Mutex<Parked>,
    scheduler: Arc<dyn Scheduler>,
    bus: Bus,
    spawned: AtomicUsize,
    next_id: AtomicU64,
}

impl FiberPool {
    /// Creates a pool whose fibers run on the ambient tokio runtime.
    pub fn new(cfg: PoolConfig) -> Arc<Self> {
        Self::with_scheduler(cfg, Arc::new(TokioScheduler))
    }

    /// Creates a pool that starts fibers through `scheduler`.
    pub fn with_scheduler(cfg: PoolConfig, scheduler: Arc<dyn Scheduler>) -> Arc<Self> {
        Arc::new(Self {
            parked: Mutex::new(Parked::default()),
            scheduler,
            bus: Bus::new(cfg.bus_capacity_clamped()),
            spawned: AtomicUsize::new(0),
            next_id: AtomicU64::new(1),
        })
    }

    /// Process-wide pool, created on first use.
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL.get_or_init(|| FiberPool::new(PoolConfig::default())))
    }

    /// Receiver for this pool's dispatch events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Number of fibers started so far.
    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::Relaxed)
    }

    /// Number of fibers currently parked and ready for reuse.
    pub fn idle(&self) -> usize {
        let parked = self.lock();
        usize::from(parked.free.is_some()) + parked.idle.len()
    }

    /// Runs `job` on a parked fiber, starting a new one if none is usable.
    pub(crate) fn submit(self: &Arc<Self>, mut job: Job) {
        while let Some(fiber) = self.take_parked() {
            let id = fiber.id;
            match fiber.run(job) {
                Ok(()) => return,
                Err(back) => {
                    tracing::debug!(fiber = id, "discarding fiber of a stopped runtime");
                    job = back;
                }
            }
        }

        let fiber = self.spawn_fiber();
        if let Err(job) = fiber.run(job) {
            tracing::warn!(
                signal = %job.signal,
                "fiber exited before its first job; dispatch dropped"
            );
        }
    }

    /// Publishes an event on this pool's bus.
    pub(crate) fn report(&self, ev: Event) {
        self.bus.publish(ev);
    }

    fn report_failure(&self, signal: &Arc<str>, fiber: u64, err: &CallbackError) {
        tracing::warn!(signal = %signal, fiber, error = %err, "isolated subscriber failed");
        let kind = match err {
            CallbackError::Panicked { .. } => EventKind::CallbackPanicked,
            _ => EventKind::CallbackFailed,
        };
        self.report(
            Event::new(kind)
                .with_signal(Arc::clone(signal))
                .with_fiber(fiber)
                .with_reason(err.to_string()),
        );
    }

    fn take_parked(&self) -> Option<Fiber> {
        let mut parked = self.lock();
        parked.free.take().or_else(|| parked.idle.pop())
    }

    fn release(&self, fiber: Fiber) {
        let mut parked = self.lock();
        if parked.free.is_none() {
            parked.free = Some(fiber);
        } else {
            parked.idle.push(fiber);
        }
    }

    fn spawn_fiber(self: &Arc<Self>) -> Fiber {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel::<Assignment>();
        let pool = Arc::downgrade(self);
        self.scheduler.spawn(Box::pin(drive(pool, rx)));

        self.spawned.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(fiber = id, "fiber pool grew");
        self.report(Event::new(EventKind::FiberSpawned).with_fiber(id));
        Fiber { id, tx }
    }

    fn lock(&self) -> MutexGuard<'_, Parked> {
        self.parked.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fiber body: runs jobs one at a time and parks itself between them.
///
/// Exits when the pool is gone: either the parked handle was dropped with the
/// pool, or the pool vanished while a job was running.
async fn drive(owner: Weak<FiberPool>, mut rx: mpsc::UnboundedReceiver<Assignment>) {
    while let Some(Assignment { job, fiber }) = rx.recv().await {
        let Job { signal, fut } = job;
        let id = fiber.id;
        let outcome = AssertUnwindSafe(fut).catch_unwind().await;

        let Some(pool) = owner.upgrade() else { break };
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => pool.report_failure(&signal, id, &err),
            Err(panic_err) => {
                let info = if let Some(msg) = panic_err.downcast_ref::<&'static str>() {
                    (*msg).to_string()
                } else if let Some(msg) = panic_err.downcast_ref::<String>() {
                    msg.clone()
                } else {
                    "unknown panic".to_string()
                };
                pool.report_failure(&signal, id, &CallbackError::Panicked { info });
            }
        }
        pool.release(fiber);
    }
    tracing::debug!("fiber stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job<F>(signal: &str, fut: F) -> Job
    where
        F: Future<Output = Result<(), CallbackError>> + Send + 'static,
    {
        Job::new(Arc::from(signal), Box::pin(fut))
    }

    fn explode() -> Result<(), CallbackError> {
        panic!("kaboom")
    }

    #[tokio::test]
    async fn completed_fiber_is_reused() {
        let pool = FiberPool::new(PoolConfig::default());
        assert_eq!(pool.spawned(), 0);

        for round in 0..3u8 {
            let (tx, rx) = tokio::sync::oneshot::channel();
            pool.submit(job("reuse", async move {
                let _ = tx.send(round);
                Ok(())
            }));
            assert_eq!(rx.await.unwrap(), round);
            tokio::task::yield_now().await;
        }

        assert_eq!(pool.spawned(), 1);
        assert_eq!(pool.idle(), 1);
    }

    #[tokio::test]
    async fn busy_fiber_is_not_handed_out_twice() {
        let pool = FiberPool::new(PoolConfig::default());
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<&'static str>();

        let first = done_tx.clone();
        pool.submit(job("busy", async move {
            let _ = release_rx.await;
            let _ = first.send("first");
            Ok(())
        }));
        pool.submit(job("busy", async move {
            let _ = done_tx.send("second");
            Ok(())
        }));

        assert_eq!(done_rx.recv().await, Some("second"));
        assert_eq!(pool.spawned(), 2);

        release_tx.send(()).unwrap();
        assert_eq!(done_rx.recv().await, Some("first"));
    }

    #[tokio::test]
    async fn failures_and_panics_are_reported() {
        let pool = FiberPool::new(PoolConfig::default());
        let mut events = pool.subscribe();

        pool.submit(job("failing", async { Err(CallbackError::fail("boom")) }));
        pool.submit(job("panicking", async { explode() }));

        let mut failed = None;
        let mut panicked = None;
        while failed.is_none() || panicked.is_none() {
            let ev = events.recv().await.unwrap();
            match ev.kind {
                EventKind::CallbackFailed => failed = Some(ev),
                EventKind::CallbackPanicked => panicked = Some(ev),
                _ => {}
            }
        }

        let failed = failed.unwrap();
        assert_eq!(failed.signal.as_deref(), Some("failing"));
        assert_eq!(failed.reason.as_deref(), Some("callback failed: boom"));
        let panicked = panicked.unwrap();
        assert_eq!(panicked.signal.as_deref(), Some("panicking"));
        assert_eq!(panicked.reason.as_deref(), Some("callback panicked: kaboom"));
    }

    #[tokio::test]
    async fn fibers_exit_when_their_pool_is_dropped() {
        let metrics = tokio::runtime::Handle::current().metrics();
        let before = metrics.num_alive_tasks();

        let pool = FiberPool::new(PoolConfig::default());
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        pool.submit(job("held", async move {
            let _ = release_rx.await;
            Ok(())
        }));
        pool.submit(job("quick", async { Ok(()) }));
        assert_eq!(pool.spawned(), 2);

        release_tx.send(()).unwrap();
        while pool.idle() < 2 {
            tokio::task::yield_now().await;
        }
        assert_eq!(metrics.num_alive_tasks(), before + 2);

        drop(pool);
        for _ in 0..50 {
            if metrics.num_alive_tasks() == before {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(metrics.num_alive_tasks(), before);
    }

    #[tokio::test]
    async fn busy_fiber_exits_after_its_pool_is_dropped() {
        let metrics = tokio::runtime::Handle::current().metrics();
        let before = metrics.num_alive_tasks();

        let pool = FiberPool::new(PoolConfig::default());
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let (done_tx, done_rx) = tokio::sync::oneshot::channel::<()>();
        pool.submit(job("orphaned", async move {
            let _ = release_rx.await;
            let _ = done_tx.send(());
            Ok(())
        }));
        tokio::task::yield_now().await;
        assert_eq!(metrics.num_alive_tasks(), before + 1);

        drop(pool);
        release_tx.send(()).unwrap();
        done_rx.await.unwrap();
        for _ in 0..50 {
            if metrics.num_alive_tasks() == before {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(metrics.num_alive_tasks(), before);
    }

    #[tokio::test]
    async fn spawning_is_announced() {
        let pool = FiberPool::new(PoolConfig::default());
        let mut events = pool.subscribe();
        pool.submit(job("announce", async { Ok(()) }));

        let ev = events.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::FiberSpawned);
        assert_eq!(ev.fiber, Some(1));
    }
}
