use std::marker::PhantomData;
use std::sync::Arc;

use crate::config::SignalConfig;
use crate::fiber::FiberPool;
use crate::scheduler::{Scheduler, TokioScheduler};
use crate::signal::signal::Signal;

/// Builder for constructing a [`Signal`] with optional collaborators.
///
/// ## Example
/// ```
/// use fibersignal::{FiberPool, PoolConfig, Signal, SignalConfig};
///
/// let pool = FiberPool::new(PoolConfig::default());
/// let resized: Signal<(u32, u32)> = Signal::builder(SignalConfig::default())
///     .name("resized")
///     .default_safe(false)
///     .pool(pool.clone())
///     .build();
///
/// assert_eq!(resized.name(), "resized");
/// assert!(std::sync::Arc::ptr_eq(resized.pool(), &pool));
/// ```
pub struct SignalBuilder<T> {
    cfg: SignalConfig,
    pool: Option<Arc<FiberPool>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    _value: PhantomData<fn() -> T>,
}

impl<T: Clone + Send + 'static> SignalBuilder<T> {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SignalConfig) -> Self {
        Self {
            cfg,
            pool: None,
            scheduler: None,
            _value: PhantomData,
        }
    }

    /// Sets the diagnostic label.
    pub fn name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.cfg.name = name.into();
        self
    }

    /// Sets the isolation applied to subscribers that do not opt out.
    pub fn default_safe(mut self, safe: bool) -> Self {
        self.cfg.default_safe = safe;
        self
    }

    /// Dispatches yield-capable subscribers on `pool` instead of [`FiberPool::global`].
    pub fn pool(mut self, pool: Arc<FiberPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Uses `scheduler` for deferred passes and timeouts.
    ///
    /// Defaults to [`TokioScheduler`]. Fibers are started by the pool's own scheduler.
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Builds the signal. Cheap: nothing is spawned until a subscriber needs a fiber.
    pub fn build(self) -> Signal<T> {
        let pool = self.pool.unwrap_or_else(FiberPool::global);
        let scheduler = self
            .scheduler
            .unwrap_or_else(|| Arc::new(TokioScheduler) as Arc<dyn Scheduler>);
        Signal::from_parts(self.cfg, pool, scheduler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;

    #[test]
    fn value_type_is_taken_from_the_binding() {
        let pool = FiberPool::new(PoolConfig::default());
        let sig: Signal<(u8, String)> = Signal::builder(SignalConfig::default())
            .name("typed")
            .default_safe(false)
            .pool(Arc::clone(&pool))
            .build();

        assert_eq!(sig.name(), "typed");
        assert!(Arc::ptr_eq(sig.pool(), &pool));
        assert!(!sig.connect(|_: (u8, String)| async { Ok::<(), crate::CallbackError>(()) }).is_safe());
    }
}
