//! # Signal, pool and subscription settings.
//!
//! - [`SignalConfig`]: per-signal settings (diagnostic name, default isolation).
//! - [`PoolConfig`]: settings of a [`FiberPool`](crate::FiberPool).
//! - [`ConnectOptions`]: per-subscription overrides accepted by
//!   [`Signal::connect_with`](crate::Signal::connect_with).
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1 (a broadcast channel needs room for one event)

use std::sync::Arc;

/// Per-signal configuration.
///
/// ## Field semantics
/// - `name`: label used in logs, events and errors only
/// - `default_safe`: isolation applied to yield-capable subscribers that do not opt out
#[derive(Clone, Debug)]
pub struct SignalConfig {
    /// Diagnostic label.
    pub name: Arc<str>,

    /// Whether yield-capable subscribers are dispatched on isolated fibers by default.
    ///
    /// - `true`: a failing or suspended subscriber never affects the firing call
    /// - `false`: subscribers are resumed inline and their failures propagate
    pub default_safe: bool,
}

impl Default for SignalConfig {
    /// Default configuration:
    ///
    /// - `name = "signal"`
    /// - `default_safe = true`
    fn default() -> Self {
        Self {
            name: Arc::from("signal"),
            default_safe: true,
        }
    }
}

/// Fiber pool configuration.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Capacity of the pool's event bus ring buffer.
    ///
    /// Receivers that lag behind more than `bus_capacity` events observe `Lagged`.
    pub bus_capacity: usize,
}

impl PoolConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { bus_capacity: 1024 }
    }
}

/// Per-subscription overrides.
///
/// All options default to `false`, which yields a persistent, yield-capable
/// subscription using the signal's default isolation.
///
/// ## Example
/// ```
/// use fibersignal::ConnectOptions;
///
/// let opts = ConnectOptions::new().once().no_yield();
/// assert!(opts.once && opts.no_yield && !opts.unsafe_resume);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Disconnect right before the first invocation.
    pub once: bool,
    /// Invoke inline on the firing call; the handler must not suspend.
    pub no_yield: bool,
    /// Resume synchronously inside the firing call instead of on an isolated fiber.
    pub unsafe_resume: bool,
}

impl ConnectOptions {
    /// All options off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets [`ConnectOptions::once`].
    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    /// Sets [`ConnectOptions::no_yield`].
    pub fn no_yield(mut self) -> Self {
        self.no_yield = true;
        self
    }

    /// Sets [`ConnectOptions::unsafe_resume`].
    pub fn unsafe_resume(mut self) -> Self {
        self.unsafe_resume = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = SignalConfig::default();
        assert_eq!(&*cfg.name, "signal");
        assert!(cfg.default_safe);
        assert_eq!(ConnectOptions::new(), ConnectOptions::default());
    }

    #[test]
    fn zero_bus_capacity_is_clamped() {
        let cfg = PoolConfig { bus_capacity: 0 };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(PoolConfig::default().bus_capacity_clamped(), 1024);
    }
}
