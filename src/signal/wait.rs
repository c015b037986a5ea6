//! # Rendezvous between a firing signal and a suspended caller.
//!
//! Both primitives are plain `once` + `noyield` subscriptions whose handler
//! hands the fired value to the awaiting task through a oneshot channel.
//!
//! ```text
//! timeout(d)
//!   ├─► once subscription ──fire──► cancel delay, send Some(args)
//!   └─► scheduler.delay(d) ──due──► disconnect subscription, send None
//!                                   (first sender wins, the other finds the slot empty)
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::config::ConnectOptions;
use crate::error::{CallbackError, SignalError};
use crate::scheduler::DelayHandle;
use crate::signal::connection::ScopedConnection;
use crate::signal::signal::Signal;

/// Sending half shared by the competing paths; taken by whichever runs first.
type Slot<V> = Arc<Mutex<Option<oneshot::Sender<V>>>>;

fn take<V>(slot: &Mutex<Option<oneshot::Sender<V>>>) -> Option<oneshot::Sender<V>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

/// Cancels the delay when the waiting future goes away.
struct CancelOnDrop(DelayHandle);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

impl<T: Clone + Send + 'static> Signal<T> {
    /// Suspends until the next dispatch and returns its value.
    ///
    /// Dropping the future before the signal fires disconnects the
    /// underlying subscription.
    ///
    /// # Errors
    /// [`SignalError::Detached`] if the subscription is dropped without firing,
    /// e.g. because the signal was [`clear`](Signal::clear)ed.
    pub async fn wait(&self) -> Result<T, SignalError> {
        let (tx, rx) = oneshot::channel::<T>();
        let slot: Slot<T> = Arc::new(Mutex::new(Some(tx)));

        let _conn: ScopedConnection = self
            .connect_with(
                move |args: T| {
                    if let Some(tx) = take(&slot) {
                        let _ = tx.send(args);
                    }
                    async { Ok::<(), CallbackError>(()) }
                },
                ConnectOptions::new().once().no_yield(),
            )
            .scoped();

        rx.await.map_err(|_| SignalError::Detached {
            signal: Arc::clone(&self.inner.name),
        })
    }

    /// Waits for the next dispatch for at most `after`.
    ///
    /// Returns `Some(args)` if the signal fired first and `None` once the
    /// delay elapsed. Either way, no subscription is left behind.
    pub async fn timeout(&self, after: Duration) -> Option<T> {
        let (tx, rx) = oneshot::channel::<Option<T>>();
        let slot: Slot<Option<T>> = Arc::new(Mutex::new(Some(tx)));
        let timer: Arc<Mutex<Option<DelayHandle>>> = Arc::new(Mutex::new(None));

        let on_fire = Arc::clone(&slot);
        let fire_timer = Arc::clone(&timer);
        let conn = self.connect_with(
            move |args: T| {
                if let Some(tx) = take(&on_fire) {
                    let pending = fire_timer
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .take();
                    if let Some(delay) = pending {
                        delay.cancel();
                    }
                    let _ = tx.send(Some(args));
                }
                async { Ok::<(), CallbackError>(()) }
            },
            ConnectOptions::new().once().no_yield(),
        );

        let on_expiry = Arc::clone(&slot);
        let expired = conn.clone();
        let delay = self.inner.scheduler.delay(
            after,
            Box::new(move || {
                expired.disconnect();
                if let Some(tx) = take(&on_expiry) {
                    let _ = tx.send(None);
                }
            }),
        );
        {
            let mut pending = timer.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.lock().unwrap_or_else(PoisonError::into_inner).is_some() {
                *pending = Some(delay.clone());
            } else {
                // Fired before the delay was registered.
                delay.cancel();
            }
        }

        let _conn = conn.scoped();
        let _delay = CancelOnDrop(delay);
        rx.await.ok().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PoolConfig, SignalConfig};
    use crate::fiber::FiberPool;

    fn signal<T: Clone + Send + 'static>(name: &str) -> Signal<T> {
        Signal::builder(SignalConfig::default())
            .name(name)
            .pool(FiberPool::new(PoolConfig::default()))
            .build()
    }

    async fn until_subscribed<T: Clone + Send + 'static>(sig: &Signal<T>, n: usize) {
        while sig.len() != n {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn wait_returns_the_fired_value() {
        let sig = signal::<(u8, &'static str)>("ready");
        let waiter = {
            let sig = sig.clone();
            tokio::spawn(async move { sig.wait().await })
        };
        until_subscribed(&sig, 1).await;

        sig.fire((7, "go")).unwrap();
        assert_eq!(waiter.await.unwrap().unwrap(), (7, "go"));
        assert!(sig.is_empty());
    }

    #[tokio::test]
    async fn wait_reports_detached_after_clear() {
        let sig = signal::<u8>("cleared");
        let waiter = {
            let sig = sig.clone();
            tokio::spawn(async move { sig.wait().await })
        };
        until_subscribed(&sig, 1).await;

        sig.clear();
        let err = waiter.await.unwrap().unwrap_err();
        assert_eq!(err.as_label(), "signal_wait_detached");
    }

    #[tokio::test]
    async fn dropped_wait_leaves_no_subscription() {
        let sig = signal::<u8>("abandoned");
        let waiter = {
            let sig = sig.clone();
            tokio::spawn(async move { sig.wait().await })
        };
        until_subscribed(&sig, 1).await;

        waiter.abort();
        let _ = waiter.await;
        assert!(sig.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_returns_value_when_fired_in_time() {
        let sig = signal::<u32>("fast");
        let waiter = {
            let sig = sig.clone();
            tokio::spawn(async move { sig.timeout(Duration::from_millis(10)).await })
        };
        until_subscribed(&sig, 1).await;

        tokio::time::sleep(Duration::from_millis(5)).await;
        sig.fire(99).unwrap();
        assert_eq!(waiter.await.unwrap(), Some(99));
        assert!(sig.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_expires_without_dangling_connection() {
        let sig = signal::<u32>("silent");
        let got = sig.timeout(Duration::from_millis(10)).await;

        assert_eq!(got, None);
        assert!(sig.is_empty());
        // A later fire reaches nobody.
        sig.fire(1).unwrap();
    }
}
