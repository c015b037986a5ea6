//! # fibersignal
//!
//! **fibersignal** is an in-process signal/slot dispatcher for async Rust.
//!
//! A [`Signal`] holds an ordered list of subscribers and invokes each of them
//! with a caller-supplied value when fired. Subscribers that may suspend run
//! on a pool of reusable fibers instead of one fresh task per dispatch.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Connection  │   │  Connection  │   │  Connection  │
//!     │ (noyield)    │   │ (yield,safe) │   │(yield,unsafe)│
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Signal<T>                                                        │
//! │  - List (arena-backed circular list, sentinel at slot 0)          │
//! │  - fire / defer / fire_unsafe / wait / timeout / clear            │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        │ inline           │ submit           │ poll once,    │ defer / delay
//!        ▼                  ▼                  ▼ rest→submit   ▼
//!   caller's stack   ┌────────────────────────────────┐   ┌───────────┐
//!                    │  FiberPool                     │   │ Scheduler │
//!                    │  free slot + idle stack        │   │ (tokio)   │
//!                    └──────┬─────────────────────────┘   └───────────┘
//!                           ▼
//!                fiber1   fiber2   fiberN   (tokio tasks, one job at a time)
//!                           │
//!                           ▼ failures / panics / pool growth
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                   Bus (broadcast channel of Event)                │
//! │                  (capacity: PoolConfig::bus_capacity)             │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Dispatch of one subscriber
//! ```text
//! once?            ──► unlink first (re-entrant fires never see it again)
//! noyield          ──► poll inline; Err ─► SignalError::Callback, pass aborted
//!                                  Pending ─► SignalError::SuspendedInline
//! yield + safe     ──► FiberPool::submit   (isolated, errors go to the Bus)
//! yield + unsafe   ──► poll inline; Err ─► SignalError::Callback, pass aborted
//!                                  Pending ─► remainder continues on a fiber
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Signals**       | Subscribe, fire, defer, await the next dispatch.             | [`Signal`], [`SignalBuilder`]               |
//! | **Subscriptions** | Handles with flags, explicit or scoped disconnect.           | [`Connection`], [`ScopedConnection`]        |
//! | **Handlers**      | Async subscribers as closures or trait objects.              | [`Handler`], [`HandlerFn`], [`BoundHandler`]|
//! | **Fibers**        | Reusable execution contexts for suspendable subscribers.     | [`FiberPool`]                               |
//! | **Scheduling**    | Host boundary for spawn, defer, delay and cancel.            | [`Scheduler`], [`TokioScheduler`]           |
//! | **Events**        | Isolated failures and pool growth as broadcast events.       | [`Event`], [`EventKind`]                    |
//! | **Errors**        | Typed errors for callbacks and dispatch passes.              | [`CallbackError`], [`SignalError`]          |
//! | **Configuration** | Signal, pool and per-subscription settings.                  | [`SignalConfig`], [`PoolConfig`], [`ConnectOptions`] |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use fibersignal::{CallbackError, Signal};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let progress: Signal<u32> = Signal::new("progress");
//!
//!     // Yield-capable and isolated by default: runs on a pooled fiber.
//!     let total = Arc::new(AtomicU32::new(0));
//!     let sum = Arc::clone(&total);
//!     let conn = progress.connect(move |step: u32| {
//!         let sum = Arc::clone(&sum);
//!         async move {
//!             sum.fetch_add(step, Ordering::SeqCst);
//!             Ok::<(), CallbackError>(())
//!         }
//!     });
//!
//!     // Someone else awaits the next dispatch.
//!     let waiter = {
//!         let progress = progress.clone();
//!         tokio::spawn(async move { progress.wait().await })
//!     };
//!     while progress.len() < 2 {
//!         tokio::task::yield_now().await;
//!     }
//!
//!     progress.fire(10)?;
//!     assert_eq!(waiter.await??, 10);
//!
//!     conn.disconnect();
//!     assert!(progress.is_empty());
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod events;
mod fiber;
mod handlers;
mod scheduler;
mod signal;

// ---- Public re-exports ----

pub use config::{ConnectOptions, PoolConfig, SignalConfig};
pub use error::{CallbackError, SignalError};
pub use events::{Event, EventKind};
pub use fiber::FiberPool;
pub use handlers::{BoundHandler, Handler, HandlerFn, HandlerRef};
pub use scheduler::{DelayHandle, Job, Scheduler, TokioScheduler};
pub use signal::{Connection, ScopedConnection, Signal, SignalBuilder};
