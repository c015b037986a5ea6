//! # Fibers: reusable execution contexts for suspendable subscribers.
//!
//! A fiber is a long-lived tokio task that owns the receiving end of a private
//! channel and runs one dispatch job at a time. The [`FiberPool`] keeps idle
//! fibers around so that firing a signal does not start a new task per
//! subscriber.
//!
//! ## Architecture
//! ```text
//! Signal::fire ──► FiberPool::submit(job)
//!                     │
//!                     ├─ free slot?  ──► fiber A ─┐
//!                     ├─ idle stack? ──► fiber B ─┼─► job.await (catch_unwind)
//!                     └─ none        ──► spawn C ─┘          │
//!                                                            ▼
//!                                     failure/panic ──► tracing::warn + Bus event
//!                                                            │
//!                                         park in free slot, else push onto idle stack
//! ```
//!
//! ## Rules
//! - **One job per fiber**: acquiring a fiber moves its sender out of the pool;
//!   submitting consumes the acquired fiber, so nobody else can feed it.
//! - **Grow only**: fibers are never retired while their pool lives; a fiber
//!   whose runtime is gone is discarded on the next acquire. Dropping a
//!   dedicated pool closes the parked fibers' channels and they exit.
//! - **Inline resume**: `resume_inline` polls a job once on the caller's
//!   stack; a suspended remainder is handed to the pool.

mod pool;
mod resume;

pub use pool::FiberPool;
pub(crate) use pool::Job;
pub(crate) use resume::{JobFuture, Resumed, resume_inline};
