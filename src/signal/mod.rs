//! # Signals and their subscriptions.
//!
//! - [`Signal`]: ordered subscriber list with `fire`, `defer`, `fire_unsafe`,
//!   `wait`, `timeout` and `clear`.
//! - [`Connection`]: handle returned by every subscribe call.
//! - [`ScopedConnection`]: a connection that disconnects on drop.
//! - [`SignalBuilder`]: fluent construction with a dedicated pool or scheduler.

mod builder;
mod connection;
mod list;
#[allow(clippy::module_inception)]
mod signal;
mod wait;

pub use builder::SignalBuilder;
pub use connection::{Connection, ScopedConnection};
pub use signal::Signal;
