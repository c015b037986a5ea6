//! Dispatch events: types and broadcast bus.
//!
//! Failures on isolated paths never reach the firing caller. They are logged
//! and published here instead, so callers can observe them programmatically.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: fiber workers (spawn, failure, panic) and deferred passes.
//! - **Consumers**: anyone holding [`FiberPool::subscribe`](crate::FiberPool::subscribe).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
