//! # Subscriber handlers.
//!
//! This module provides the callback side of a subscription:
//! - [`Handler`] - trait for async, possibly suspending subscribers
//! - [`HandlerFn`] - closure-backed handler
//! - [`HandlerRef`] - shared reference to a handler (`Arc<dyn Handler<T>>`)
//! - [`BoundHandler`] - closure-backed handler with extra arguments fixed at subscribe time

mod handler;
mod handler_fn;

pub use handler::{Handler, HandlerRef};
pub use handler_fn::{BoundHandler, HandlerFn};
