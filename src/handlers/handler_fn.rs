//! # Closure-backed handlers.
//!
//! [`HandlerFn`] wraps `F: Fn(T) -> Fut`, producing a fresh future per dispatch.
//! [`BoundHandler`] wraps `F: Fn(T, B) -> Fut` plus a value `B` fixed at
//! subscribe time; every dispatch receives the fire-time value first and a
//! clone of the bound value second.
//!
//! The closure itself runs on the first poll of the future, so for inline and
//! unsafe subscribers its synchronous prefix executes inside the firing call.
//!
//! ## Example
//! ```rust
//! use fibersignal::{BoundHandler, CallbackError, Handler, HandlerFn};
//!
//! let plain = HandlerFn::arc(|n: u32| async move {
//!     let _ = n;
//!     Ok::<_, CallbackError>(())
//! });
//! assert!(!Handler::<u32>::has_bound_args(&*plain));
//!
//! let tagged = BoundHandler::arc(|n: u32, tag: &'static str| async move {
//!     let _ = (n, tag);
//!     Ok::<_, CallbackError>(())
//! }, "x");
//! assert!(Handler::<u32>::has_bound_args(&*tagged));
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CallbackError;
use crate::handlers::handler::Handler;

/// Closure-backed handler.
#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> HandlerFn<F> {
    /// Wraps a closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps a closure and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<T, F, Fut> Handler<T> for HandlerFn<F>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
{
    async fn call(&self, args: T) -> Result<(), CallbackError> {
        (self.f)(args).await
    }
}

/// Closure-backed handler with bound arguments.
#[derive(Debug)]
pub struct BoundHandler<F, B> {
    f: F,
    bound: B,
}

impl<F, B> BoundHandler<F, B> {
    /// Wraps a closure together with the value appended to every dispatch.
    pub fn new(f: F, bound: B) -> Self {
        Self { f, bound }
    }

    /// Same as [`BoundHandler::new`], returned as a shared handle.
    pub fn arc(f: F, bound: B) -> Arc<Self> {
        Arc::new(Self::new(f, bound))
    }

    /// The bound value.
    pub fn bound(&self) -> &B {
        &self.bound
    }
}

#[async_trait]
impl<T, B, F, Fut> Handler<T> for BoundHandler<F, B>
where
    T: Send + 'static,
    B: Clone + Send + Sync + 'static,
    F: Fn(T, B) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
{
    async fn call(&self, args: T) -> Result<(), CallbackError> {
        (self.f)(args, self.bound.clone()).await
    }

    fn has_bound_args(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn fire_time_value_precedes_bound_value() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let h = BoundHandler::new(
            move |(a, b): (i32, i32), tag: &'static str| {
                sink.lock().unwrap().push(format!("{a},{b},{tag}"));
                async { Ok::<(), CallbackError>(()) }
            },
            "x",
        );

        h.call((1, 2)).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["1,2,x".to_string()]);
        assert_eq!(*h.bound(), "x");
    }

    #[tokio::test]
    async fn handler_fn_forwards_errors() {
        let h = HandlerFn::new(|_: ()| async { Err::<(), _>(CallbackError::fail("nope")) });
        assert_eq!(h.call(()).await, Err(CallbackError::fail("nope")));
    }
}
