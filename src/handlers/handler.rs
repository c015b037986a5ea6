use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CallbackError;

/// Shared handle to a handler.
pub type HandlerRef<T> = Arc<dyn Handler<T>>;

/// # Asynchronous subscriber.
///
/// `call` receives the value passed to `fire`. How the returned future is
/// driven depends on the subscription's flags:
/// - `noyield`: polled once on the firing call; it must complete without suspending;
/// - yield-capable, safe: driven to completion on a pooled fiber;
/// - yield-capable, unsafe: polled once on the firing call, then handed to a
///   pooled fiber if it suspended.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use fibersignal::{CallbackError, Handler};
///
/// struct Print;
///
/// #[async_trait]
/// impl Handler<(u32, String)> for Print {
///     async fn call(&self, (id, name): (u32, String)) -> Result<(), CallbackError> {
///         println!("{id}: {name}");
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Handler<T: Send + 'static>: Send + Sync + 'static {
    /// Handles one dispatch.
    async fn call(&self, args: T) -> Result<(), CallbackError>;

    /// True if extra arguments were bound at subscribe time.
    fn has_bound_args(&self) -> bool {
        false
    }
}
