//! Error types used by signals and their subscribers.
//!
//! This module defines two main error enums:
//!
//! - [`CallbackError`] - errors returned (or panics caught) from a subscriber handler.
//! - [`SignalError`] - errors surfaced to the caller of a signal operation.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//!
//! Which error reaches the caller depends on the dispatch path:
//! - **isolated** (safe fiber, deferred pass): the failure is logged and published
//!   on the pool's event bus ([`FiberPool::subscribe`](crate::FiberPool::subscribe)), `fire` still returns `Ok(())`;
//! - **coupled** (inline, unsafe resume): the failure is returned from `fire` as
//!   [`SignalError::Callback`] and the rest of the pass is skipped.

use std::sync::Arc;

use thiserror::Error;

/// # Errors produced by a subscriber handler.
///
/// Handlers return [`CallbackError::Fail`]; [`CallbackError::Panicked`] is produced
/// by the fiber pool when a handler running on an isolated fiber panics.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallbackError {
    /// The handler reported a failure.
    #[error("callback failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The handler panicked while running on a pooled fiber.
    #[error("callback panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl CallbackError {
    /// Shorthand for [`CallbackError::Fail`].
    ///
    /// # Example
    /// ```
    /// use fibersignal::CallbackError;
    ///
    /// let err = CallbackError::fail("boom");
    /// assert_eq!(err.to_string(), "callback failed: boom");
    /// ```
    pub fn fail(error: impl Into<String>) -> Self {
        CallbackError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CallbackError::Fail { .. } => "callback_failed",
            CallbackError::Panicked { .. } => "callback_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            CallbackError::Fail { error } => format!("error: {error}"),
            CallbackError::Panicked { info } => format!("panic: {info}"),
        }
    }
}

/// # Errors surfaced by signal operations.
///
/// Every variant carries the signal's diagnostic name.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SignalError {
    /// A subscriber dispatched inline or through unsafe resume failed; the
    /// remainder of the dispatch pass was skipped.
    #[error("subscriber of signal '{signal}' failed: {source}")]
    Callback {
        /// Name of the firing signal.
        signal: Arc<str>,
        /// The handler's error.
        source: CallbackError,
    },

    /// A `noyield` subscriber tried to suspend; its invocation was dropped.
    #[error("subscriber of signal '{signal}' suspended while dispatched inline")]
    SuspendedInline {
        /// Name of the firing signal.
        signal: Arc<str>,
    },

    /// A pending `wait` lost its subscription before the signal fired
    /// (the signal was cleared or dropped).
    #[error("wait on signal '{signal}' detached before it fired")]
    Detached {
        /// Name of the signal that was awaited.
        signal: Arc<str>,
    },
}

impl SignalError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use fibersignal::SignalError;
    ///
    /// let err = SignalError::SuspendedInline { signal: "clicked".into() };
    /// assert_eq!(err.as_label(), "signal_suspended_inline");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SignalError::Callback { .. } => "signal_callback_failed",
            SignalError::SuspendedInline { .. } => "signal_suspended_inline",
            SignalError::Detached { .. } => "signal_wait_detached",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SignalError::Callback { signal, source } => {
                format!("signal={signal} {}", source.as_message())
            }
            SignalError::SuspendedInline { signal } => {
                format!("signal={signal} inline subscriber suspended")
            }
            SignalError::Detached { signal } => format!("signal={signal} wait detached"),
        }
    }

    /// The handler error, if this is a [`SignalError::Callback`].
    pub fn callback(&self) -> Option<&CallbackError> {
        match self {
            SignalError::Callback { source, .. } => Some(source),
            _ => None,
        }
    }
}
