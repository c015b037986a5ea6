use std::task::{Context, Poll};

use futures::future::BoxFuture;
use futures::task::noop_waker_ref;

use crate::error::CallbackError;

/// A subscriber invocation, ready to be polled.
pub(crate) type JobFuture = BoxFuture<'static, Result<(), CallbackError>>;

/// Outcome of polling a job once on the caller's stack.
pub(crate) enum Resumed {
    /// The job ran to completion.
    Done(Result<(), CallbackError>),
    /// The job suspended; the remainder must be driven elsewhere.
    Suspended(JobFuture),
}

/// Polls `job` once, synchronously.
///
/// The poll uses a no-op waker. A suspended remainder must be polled again by
/// its next driver, which re-registers a real waker; every future that follows
/// the `Future` contract re-registers on each poll.
pub(crate) fn resume_inline(mut job: JobFuture) -> Resumed {
    let mut cx = Context::from_waker(noop_waker_ref());
    match job.as_mut().poll(&mut cx) {
        Poll::Ready(res) => Resumed::Done(res),
        Poll::Pending => Resumed::Suspended(job),
    }
}
