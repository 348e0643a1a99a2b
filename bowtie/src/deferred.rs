//! Deferred calls.
//!
//! A [`Deferred`] is a lazy call: nothing is bound or sent until it is
//! awaited, and it completes with exactly one value or one error. Dropping it
//! before completion abandons the in-flight request. [`Deferred::spawn`] runs
//! it on the tokio runtime instead and hands back a [`DeferredHandle`] that
//! aborts the task when cancelled or dropped.

use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use tokio::task::JoinHandle;

use crate::error::BowtieError;

/// A call that runs when awaited.
///
/// ```no_run
/// # async fn run(proxy: bowtie::Proxy) -> Result<(), bowtie::BowtieError> {
/// use bowtie::Arguments;
///
/// let user = proxy.deferred::<serde_json::Value>(
///     "getUserObservable",
///     Arguments::new().with("username", "jdoe"),
/// )?;
/// let user = user.await?;
/// # Ok(())
/// # }
/// ```
#[must_use = "a deferred call does nothing unless awaited or spawned"]
pub struct Deferred<T> {
    future: BoxFuture<'static, Result<T, BowtieError>>,
}

impl<T> Deferred<T> {
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, BowtieError>> + Send + 'static,
    {
        Deferred {
            future: Box::pin(future),
        }
    }

    /// Starts the call on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn spawn(self) -> DeferredHandle<T>
    where
        T: Send + 'static,
    {
        DeferredHandle {
            task: tokio::spawn(self.future),
        }
    }
}

impl<T> IntoFuture for Deferred<T> {
    type Output = Result<T, BowtieError>;
    type IntoFuture = BoxFuture<'static, Result<T, BowtieError>>;

    fn into_future(self) -> Self::IntoFuture {
        self.future
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Deferred")
    }
}

/// Handle to a spawned [`Deferred`]. Awaiting it yields the call's result.
pub struct DeferredHandle<T> {
    task: JoinHandle<Result<T, BowtieError>>,
}

impl<T> DeferredHandle<T> {
    /// Aborts the call. Awaiting the handle afterwards yields
    /// [`BowtieError::Cancelled`] unless the call had already finished.
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T> Future for DeferredHandle<T> {
    type Output = Result<T, BowtieError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.task).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(error)) if error.is_panic() => {
                std::panic::resume_unwind(error.into_panic())
            }
            Poll::Ready(Err(_)) => Poll::Ready(Err(BowtieError::Cancelled)),
        }
    }
}

impl<T> Drop for DeferredHandle<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl<T> fmt::Debug for DeferredHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredHandle")
            .field("finished", &self.task.is_finished())
            .finish()
    }
}
