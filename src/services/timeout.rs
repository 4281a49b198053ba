//! Timeout guard
//!
//! Bounds how long a caller waits for a wrapped call.
//!
//! [`call_with_timeout`] runs a blocking closure on its own thread and stops
//! waiting at the deadline. The thread is never cancelled: on timeout it is
//! detached and keeps running until the closure returns, so repeated
//! timeouts against a hung call accumulate threads. [`call_with_timeout_async`]
//! bounds a future instead and drops it at the deadline, which cancels the
//! work at its next await point.

use crate::utils::error::{helpers::validation_error, GuardResult};
use std::any::Any;
use std::future::Future;
use std::panic;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// The guarded call did not complete within its deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Function call timed out after {:.3}s", .limit.as_secs_f64())]
pub struct Elapsed {
    limit: Duration,
}

impl Elapsed {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    /// The deadline that was exceeded
    pub fn limit(&self) -> Duration {
        self.limit
    }
}

/// Run `f` on a new thread and wait at most `limit` for it.
///
/// Returns the closure's own result when it finishes in time, including its
/// error unchanged. A panic inside the closure is resumed on the calling
/// thread. When the deadline passes first, returns [`Elapsed`] converted
/// into the caller's error type and leaves the thread running detached.
pub fn call_with_timeout<F, T, E>(limit: Duration, f: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<Elapsed> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        // Receiver is gone once the caller timed out
        let _ = tx.send(f());
    });

    match rx.recv_timeout(limit) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            warn!("Guarded call exceeded {:?}, detaching worker thread", limit);
            Err(Elapsed::new(limit).into())
        }
        Err(RecvTimeoutError::Disconnected) => {
            // Sender dropped without sending: the closure panicked
            let payload: Box<dyn Any + Send> = match handle.join() {
                Err(payload) => payload,
                Ok(()) => Box::new("guarded call exited without a result"),
            };
            panic::resume_unwind(payload)
        }
    }
}

/// Await `fut` for at most `limit`, dropping it on timeout.
pub async fn call_with_timeout_async<Fut, T, E>(limit: Duration, fut: Fut) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
    E: From<Elapsed>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            debug!("Guarded future exceeded {:?}, cancelled", limit);
            Err(Elapsed::new(limit).into())
        }
    }
}

/// A validated deadline that can guard both blocking calls and futures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutGuard {
    limit: Duration,
}

impl TimeoutGuard {
    /// Create a guard from a non-zero duration
    pub fn new(limit: Duration) -> GuardResult<Self> {
        if limit.is_zero() {
            return Err(validation_error("Timeout must be greater than zero"));
        }
        Ok(Self { limit })
    }

    /// Create a guard from a number of seconds, which must be positive and finite
    pub fn from_secs_f64(seconds: f64) -> GuardResult<Self> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(validation_error(format!(
                "Timeout must be a positive number of seconds, got {}",
                seconds
            )));
        }
        Self::new(Duration::from_secs_f64(seconds))
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// See [`call_with_timeout`]
    pub fn call<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<Elapsed> + Send + 'static,
    {
        call_with_timeout(self.limit, f)
    }

    /// See [`call_with_timeout_async`]
    pub async fn call_async<Fut, T, E>(&self, fut: Fut) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: From<Elapsed>,
    {
        call_with_timeout_async(self.limit, fut).await
    }
}
