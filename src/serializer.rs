//! # Call-Coalescing Serializer
//!
//! A [`Serializer`] wraps a zero-argument asynchronous operation so that at
//! most one execution of it is in flight at any time. Callers that arrive
//! while a run is active do not each trigger a new run: they all share a
//! single trailing run that starts as soon as the active one settles.
//!
//! ## Run States
//!
//! ```text
//!   invoke()            state before            action
//!   ─────────────────────────────────────────────────────────────────────
//!                       idle                    start now, becomes current
//!                       current                 queue trailing run (pending)
//!                       current + pending       hand out the pending handle
//!
//!   run settles         current + pending       pending is promoted to current
//!                       current                 back to idle
//! ```
//!
//! The trailing run always starts once the current run settles, whether that
//! run succeeded, failed or panicked. Its outcome is delivered only to the
//! callers holding its handle.
//!
//! Runs are spawned onto the Tokio runtime at `invoke()` time, so they make
//! progress (and settle) even if every handle is dropped.
//!
//! ## Example
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use stagehand::serializer::Serializer;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let builds = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&builds);
//! let rebuild = Serializer::new("rebuild", move || {
//!     let counter = Arc::clone(&counter);
//!     async move { Ok(counter.fetch_add(1, Ordering::SeqCst) + 1) }
//! });
//!
//! assert_eq!(rebuild.invoke().await.unwrap(), 1);
//! assert_eq!(rebuild.invoke().await.unwrap(), 2);
//! # }
//! ```

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use futures::future::{BoxFuture, FutureExt, Shared};
use log::{trace, warn};

use crate::error::{Error, Result};

/// Outcome of a serialized run, shared by every caller awaiting it.
pub type RunResult<T> = std::result::Result<T, Arc<Error>>;

type Operation<T> = Box<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// Completion handle for one run of a serialized operation.
///
/// Handles are cheap to clone; every clone resolves to the same outcome.
pub struct RunHandle<T> {
    run: Shared<BoxFuture<'static, RunResult<T>>>,
}

impl<T> RunHandle<T> {
    /// Returns `true` if both handles refer to the same run.
    pub fn ptr_eq(&self, other: &RunHandle<T>) -> bool {
        self.run.ptr_eq(&other.run)
    }
}

impl<T> Clone for RunHandle<T> {
    fn clone(&self) -> Self {
        Self {
            run: self.run.clone(),
        }
    }
}

impl<T> fmt::Debug for RunHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunHandle").finish_non_exhaustive()
    }
}

impl<T: Clone> Future for RunHandle<T> {
    type Output = RunResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.run.poll_unpin(cx)
    }
}

struct RunState<T> {
    current: Option<RunHandle<T>>,
    pending: Option<RunHandle<T>>,
}

struct Inner<T> {
    name: String,
    operation: Operation<T>,
    state: Mutex<RunState<T>>,
    runs_started: AtomicU64,
}

/// Guards an asynchronous operation so that at most one run is in flight
/// and concurrent requests coalesce into one trailing run.
pub struct Serializer<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Serializer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Serializer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serializer")
            .field("name", &self.inner.name)
            .field(
                "runs_started",
                &self.inner.runs_started.load(Ordering::SeqCst),
            )
            .finish_non_exhaustive()
    }
}

impl<T> Serializer<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Wrap `operation`. The name is used in log lines and in the
    /// `Error::Operation` produced when a run panics.
    pub fn new<F, Fut>(name: impl Into<String>, operation: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                operation: Box::new(move || operation().boxed()),
                state: Mutex::new(RunState {
                    current: None,
                    pending: None,
                }),
                runs_started: AtomicU64::new(0),
            }),
        }
    }

    /// Request a run of the operation.
    ///
    /// Returns immediately with a handle for either a run started right now
    /// (when idle) or the single trailing run queued behind the active one.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn invoke(&self) -> RunHandle<T> {
        let mut state = self.inner.lock_state();

        if let Some(pending) = &state.pending {
            trace!("{}: joining pending run", self.inner.name);
            return pending.clone();
        }

        let handle = match state.current.clone() {
            None => {
                let handle = Inner::schedule(&self.inner, None);
                state.current = Some(handle.clone());
                handle
            }
            Some(current) => {
                trace!("{}: run active, queueing trailing run", self.inner.name);
                let handle = Inner::schedule(&self.inner, Some(current));
                state.pending = Some(handle.clone());
                handle
            }
        };
        drop(state);

        tokio::spawn(handle.clone().map(drop));
        handle
    }

    /// Name given at construction.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Whether a run is currently in flight.
    pub fn is_running(&self) -> bool {
        self.inner.lock_state().current.is_some()
    }

    /// Whether a trailing run is queued behind the current one.
    pub fn has_pending(&self) -> bool {
        self.inner.lock_state().pending.is_some()
    }

    /// Number of executions of the operation started so far.
    pub fn runs_started(&self) -> u64 {
        self.inner.runs_started.load(Ordering::SeqCst)
    }
}

impl<T> Inner<T>
where
    T: Clone + Send + Sync + 'static,
{
    // The critical sections below never panic, so a poisoned lock still
    // holds consistent state.
    fn lock_state(&self) -> MutexGuard<'_, RunState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Build the handle for a run that starts once `after` has settled.
    fn schedule(inner: &Arc<Self>, after: Option<RunHandle<T>>) -> RunHandle<T> {
        let inner = Arc::clone(inner);
        let run = async move {
            if let Some(previous) = after {
                // The previous outcome belongs to the previous run's callers.
                let _ = previous.await;
            }
            inner.execute().await
        }
        .boxed()
        .shared();

        RunHandle { run }
    }

    async fn execute(&self) -> RunResult<T> {
        let run = self.runs_started.fetch_add(1, Ordering::SeqCst) + 1;
        trace!("{}: run {} started", self.name, run);

        let outcome = AssertUnwindSafe(async { (self.operation)().await })
            .catch_unwind()
            .await;

        self.promote();
        trace!("{}: run {} settled", self.name, run);

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                warn!("{}: run {} failed: {}", self.name, run, err);
                Err(Arc::new(err))
            }
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic payload".to_string());
                warn!("{}: run {} panicked: {}", self.name, run, message);
                Err(Arc::new(Error::operation(
                    &self.name,
                    format!("panicked: {}", message),
                )))
            }
        }
    }

    fn promote(&self) {
        let mut state = self.lock_state();
        state.current = state.pending.take();
    }
}
