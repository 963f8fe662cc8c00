//! Off-thread computation with cooperative cancellation.
//!
//! The engine is pure and CPU-bound, but callers may sit on a UI thread:
//! [`spawn`] runs a computation on a worker thread and hands the result back
//! over a channel. Cancellation is cooperative — the token is checked at
//! every topological step of the sorter and both passes, which is a single
//! atomic load per task. A caller-imposed timeout is expressed purely by
//! cancelling from outside; the algorithm has no internal deadline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use crate::error::EngineError;

/// Shared cancellation flag. Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Running computations bail with
    /// [`EngineError::Cancelled`] at their next topological step.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Handle to a computation running on a worker thread.
pub struct Computation<T> {
    receiver: mpsc::Receiver<T>,
    token: CancellationToken,
}

impl<T> Computation<T> {
    /// Request cancellation of the underlying computation.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// A clone of the token, e.g. to wire into a caller-side timeout.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Block until the computation reports its result.
    ///
    /// `ComputationFailed` means the worker died without reporting (a panic
    /// in the engine — a defect, not bad input).
    pub fn wait(self) -> Result<T, EngineError> {
        self.receiver
            .recv()
            .map_err(|_| EngineError::ComputationFailed)
    }
}

/// Run `f` on a worker thread, passing it a cancellation token.
///
/// The snapshot captured by the closure is immutable for the duration of the
/// computation, so concurrent spawns over the same data are safe.
pub fn spawn<T, F>(f: F) -> Computation<T>
where
    T: Send + 'static,
    F: FnOnce(&CancellationToken) -> T + Send + 'static,
{
    let token = CancellationToken::new();
    let worker_token = token.clone();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let result = f(&worker_token);
        // Receiver may have been dropped; nothing to report to in that case.
        let _ = tx.send(result);
    });

    Computation {
        receiver: rx,
        token,
    }
}
