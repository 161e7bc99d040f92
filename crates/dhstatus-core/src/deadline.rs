//! Deadline and interrupt bounds for in-flight work.

use std::future::Future;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::domain::SourceError;

/// Why bounded work stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    DeadlineExceeded,
    Interrupted,
}

impl From<Halt> for SourceError {
    fn from(halt: Halt) -> Self {
        match halt {
            Halt::DeadlineExceeded => SourceError::DeadlineExceeded,
            Halt::Interrupted => SourceError::Cancelled,
        }
    }
}

/// Drive `fut` until it completes, `deadline` passes or `cancel` fires.
///
/// Losing the race drops `fut`, which aborts any request it has in flight.
/// Cancellation is checked first, then the deadline.
pub async fn bounded<F: Future>(
    fut: F,
    deadline: Instant,
    cancel: &CancellationToken,
) -> Result<F::Output, Halt> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Halt::Interrupted),
        _ = tokio::time::sleep_until(deadline) => Err(Halt::DeadlineExceeded),
        out = fut => Ok(out),
    }
}
