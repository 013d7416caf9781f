//! Cancellation and deadline propagation for queue operations.
//!
//! A [`Context`] pairs a [`CancellationToken`] with an optional deadline. The
//! pool hands child contexts to its loops and to every `Worker::work` call, so
//! cancelling the context passed to `run` reaches all of them.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::core::error::{JobQueueError, JobResult};

/// Cancellation token plus optional deadline.
///
/// Cloning shares the same token; use [`Context::child`] for a context that
/// can be cancelled independently of its parent.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never done until explicitly cancelled.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Wrap an existing token.
    #[must_use]
    pub const fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Child context that expires after `timeout`.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Child context that expires at `deadline`, or earlier if the parent does.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Child context cancelled with its parent, cancellable on its own.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancel this context and all of its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The underlying cancellation token.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the context is done, or `None` while it is still live.
    #[must_use]
    pub fn err(&self) -> Option<JobQueueError> {
        if self.token.is_cancelled() {
            return Some(JobQueueError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(JobQueueError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Whether the context is cancelled or past its deadline.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Fail fast if the context is done.
    ///
    /// # Errors
    ///
    /// Returns [`JobQueueError::Cancelled`] or [`JobQueueError::DeadlineExceeded`].
    pub fn check(&self) -> JobResult<()> {
        self.err().map_or(Ok(()), Err)
    }

    /// Resolve once the context is cancelled or its deadline passes.
    ///
    /// Returns the same error [`Context::err`] would report.
    pub async fn done(&self) -> JobQueueError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    () = self.token.cancelled() => JobQueueError::Cancelled,
                    () = tokio::time::sleep_until(deadline) => JobQueueError::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                JobQueueError::Cancelled
            }
        }
    }
}
