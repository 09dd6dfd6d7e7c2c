//! Per-operation deadline shared by every sub-task of one logical operation.
//!
//! Handlers create one [`Deadline`] per request from the configured budget and
//! hand it to the domain service, which bounds every store read, external call
//! and spawned task with it. Expiry drops the bounded future, which cancels any
//! in-flight I/O it owned.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use super::Error;

/// Budget used when no explicit deadline is configured.
pub const DEFAULT_OPERATION_BUDGET: Duration = Duration::from_secs(3);

/// Longest budget a deadline honours; larger budgets are clamped to it.
pub const MAX_OPERATION_BUDGET: Duration = Duration::from_secs(86_400 * 365);

/// Absolute point in time by which an operation must complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline(Instant);

/// Raised when a bounded future did not finish before its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation deadline exceeded")]
pub struct DeadlineExceeded;

impl Deadline {
    /// Deadline `budget` from now, clamped to [`MAX_OPERATION_BUDGET`].
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use meetup_backend::domain::Deadline;
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let deadline = Deadline::after(Duration::from_millis(50));
    /// let value = deadline.run(async { 7 }).await.expect("fast future");
    /// assert_eq!(value, 7);
    /// # });
    /// ```
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        let now = Instant::now();
        let budget = budget.min(MAX_OPERATION_BUDGET);
        Self(now.checked_add(budget).unwrap_or(now + DEFAULT_OPERATION_BUDGET))
    }

    /// Underlying tokio instant.
    #[must_use]
    pub fn instant(&self) -> Instant {
        self.0
    }

    /// Time left before expiry, saturating at zero.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.0.saturating_duration_since(Instant::now())
    }

    /// Whether the deadline has already passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.0
    }

    /// Drive `fut` to completion or give up at the deadline.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, DeadlineExceeded>
    where
        F: Future,
    {
        tokio::time::timeout_at(self.0, fut)
            .await
            .map_err(|_| DeadlineExceeded)
    }
}

impl From<DeadlineExceeded> for Error {
    fn from(_: DeadlineExceeded) -> Self {
        Self::service_unavailable("operation deadline exceeded")
    }
}
