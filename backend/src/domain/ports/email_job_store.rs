//! Driven port used by the worker to claim and settle email jobs.

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::ClaimedEmailJob;

use super::define_port_error;

define_port_error! {
    /// Errors raised by the job store.
    pub enum EmailJobStoreError {
        /// Store connection could not be established.
        Connection { message: String } => "email job store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "email job store query failed: {message}",
        /// Stored payload could not be decoded.
        Decode { id: Uuid, message: String } => "email job {id} has an invalid payload: {message}",
    }
}

/// Claiming and settling of queued email jobs.
///
/// Claims are exclusive: two workers never hold the same job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailJobStore: Send + Sync {
    /// Claim the oldest due pending job, marking it running and incrementing
    /// its attempt counter.
    async fn claim_next(&self) -> Result<Option<ClaimedEmailJob>, EmailJobStoreError>;

    /// Mark a job delivered.
    async fn complete(&self, id: Uuid) -> Result<(), EmailJobStoreError>;

    /// Return a job to pending, due after `delay`.
    async fn reschedule(
        &self,
        id: Uuid,
        delay: Duration,
        error: &str,
    ) -> Result<(), EmailJobStoreError>;

    /// Mark a job permanently failed.
    async fn fail(&self, id: Uuid, error: &str) -> Result<(), EmailJobStoreError>;

    /// Return running jobs whose claim outlived their timeout plus `grace` to
    /// pending. Yields the number of recovered jobs.
    async fn release_stale(&self, grace: Duration) -> Result<u64, EmailJobStoreError>;
}
