//! Driven port for submitting email jobs to the durable queue.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::EmailJob;

use super::define_port_error;

define_port_error! {
    /// Errors raised while submitting a job.
    pub enum JobDispatchError {
        /// Queue backend could not be reached.
        Unavailable { message: String } => "email queue unavailable: {message}",
        /// Queue backend refused the job.
        Rejected { message: String } => "email queue rejected job: {message}",
    }
}

/// Accepts email jobs for asynchronous delivery.
///
/// Returns once the job is durably stored; delivery happens in the worker.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailQueue: Send + Sync {
    /// Persist `job` and return its queue identifier.
    async fn enqueue(&self, job: &EmailJob) -> Result<Uuid, JobDispatchError>;
}
