//! Submits transactional email jobs after user-directory writes.
//!
//! The user row is the source of truth: a failed submission is logged and
//! never undoes the write or changes the caller's response.

use std::sync::Arc;

use tracing::{Span, error, info};
use uuid::Uuid;

use crate::domain::ports::EmailQueue;
use crate::domain::{
    EmailJob, EmailKind, EmailTemplateData, RetryPolicy, TemporaryPassword, User,
};

/// Builds email jobs and hands them to the durable queue.
pub struct NotificationDispatcher<Q> {
    queue: Arc<Q>,
    retry: RetryPolicy,
    span: Span,
}

impl<Q> NotificationDispatcher<Q> {
    /// Create a dispatcher applying `retry` to every job.
    pub fn new(queue: Arc<Q>, retry: RetryPolicy, span: Span) -> Self {
        Self { queue, retry, span }
    }

    fn build_job(&self, kind: EmailKind, user: &User, password: &TemporaryPassword) -> EmailJob {
        EmailJob {
            kind,
            recipient: user.email().clone(),
            template: EmailTemplateData {
                name: user.name().as_str().to_owned(),
                username: user.username().as_str().to_owned(),
                password: password.expose().to_owned(),
            },
            retry: self.retry,
        }
    }
}

impl<Q: EmailQueue> NotificationDispatcher<Q> {
    /// Queue an email of `kind` for `user`. Returns the job id when the queue
    /// accepted it.
    pub async fn dispatch(
        &self,
        kind: EmailKind,
        user: &User,
        password: &TemporaryPassword,
    ) -> Option<Uuid> {
        let job = self.build_job(kind, user, password);
        match self.queue.enqueue(&job).await {
            Ok(job_id) => {
                self.span.in_scope(|| {
                    info!(%job_id, %kind, user_id = %user.id(), "email job queued");
                });
                Some(job_id)
            }
            Err(err) => {
                self.span.in_scope(|| {
                    error!(error = %err, %kind, user_id = %user.id(), "failed to queue email job");
                });
                None
            }
        }
    }
}
