//! Delivery of a single email job: render, then send within the job's
//! deadline.

use std::sync::Arc;

use tracing::{Span, info};

use crate::domain::ports::{Mailer, MailerError, OutgoingEmail};
use crate::domain::{EmailJob, render_email};

/// Why a delivery attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The mail transport reported an error.
    #[error(transparent)]
    Mailer(#[from] MailerError),
    /// Sending did not finish within the job timeout.
    #[error("email delivery timed out after {secs}s")]
    TimedOut {
        /// Deadline that elapsed.
        secs: u64,
    },
}

/// Renders jobs and hands them to a [`Mailer`].
pub struct EmailDelivery<M> {
    mailer: Arc<M>,
    span: Span,
}

impl<M: Mailer> EmailDelivery<M> {
    /// Create the delivery service. Events are recorded inside `span`.
    pub fn new(mailer: Arc<M>, span: Span) -> Self {
        Self { mailer, span }
    }

    /// Render and send `job`, bounded by its retry policy timeout.
    pub async fn deliver(&self, job: &EmailJob) -> Result<(), DeliveryError> {
        let rendered = render_email(job.kind, &job.template);
        let email = OutgoingEmail {
            to: job.recipient.clone(),
            subject: rendered.subject.to_owned(),
            html_body: rendered.html_body,
        };
        let timeout = job.retry.timeout();
        tokio::time::timeout(timeout, self.mailer.send(&email))
            .await
            .map_err(|_| DeliveryError::TimedOut {
                secs: job.retry.timeout_secs,
            })??;
        self.span.in_scope(|| {
            info!(kind = %job.kind, recipient = %job.recipient, "email sent");
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::MockMailer;
    use crate::domain::{EmailAddress, EmailKind, EmailTemplateData, RetryPolicy};
    use rstest::{fixture, rstest};

    #[fixture]
    fn job() -> EmailJob {
        EmailJob {
            kind: EmailKind::NewUser,
            recipient: EmailAddress::new("a@x.com").expect("email"),
            template: EmailTemplateData {
                name: "Ada".into(),
                username: "ada".into(),
                password: "Abc123Xyz789".into(),
            },
            retry: RetryPolicy {
                max_retries: 1,
                timeout_secs: 5,
            },
        }
    }

    #[rstest]
    #[tokio::test]
    async fn sends_rendered_template(job: EmailJob) {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|email| {
                email.to.as_str() == "a@x.com"
                    && email.subject == "Welcome to WhenWorks"
                    && email.html_body.contains("Abc123Xyz789")
            })
            .times(1)
            .returning(|_| Ok(()));

        EmailDelivery::new(Arc::new(mailer), Span::none())
            .deliver(&job)
            .await
            .expect("delivered");
    }

    #[rstest]
    #[tokio::test]
    async fn propagates_transport_errors(job: EmailJob) {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .returning(|_| Err(MailerError::transport("connection reset")));

        let err = EmailDelivery::new(Arc::new(mailer), Span::none())
            .deliver(&job)
            .await
            .expect_err("transport failure");
        assert_eq!(
            err,
            DeliveryError::Mailer(MailerError::transport("connection reset"))
        );
    }
}
