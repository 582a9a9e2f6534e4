//! Email worker orchestration: claim, deliver, settle.
//!
//! The worker owns a bounded pool of in-flight deliveries. A semaphore permit
//! is taken before each claim, so the store is only asked for work when a
//! slot is free. Shutdown stops claiming and then drains the pool for at most
//! the configured timeout; anything still running afterwards is aborted and
//! recovered by the stale-claim sweep on the next start.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, watch};
use tokio::task::JoinSet;
use tracing::{Instrument, Span, error, info, warn};

use crate::domain::ports::{EmailJobStore, EmailJobStoreError, Mailer};
use crate::domain::{ClaimedEmailJob, EmailDelivery, FailureDisposition};

/// Extra time a running claim may live beyond its job timeout before it is
/// considered abandoned.
pub const STALE_CLAIM_GRACE: Duration = Duration::from_secs(60);

/// Pool sizing and pacing for [`EmailWorker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmailWorkerConfig {
    /// Maximum deliveries in flight.
    pub concurrency: usize,
    /// Idle delay between claims when the queue is empty.
    pub poll_interval: Duration,
    /// Upper bound on the drain after shutdown is requested.
    pub shutdown_timeout: Duration,
}

impl Default for EmailWorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            poll_interval: Duration::from_millis(500),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// How a claimed job was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// Delivered and marked succeeded.
    Sent,
    /// Delivery failed; the job is due again after the delay.
    Rescheduled(Duration),
    /// Delivery failed with the retry budget exhausted.
    Failed,
}

/// Result of the shutdown drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// Deliveries aborted because the drain timed out.
    pub abandoned: usize,
}

/// Polls the job store and delivers claimed jobs with bounded concurrency.
pub struct EmailWorker<S, M> {
    store: Arc<S>,
    delivery: Arc<EmailDelivery<M>>,
    config: EmailWorkerConfig,
    span: Span,
}

impl<S, M> EmailWorker<S, M>
where
    S: EmailJobStore + 'static,
    M: Mailer + 'static,
{
    /// Create a worker. Events are recorded inside `span`.
    pub fn new(
        store: Arc<S>,
        delivery: Arc<EmailDelivery<M>>,
        config: EmailWorkerConfig,
        span: Span,
    ) -> Self {
        Self {
            store,
            delivery,
            config,
            span,
        }
    }

    /// Run until `shutdown` flips to `true` (or its sender is dropped), then
    /// drain in-flight deliveries.
    ///
    /// # Errors
    /// Fails only when the start-up stale-claim sweep cannot reach the store.
    pub async fn run(
        &self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<DrainReport, EmailJobStoreError> {
        let released = self
            .store
            .release_stale(STALE_CLAIM_GRACE)
            .instrument(self.span.clone())
            .await?;
        self.span.in_scope(|| {
            info!(
                released,
                concurrency = self.config.concurrency,
                "email worker started"
            );
        });

        let slots = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut in_flight = JoinSet::new();

        loop {
            self.reap_finished(&mut in_flight);
            if *shutdown.borrow() {
                break;
            }
            let permit = tokio::select! {
                permit = Arc::clone(&slots).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
                _ = shutdown.changed() => break,
            };
            match self.store.claim_next().await {
                Ok(Some(claimed)) => self.spawn_delivery(&mut in_flight, claimed, permit),
                Ok(None) => {
                    drop(permit);
                    if self.idle(&mut shutdown).await {
                        break;
                    }
                }
                Err(EmailJobStoreError::Decode { id, message }) => {
                    drop(permit);
                    self.span.in_scope(|| {
                        error!(job_id = %id, error = %message, "email job payload is invalid");
                    });
                    if let Err(err) = self.store.fail(id, &message).await {
                        self.span.in_scope(|| {
                            error!(job_id = %id, error = %err, "failed to mark job failed");
                        });
                    }
                }
                Err(err) => {
                    drop(permit);
                    self.span.in_scope(|| warn!(error = %err, "failed to claim email job"));
                    if self.idle(&mut shutdown).await {
                        break;
                    }
                }
            }
        }

        Ok(self.drain(in_flight).await)
    }

    /// Deliver and settle one claimed job.
    pub async fn process(&self, claimed: ClaimedEmailJob) -> JobOutcome {
        settle(
            Arc::clone(&self.store),
            Arc::clone(&self.delivery),
            claimed,
        )
        .instrument(self.span.clone())
        .await
    }

    fn spawn_delivery(
        &self,
        in_flight: &mut JoinSet<JobOutcome>,
        claimed: ClaimedEmailJob,
        permit: OwnedSemaphorePermit,
    ) {
        let store = Arc::clone(&self.store);
        let delivery = Arc::clone(&self.delivery);
        in_flight.spawn(
            async move {
                let outcome = settle(store, delivery, claimed).await;
                drop(permit);
                outcome
            }
            .instrument(self.span.clone()),
        );
    }

    fn reap_finished(&self, in_flight: &mut JoinSet<JobOutcome>) {
        while let Some(joined) = in_flight.try_join_next() {
            if let Err(err) = joined {
                self.span
                    .in_scope(|| error!(error = %err, "email delivery task panicked"));
            }
        }
    }

    /// Sleep for the poll interval. Returns `true` when shutdown was requested
    /// meanwhile.
    async fn idle(&self, shutdown: &mut watch::Receiver<bool>) -> bool {
        tokio::select! {
            () = tokio::time::sleep(self.config.poll_interval) => false,
            _ = shutdown.changed() => true,
        }
    }

    async fn drain(&self, mut in_flight: JoinSet<JobOutcome>) -> DrainReport {
        let pending = in_flight.len();
        self.span
            .in_scope(|| info!(pending, "email worker draining in-flight jobs"));
        let drained = tokio::time::timeout(self.config.shutdown_timeout, async {
            while in_flight.join_next().await.is_some() {}
        })
        .await;
        let abandoned = if drained.is_ok() {
            0
        } else {
            let remaining = in_flight.len();
            in_flight.abort_all();
            self.span.in_scope(|| {
                warn!(
                    abandoned = remaining,
                    "drain timed out; aborted jobs return on the next start"
                );
            });
            remaining
        };
        self.span.in_scope(|| info!("email worker stopped"));
        DrainReport { abandoned }
    }
}

async fn settle<S, M>(
    store: Arc<S>,
    delivery: Arc<EmailDelivery<M>>,
    claimed: ClaimedEmailJob,
) -> JobOutcome
where
    S: EmailJobStore,
    M: Mailer,
{
    let id = claimed.id;
    let kind = claimed.job.kind;
    let attempts = claimed.attempts;
    let (outcome, settled) = match delivery.deliver(&claimed.job).await {
        Ok(()) => (JobOutcome::Sent, store.complete(id).await),
        Err(err) => {
            let message = err.to_string();
            match claimed.disposition_after_failure() {
                FailureDisposition::Retry(delay) => {
                    warn!(job_id = %id, %kind, attempts, error = %message, retry_in = ?delay,
                        "email delivery failed; retrying");
                    (
                        JobOutcome::Rescheduled(delay),
                        store.reschedule(id, delay, &message).await,
                    )
                }
                FailureDisposition::GiveUp => {
                    error!(job_id = %id, %kind, attempts, error = %message,
                        "email delivery failed permanently");
                    (JobOutcome::Failed, store.fail(id, &message).await)
                }
            }
        }
    };
    if let Err(err) = settled {
        error!(job_id = %id, error = %err, "failed to record email job outcome");
    }
    outcome
}
