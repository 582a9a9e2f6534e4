//! In-memory durable queue implementing both the producer and the worker
//! side, with the same claim and settlement rules as the Postgres adapter,
//! including blanking the temporary password of settled jobs.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::ports::{EmailJobStore, EmailJobStoreError, EmailQueue, JobDispatchError};
use crate::domain::{ClaimedEmailJob, EmailJob};

use super::lock;

/// Lifecycle of a stored job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// Snapshot of a stored job for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredJob {
    pub id: Uuid,
    pub job: EmailJob,
    pub status: JobStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
    /// Delays requested by every reschedule, oldest first.
    pub backoffs: Vec<Duration>,
}

#[derive(Debug)]
struct Entry {
    stored: StoredJob,
    run_at: Instant,
}

#[derive(Debug, Default)]
struct State {
    entries: Vec<Entry>,
    unavailable: bool,
}

/// Email queue kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryEmailQueue {
    state: Mutex<State>,
    honour_backoff: bool,
}

impl InMemoryEmailQueue {
    /// Queue that makes rescheduled jobs claimable immediately while still
    /// recording the requested delay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue that keeps rescheduled jobs hidden until their delay passes.
    pub fn with_backoff() -> Self {
        Self {
            honour_backoff: true,
            ..Self::default()
        }
    }

    /// Make `enqueue` fail, as when the database is down.
    pub fn set_unavailable(&self, unavailable: bool) {
        lock(&self.state).unavailable = unavailable;
    }

    /// Every stored job, in insertion order.
    pub fn jobs(&self) -> Vec<StoredJob> {
        lock(&self.state)
            .entries
            .iter()
            .map(|e| e.stored.clone())
            .collect()
    }

    /// Jobs not yet settled.
    pub fn outstanding(&self) -> usize {
        lock(&self.state)
            .entries
            .iter()
            .filter(|e| matches!(e.stored.status, JobStatus::Pending | JobStatus::Running))
            .count()
    }

    fn settle(
        &self,
        id: Uuid,
        apply: impl FnOnce(&mut Entry),
    ) -> Result<(), EmailJobStoreError> {
        let mut state = lock(&self.state);
        let entry = state
            .entries
            .iter_mut()
            .find(|e| e.stored.id == id)
            .ok_or_else(|| EmailJobStoreError::query(format!("unknown job {id}")))?;
        apply(entry);
        if matches!(entry.stored.status, JobStatus::Succeeded | JobStatus::Failed) {
            entry.stored.job.template.password.clear();
        }
        Ok(())
    }
}

#[async_trait]
impl EmailQueue for InMemoryEmailQueue {
    async fn enqueue(&self, job: &EmailJob) -> Result<Uuid, JobDispatchError> {
        let mut state = lock(&self.state);
        if state.unavailable {
            return Err(JobDispatchError::unavailable("queue offline"));
        }
        let id = Uuid::new_v4();
        state.entries.push(Entry {
            stored: StoredJob {
                id,
                job: job.clone(),
                status: JobStatus::Pending,
                attempts: 0,
                last_error: None,
                backoffs: Vec::new(),
            },
            run_at: Instant::now(),
        });
        Ok(id)
    }
}

#[async_trait]
impl EmailJobStore for InMemoryEmailQueue {
    async fn claim_next(&self) -> Result<Option<ClaimedEmailJob>, EmailJobStoreError> {
        let now = Instant::now();
        let mut state = lock(&self.state);
        let next = state
            .entries
            .iter_mut()
            .filter(|e| e.stored.status == JobStatus::Pending && e.run_at <= now)
            .min_by_key(|e| e.run_at);
        Ok(next.map(|entry| {
            entry.stored.status = JobStatus::Running;
            entry.stored.attempts += 1;
            ClaimedEmailJob {
                id: entry.stored.id,
                job: entry.stored.job.clone(),
                attempts: entry.stored.attempts,
            }
        }))
    }

    async fn complete(&self, id: Uuid) -> Result<(), EmailJobStoreError> {
        self.settle(id, |entry| {
            entry.stored.status = JobStatus::Succeeded;
            entry.stored.last_error = None;
        })
    }

    async fn reschedule(
        &self,
        id: Uuid,
        delay: Duration,
        error: &str,
    ) -> Result<(), EmailJobStoreError> {
        let honour_backoff = self.honour_backoff;
        self.settle(id, |entry| {
            entry.stored.status = JobStatus::Pending;
            entry.stored.last_error = Some(error.to_owned());
            entry.stored.backoffs.push(delay);
            entry.run_at = if honour_backoff {
                Instant::now() + delay
            } else {
                Instant::now()
            };
        })
    }

    async fn fail(&self, id: Uuid, error: &str) -> Result<(), EmailJobStoreError> {
        self.settle(id, |entry| {
            entry.stored.status = JobStatus::Failed;
            entry.stored.last_error = Some(error.to_owned());
        })
    }

    async fn release_stale(&self, _grace: Duration) -> Result<u64, EmailJobStoreError> {
        let mut state = lock(&self.state);
        let mut released = 0;
        for entry in state
            .entries
            .iter_mut()
            .filter(|e| e.stored.status == JobStatus::Running)
        {
            entry.stored.status = JobStatus::Pending;
            released += 1;
        }
        Ok(released)
    }
}
