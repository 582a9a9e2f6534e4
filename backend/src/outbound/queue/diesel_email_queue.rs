//! PostgreSQL-backed email job queue.
//!
//! Jobs are rows in `email_jobs`. The API inserts them through
//! [`EmailQueue`]; workers claim them with `FOR UPDATE SKIP LOCKED` so that
//! concurrent workers never receive the same job. Settling a job as
//! succeeded or failed blanks the temporary password in its payload.

use std::time::Duration;

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::sql_types::{Double, Text, Uuid as SqlUuid};
use diesel_async::RunQueryDsl;
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::{EmailJobStore, EmailJobStoreError, EmailQueue, JobDispatchError};
use crate::domain::{ClaimedEmailJob, EmailJob};
use crate::outbound::persistence::diesel_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error,
};
use crate::outbound::persistence::models::{ClaimedJobRow, NewEmailJobRow};
use crate::outbound::persistence::schema::email_jobs;
use crate::outbound::persistence::{DbPool, PoolError};

const CLAIM_NEXT_SQL: &str = "\
UPDATE email_jobs
SET status = 'running', attempts = attempts + 1, updated_at = now()
WHERE id = (
    SELECT id FROM email_jobs
    WHERE status = 'pending' AND run_at <= now()
    ORDER BY run_at, created_at
    FOR UPDATE SKIP LOCKED
    LIMIT 1
)
RETURNING id, payload, attempts";

// Terminal updates blank `template.password`; the row is never claimed again.
const COMPLETE_SQL: &str = "\
UPDATE email_jobs
SET status = 'succeeded', last_error = NULL, updated_at = now(),
    payload = jsonb_set(payload, '{template,password}', '\"\"')
WHERE id = $1";

const RESCHEDULE_SQL: &str = "\
UPDATE email_jobs
SET status = 'pending', run_at = now() + make_interval(secs => $2), last_error = $3,
    updated_at = now()
WHERE id = $1";

const FAIL_SQL: &str = "\
UPDATE email_jobs
SET status = 'failed', last_error = $2, updated_at = now(),
    payload = jsonb_set(payload, '{template,password}', '\"\"')
WHERE id = $1";

const RELEASE_STALE_SQL: &str = "\
UPDATE email_jobs
SET status = 'pending', updated_at = now()
WHERE status = 'running'
  AND updated_at < now() - make_interval(secs => timeout_secs + $1)";

/// Diesel-backed durable email queue.
#[derive(Clone)]
pub struct DieselEmailQueue {
    pool: DbPool,
}

impl DieselEmailQueue {
    /// Create a queue over the shared connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn execute_update(
        &self,
        query: BoxedSqlQuery<'_, Pg, SqlQuery>,
    ) -> Result<usize, EmailJobStoreError> {
        let mut conn = self.pool.get().await.map_err(map_store_pool_error)?;
        query.execute(&mut conn).await.map_err(map_store_diesel_error)
    }
}

fn map_dispatch_pool_error(error: PoolError) -> JobDispatchError {
    map_basic_pool_error(error, JobDispatchError::unavailable)
}

fn map_dispatch_diesel_error(error: diesel::result::Error) -> JobDispatchError {
    map_basic_diesel_error(
        error,
        JobDispatchError::rejected,
        JobDispatchError::unavailable,
    )
}

fn map_store_pool_error(error: PoolError) -> EmailJobStoreError {
    map_basic_pool_error(error, EmailJobStoreError::connection)
}

fn map_store_diesel_error(error: diesel::result::Error) -> EmailJobStoreError {
    map_basic_diesel_error(
        error,
        EmailJobStoreError::query,
        EmailJobStoreError::connection,
    )
}

fn clamp_to_i32<T: TryInto<i32>>(value: T) -> i32 {
    value.try_into().unwrap_or(i32::MAX)
}

/// Decode a claimed row into the domain job.
fn decode_claimed(row: ClaimedJobRow) -> Result<ClaimedEmailJob, EmailJobStoreError> {
    let job: EmailJob = serde_json::from_value(row.payload)
        .map_err(|err| EmailJobStoreError::decode(row.id, err.to_string()))?;
    Ok(ClaimedEmailJob {
        id: row.id,
        job,
        attempts: u32::try_from(row.attempts).unwrap_or(0),
    })
}

#[async_trait]
impl EmailQueue for DieselEmailQueue {
    async fn enqueue(&self, job: &EmailJob) -> Result<Uuid, JobDispatchError> {
        let payload = serde_json::to_value(job)
            .map_err(|err| JobDispatchError::rejected(format!("unserialisable job: {err}")))?;
        let row = NewEmailJobRow {
            kind: job.kind.as_str(),
            payload,
            max_retries: clamp_to_i32(job.retry.max_retries),
            timeout_secs: clamp_to_i32(job.retry.timeout_secs),
        };
        let mut conn = self.pool.get().await.map_err(map_dispatch_pool_error)?;
        diesel::insert_into(email_jobs::table)
            .values(&row)
            .returning(email_jobs::id)
            .get_result::<Uuid>(&mut conn)
            .await
            .map_err(map_dispatch_diesel_error)
    }
}

#[async_trait]
impl EmailJobStore for DieselEmailQueue {
    async fn claim_next(&self) -> Result<Option<ClaimedEmailJob>, EmailJobStoreError> {
        let mut conn = self.pool.get().await.map_err(map_store_pool_error)?;
        let row = diesel::sql_query(CLAIM_NEXT_SQL)
            .get_result::<ClaimedJobRow>(&mut conn)
            .await
            .optional()
            .map_err(map_store_diesel_error)?;
        row.map(decode_claimed).transpose()
    }

    async fn complete(&self, id: Uuid) -> Result<(), EmailJobStoreError> {
        let query = diesel::sql_query(COMPLETE_SQL)
            .into_boxed()
            .bind::<SqlUuid, _>(id);
        self.execute_update(query).await.map(|_| ())
    }

    async fn reschedule(
        &self,
        id: Uuid,
        delay: Duration,
        error: &str,
    ) -> Result<(), EmailJobStoreError> {
        let query = diesel::sql_query(RESCHEDULE_SQL)
            .into_boxed()
            .bind::<SqlUuid, _>(id)
            .bind::<Double, _>(delay.as_secs_f64())
            .bind::<Text, _>(error.to_owned());
        self.execute_update(query).await.map(|_| ())
    }

    async fn fail(&self, id: Uuid, error: &str) -> Result<(), EmailJobStoreError> {
        let query = diesel::sql_query(FAIL_SQL)
            .into_boxed()
            .bind::<SqlUuid, _>(id)
            .bind::<Text, _>(error.to_owned());
        self.execute_update(query).await.map(|_| ())
    }

    async fn release_stale(&self, grace: Duration) -> Result<u64, EmailJobStoreError> {
        let query = diesel::sql_query(RELEASE_STALE_SQL)
            .into_boxed()
            .bind::<Double, _>(grace.as_secs_f64());
        let released = self.execute_update(query).await?;
        if released > 0 {
            warn!(released, "returned stale email job claims to the queue");
        }
        Ok(u64::try_from(released).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{EmailAddress, EmailKind, EmailTemplateData, RetryPolicy};
    use rstest::rstest;

    fn job_value() -> serde_json::Value {
        serde_json::to_value(EmailJob {
            kind: EmailKind::PasswordReset,
            recipient: EmailAddress::new("a@x.com").expect("email"),
            template: EmailTemplateData {
                name: "A".into(),
                username: "a".into(),
                password: "p".into(),
            },
            retry: RetryPolicy {
                max_retries: 3,
                timeout_secs: 30,
            },
        })
        .expect("serialise job")
    }

    #[rstest]
    fn claimed_rows_decode_into_jobs() {
        let id = Uuid::new_v4();
        let claimed = decode_claimed(ClaimedJobRow {
            id,
            payload: job_value(),
            attempts: 2,
        })
        .expect("decodes");
        assert_eq!(claimed.id, id);
        assert_eq!(claimed.attempts, 2);
        assert_eq!(claimed.job.kind, EmailKind::PasswordReset);
    }

    #[rstest]
    fn malformed_payloads_report_the_job_id() {
        let id = Uuid::new_v4();
        let err = decode_claimed(ClaimedJobRow {
            id,
            payload: serde_json::json!({"kind": "email:unknown"}),
            attempts: 1,
        })
        .expect_err("invalid payload");
        assert!(matches!(err, EmailJobStoreError::Decode { id: failed, .. } if failed == id));
    }

    #[rstest]
    #[case(5_u64, 5)]
    #[case(u64::MAX, i32::MAX)]
    fn retry_values_are_clamped(#[case] input: u64, #[case] expected: i32) {
        assert_eq!(clamp_to_i32(input), expected);
    }
}
