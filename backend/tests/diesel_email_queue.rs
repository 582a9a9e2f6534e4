//! `DieselEmailQueue` against embedded PostgreSQL: claim exclusivity,
//! settlement, backoff, and stale-claim recovery on the real `email_jobs`
//! table.

#[path = "support/pg_embed.rs"]
mod pg_embed;

use std::time::Duration;

use rstest::{fixture, rstest};
use uuid::Uuid;

use whenworks::domain::ports::{EmailJobStore, EmailQueue};
use whenworks::domain::{EmailAddress, EmailJob, EmailKind, EmailTemplateData, RetryPolicy};
use whenworks::outbound::queue::DieselEmailQueue;

use pg_embed::{PgFixture, pg_fixture};

struct Db {
    pg: PgFixture,
    queue: DieselEmailQueue,
}

#[fixture]
fn db() -> Option<Db> {
    let pg = pg_fixture()?;
    let queue = DieselEmailQueue::new(pg.pool.clone());
    Some(Db { pg, queue })
}

#[fixture]
fn job() -> EmailJob {
    EmailJob {
        kind: EmailKind::NewUser,
        recipient: EmailAddress::new("ann@example.com").expect("email"),
        template: EmailTemplateData {
            name: "Ann".into(),
            username: "ann".into(),
            password: "Temp0rary123".into(),
        },
        retry: RetryPolicy {
            max_retries: 3,
            timeout_secs: 30,
        },
    }
}

/// Status, stored template password, and last error of one row.
fn row(pg: &PgFixture, id: Uuid) -> (String, Option<String>, Option<String>) {
    let row = pg
        .client()
        .query_one(
            "SELECT status, payload->'template'->>'password', last_error \
             FROM email_jobs WHERE id = $1",
            &[&id],
        )
        .expect("job row");
    (row.get(0), row.get(1), row.get(2))
}

#[rstest]
fn claims_are_exclusive_and_count_attempts(db: Option<Db>, job: EmailJob) {
    let Some(Db { pg, queue }) = db else { return };
    let id = pg.block_on(queue.enqueue(&job)).expect("enqueue");

    let claimed = pg
        .block_on(queue.claim_next())
        .expect("claim")
        .expect("a due job");
    assert_eq!(claimed.id, id);
    assert_eq!(claimed.attempts, 1);
    assert_eq!(claimed.job, job);
    assert!(pg.block_on(queue.claim_next()).expect("claim").is_none());
    assert_eq!(row(&pg, id).0, "running");
}

#[rstest]
fn completed_jobs_drop_the_temporary_password(db: Option<Db>, job: EmailJob) {
    let Some(Db { pg, queue }) = db else { return };
    let id = pg.block_on(queue.enqueue(&job)).expect("enqueue");
    assert_eq!(row(&pg, id).1.as_deref(), Some("Temp0rary123"));
    pg.block_on(queue.claim_next()).expect("claim");

    pg.block_on(queue.complete(id)).expect("complete");

    let (status, password, last_error) = row(&pg, id);
    assert_eq!(status, "succeeded");
    assert_eq!(password.as_deref(), Some(""));
    assert!(last_error.is_none());
}

#[rstest]
fn failed_jobs_keep_the_error_and_drop_the_password(db: Option<Db>, job: EmailJob) {
    let Some(Db { pg, queue }) = db else { return };
    let id = pg.block_on(queue.enqueue(&job)).expect("enqueue");
    pg.block_on(queue.claim_next()).expect("claim");

    pg.block_on(queue.fail(id, "550 mailbox unavailable"))
        .expect("fail");

    let (status, password, last_error) = row(&pg, id);
    assert_eq!(status, "failed");
    assert_eq!(password.as_deref(), Some(""));
    assert_eq!(last_error.as_deref(), Some("550 mailbox unavailable"));
    assert!(pg.block_on(queue.claim_next()).expect("claim").is_none());
}

#[rstest]
fn rescheduled_jobs_wait_out_their_delay(db: Option<Db>, job: EmailJob) {
    let Some(Db { pg, queue }) = db else { return };
    let id = pg.block_on(queue.enqueue(&job)).expect("enqueue");
    pg.block_on(queue.claim_next()).expect("claim");

    pg.block_on(queue.reschedule(id, Duration::from_secs(600), "421 try later"))
        .expect("reschedule");

    let (status, password, last_error) = row(&pg, id);
    assert_eq!(status, "pending");
    assert_eq!(password.as_deref(), Some("Temp0rary123"));
    assert_eq!(last_error.as_deref(), Some("421 try later"));
    assert!(pg.block_on(queue.claim_next()).expect("claim").is_none());
}

#[rstest]
fn due_retries_are_claimed_again(db: Option<Db>, job: EmailJob) {
    let Some(Db { pg, queue }) = db else { return };
    let id = pg.block_on(queue.enqueue(&job)).expect("enqueue");
    pg.block_on(queue.claim_next()).expect("claim");
    pg.block_on(queue.reschedule(id, Duration::ZERO, "421 try later"))
        .expect("reschedule");

    let again = pg
        .block_on(queue.claim_next())
        .expect("claim")
        .expect("due again");
    assert_eq!(again.id, id);
    assert_eq!(again.attempts, 2);
}

#[rstest]
fn stale_claims_return_to_the_queue(db: Option<Db>, job: EmailJob) {
    let Some(Db { pg, queue }) = db else { return };
    let id = pg.block_on(queue.enqueue(&job)).expect("enqueue");
    pg.block_on(queue.claim_next()).expect("claim");
    assert_eq!(
        pg.block_on(queue.release_stale(Duration::ZERO))
            .expect("fresh claim untouched"),
        0
    );

    pg.client()
        .execute(
            "UPDATE email_jobs SET updated_at = now() - interval '1 hour' WHERE id = $1",
            &[&id],
        )
        .expect("age the claim");

    assert_eq!(
        pg.block_on(queue.release_stale(Duration::from_secs(60)))
            .expect("release"),
        1
    );
    assert_eq!(row(&pg, id).0, "pending");
}
