//! Embedded PostgreSQL for the Diesel adapter suites.
//!
//! Every test gets its own migrated temporary database on a cluster shared
//! by the test binary. Where the cluster cannot start, set
//! `SKIP_TEST_CLUSTER=1` to skip these suites instead of failing them.
//!
//! The suites stay synchronous and drive the adapters through a runtime held
//! by the fixture, because the `postgres` client used for raw assertions
//! refuses to run inside a Tokio runtime.

use std::fmt::Display;
use std::future::Future;

use pg_embedded_setup_unpriv::TemporaryDatabase;
use pg_embedded_setup_unpriv::test_support::shared_cluster_handle;
use postgres::{Client, NoTls};
use tokio::runtime::Runtime;

use whenworks::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};

/// A migrated database, a pool on it, and the runtime that drives the pool.
///
/// Field order is drop order: connections close before the database goes.
pub struct PgFixture {
    pub pool: DbPool,
    runtime: Runtime,
    database_url: String,
    _database: TemporaryDatabase,
}

impl PgFixture {
    /// Run an adapter call to completion.
    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    /// Plain client for inspecting rows behind the adapters' backs.
    pub fn client(&self) -> Client {
        Client::connect(&self.database_url, NoTls).expect("raw postgres connection")
    }
}

fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Skip when `SKIP_TEST_CLUSTER` is truthy, otherwise fail loudly.
fn handle_cluster_setup_failure<T>(reason: impl Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}

fn provision() -> Result<PgFixture, String> {
    let cluster = shared_cluster_handle().map_err(|err| format!("shared cluster: {err:?}"))?;
    let database = cluster
        .temporary_database(format!("test_{}", uuid::Uuid::new_v4().simple()))
        .map_err(|err| format!("temporary database: {err:?}"))?;
    let database_url = database.url().to_owned();
    run_pending_migrations(&database_url).map_err(|err| err.to_string())?;

    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let config = PoolConfig {
        max_size: 2,
        ..PoolConfig::new(database_url.as_str())
    };
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;
    Ok(PgFixture {
        pool,
        runtime,
        database_url,
        _database: database,
    })
}

/// Fresh database, or `None` when the cluster is unavailable and skipping
/// was requested.
pub fn pg_fixture() -> Option<PgFixture> {
    match provision() {
        Ok(fixture) => Some(fixture),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}
