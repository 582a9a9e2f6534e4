//! Durable job queue adapters.
//!
//! The email queue is backed by the `email_jobs` table on the shared
//! PostgreSQL pool, so a job survives restarts of both the API and the
//! worker.

mod diesel_email_queue;

pub use diesel_email_queue::DieselEmailQueue;
