//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{Int4, Jsonb, Uuid as SqlUuid};
use uuid::Uuid;

use super::schema::{email_jobs, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub name: &'a str,
    pub password_hash: &'a str,
    pub is_admin: bool,
}

/// Changeset for the mutable profile columns. `None` leaves a column as is.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserUpdate<'a> {
    pub email: Option<&'a str>,
    pub name: Option<&'a str>,
    pub is_admin: Option<bool>,
}

/// Insertable struct for queueing an email job.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = email_jobs)]
pub(crate) struct NewEmailJobRow<'a> {
    pub kind: &'a str,
    pub payload: serde_json::Value,
    pub max_retries: i32,
    pub timeout_secs: i32,
}

/// Row returned by the raw-SQL claim statement.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct ClaimedJobRow {
    #[diesel(sql_type = SqlUuid)]
    pub id: Uuid,
    #[diesel(sql_type = Jsonb)]
    pub payload: serde_json::Value,
    #[diesel(sql_type = Int4)]
    pub attempts: i32,
}
