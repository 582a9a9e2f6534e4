//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the migrations under `backend/migrations`.

diesel::table! {
    /// User accounts.
    ///
    /// `username` and `email` carry the `users_username_key` and
    /// `users_email_key` unique constraints.
    users (id) {
        /// Primary key, generated by the database.
        id -> Uuid,
        /// Unique login name.
        username -> Varchar,
        /// Unique email address.
        email -> Varchar,
        /// Display name.
        name -> Varchar,
        /// Argon2id PHC string.
        password_hash -> Text,
        /// Administrator flag.
        is_admin -> Bool,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Durable email job queue.
    email_jobs (id) {
        id -> Uuid,
        /// Job tag such as `email:new_user`.
        kind -> Varchar,
        /// Serialised job body.
        payload -> Jsonb,
        /// One of `pending`, `running`, `succeeded`, `failed`.
        status -> Varchar,
        attempts -> Int4,
        max_retries -> Int4,
        timeout_secs -> Int4,
        /// Earliest time the job may be claimed.
        run_at -> Timestamptz,
        last_error -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(users, email_jobs);
