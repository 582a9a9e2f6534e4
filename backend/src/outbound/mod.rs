//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed user repository and migrations using
//!   Diesel ORM
//! - **queue**: the durable `email_jobs` queue on the same pool
//! - **security**: Argon2 hashing, JWT session tokens, password generation
//! - **mail**: SMTP delivery via `lettre`
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod mail;
pub mod persistence;
pub mod queue;
pub mod security;
