//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports backed by
//! PostgreSQL through `diesel-async` and a `bb8` pool.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave the outbound layer.
//! - **Typed errors**: database errors are mapped to port error enums;
//!   unique violations are translated by constraint name.
//!
//! # Example
//!
//! ```ignore
//! use whenworks::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/whenworks")).await?;
//! let repo = DieselUserRepository::new(pool);
//! ```

pub(crate) mod diesel_error_mapping;
mod diesel_user_repository;
mod migrations;
pub(crate) mod models;
mod pool;
pub(crate) mod schema;

pub use diesel_user_repository::{DieselUserRepository, EMAIL_CONSTRAINT, USERNAME_CONSTRAINT};
pub use migrations::{MIGRATIONS, MigrationError, migrate, run_pending_migrations};
pub use pool::{DbPool, DeadlineElapsed, PoolConfig, PoolError};
