//! In-memory adapters for tests.
//!
//! Compiled for unit tests and, behind the `test-support` feature, for the
//! integration suites in `tests/`. Each double implements the same port as
//! its production adapter and keeps enough state for assertions.

mod mail;
mod queue;
mod security;
mod users;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use mail::RecordingMailer;
pub use queue::{InMemoryEmailQueue, JobStatus, StoredJob};
pub use security::{FixedPasswordGenerator, PlainPasswordHasher};
pub use users::InMemoryUserRepository;

/// Lock ignoring poisoning; a panicking test already reports its failure.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
