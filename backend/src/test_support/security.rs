//! Fast, deterministic stand-ins for the hashing and password generation
//! adapters.

use std::sync::Mutex;

use crate::domain::ports::{PasswordGenerator, PasswordHasher, PasswordHasherError};
use crate::domain::{PasswordHash, TemporaryPassword};

use super::lock;

const PREFIX: &str = "plain:";

/// Stores passwords as `plain:<password>`. Never use outside tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainPasswordHasher;

impl PasswordHasher for PlainPasswordHasher {
    fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHasherError> {
        Ok(PasswordHash::new(format!("{PREFIX}{password}")))
    }

    fn verify(&self, password: &str, hash: &PasswordHash) -> Result<bool, PasswordHasherError> {
        hash.as_str()
            .strip_prefix(PREFIX)
            .map(|stored| stored == password)
            .ok_or_else(|| PasswordHasherError::malformed_hash("missing plain: prefix"))
    }

    fn dummy_hash(&self) -> PasswordHash {
        PasswordHash::new(format!("{PREFIX}\u{0}dummy"))
    }
}

/// Hands out a fixed password and counts how often it was asked.
#[derive(Debug)]
pub struct FixedPasswordGenerator {
    password: String,
    issued: Mutex<usize>,
}

impl FixedPasswordGenerator {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            issued: Mutex::new(0),
        }
    }

    /// Number of passwords generated so far.
    pub fn issued(&self) -> usize {
        *lock(&self.issued)
    }
}

impl PasswordGenerator for FixedPasswordGenerator {
    fn generate(&self) -> TemporaryPassword {
        *lock(&self.issued) += 1;
        TemporaryPassword::new(self.password.clone())
    }
}
