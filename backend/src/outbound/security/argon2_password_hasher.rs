//! Argon2id password hashing adapter.

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash as PhcHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use rand_core::OsRng;

use crate::domain::PasswordHash;
use crate::domain::ports::{PasswordHasher, PasswordHasherError};

const DUMMY_PASSWORD: &str = "whenworks-timing-equaliser";

/// Argon2id hasher producing PHC strings with the crate's default cost
/// parameters.
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
    dummy: PasswordHash,
}

impl Argon2PasswordHasher {
    /// Build the hasher and precompute the hash used for unknown users.
    ///
    /// # Errors
    /// Fails if the dummy hash cannot be computed.
    pub fn new() -> Result<Self, PasswordHasherError> {
        let argon2 = Argon2::default();
        let dummy = hash_with(&argon2, DUMMY_PASSWORD)?;
        Ok(Self { argon2, dummy })
    }
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> Result<PasswordHash, PasswordHasherError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| PasswordHash::new(hash.to_string()))
        .map_err(|err| PasswordHasherError::hash(err.to_string()))
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHasherError> {
        hash_with(&self.argon2, password)
    }

    fn verify(&self, password: &str, hash: &PasswordHash) -> Result<bool, PasswordHasherError> {
        let parsed = PhcHash::new(hash.as_str())
            .map_err(|err| PasswordHasherError::malformed_hash(err.to_string()))?;
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(PasswordHasherError::hash(err.to_string())),
        }
    }

    fn dummy_hash(&self) -> PasswordHash {
        self.dummy.clone()
    }
}
