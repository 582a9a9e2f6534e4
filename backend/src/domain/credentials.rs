//! Password hashing helpers that keep CPU-bound work off the async executor.

use std::sync::Arc;

use tokio::task;
use zeroize::Zeroizing;

use crate::domain::ports::PasswordHasher;
use crate::domain::repository_errors::map_hasher_error;
use crate::domain::{Error, PasswordHash};

/// Hash `password` on the blocking pool.
pub(crate) async fn hash_password<H>(hasher: &Arc<H>, password: &str) -> Result<PasswordHash, Error>
where
    H: PasswordHasher + 'static,
{
    let hasher = Arc::clone(hasher);
    let password = Zeroizing::new(password.to_owned());
    task::spawn_blocking(move || hasher.hash(password.as_str()))
        .await
        .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))?
        .map_err(map_hasher_error)
}

/// Verify `password` against `hash` on the blocking pool.
pub(crate) async fn verify_password<H>(
    hasher: &Arc<H>,
    password: &str,
    hash: PasswordHash,
) -> Result<bool, Error>
where
    H: PasswordHasher + 'static,
{
    let hasher = Arc::clone(hasher);
    let password = Zeroizing::new(password.to_owned());
    task::spawn_blocking(move || hasher.verify(password.as_str(), &hash))
        .await
        .map_err(|err| Error::internal(format!("password verification task failed: {err}")))?
        .map_err(map_hasher_error)
}
