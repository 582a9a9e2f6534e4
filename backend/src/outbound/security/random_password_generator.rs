//! Temporary password generation backed by the operating system RNG.

use rand::distributions::Alphanumeric;
use rand::{Rng, rngs::OsRng};

use crate::domain::TemporaryPassword;
use crate::domain::ports::{PasswordGenerator, TEMPORARY_PASSWORD_LEN};

/// Generates alphanumeric passwords of [`TEMPORARY_PASSWORD_LEN`] characters.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPasswordGenerator;

impl PasswordGenerator for RandomPasswordGenerator {
    fn generate(&self) -> TemporaryPassword {
        let value: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(TEMPORARY_PASSWORD_LEN)
            .map(char::from)
            .collect();
        TemporaryPassword::new(value)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn passwords_are_alphanumeric_and_fixed_length() {
        let password = RandomPasswordGenerator.generate();
        assert_eq!(password.expose().len(), TEMPORARY_PASSWORD_LEN);
        assert!(password.expose().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[rstest]
    fn consecutive_passwords_differ() {
        let first = RandomPasswordGenerator.generate();
        let second = RandomPasswordGenerator.generate();
        assert_ne!(first.expose(), second.expose());
    }
}
