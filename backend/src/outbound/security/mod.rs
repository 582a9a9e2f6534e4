//! Credential and session adapters.

mod argon2_password_hasher;
mod jwt_session_tokens;
mod random_password_generator;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use jwt_session_tokens::JwtSessionTokens;
pub use random_password_generator::RandomPasswordGenerator;
