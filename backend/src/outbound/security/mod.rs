//! Credential and token primitives backing the authentication ports.

mod password;
mod token;

pub use password::Argon2PasswordHasher;
pub use token::{JwtTokenService, DEFAULT_EXPIRY_MINUTES};
