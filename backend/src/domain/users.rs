//! User identity and account entity.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque integer key identifying a registered user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(i32);

impl UserId {
    /// Wrap a raw database key.
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    /// Raw key for persistence adapters.
    pub fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered account. Owns zero or more diagnostic sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    /// Unique, stored case-sensitively.
    pub email: String,
    /// Salted one-way hash; never the plaintext.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
