//! HS256 bearer token adapter.
//!
//! Tokens carry the user id as the `sub` claim plus an `exp` timestamp and
//! are signed with a shared secret. Tampering, expiry, and malformed claims
//! all collapse into [`TokenError::Invalid`] so callers cannot distinguish
//! why a presented token was rejected.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ports::{TokenError, TokenService};
use crate::domain::UserId;

/// Access tokens stay valid for this long unless configured otherwise.
pub const DEFAULT_EXPIRY_MINUTES: i64 = 30;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// Signed-token service backed by `jsonwebtoken`.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_minutes: i64,
}

impl JwtTokenService {
    /// Build a service signing with `secret` and the default expiry window.
    pub fn new(secret: &str) -> Self {
        Self::with_expiry(secret, DEFAULT_EXPIRY_MINUTES)
    }

    /// Build a service with an explicit expiry window in minutes.
    pub fn with_expiry(secret: &str, expiry_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_minutes,
        }
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, user_id: UserId) -> Result<String, TokenError> {
        let expires_at = Utc::now() + Duration::minutes(self.expiry_minutes);
        let claims = Claims {
            sub: user_id.to_string(),
            exp: expires_at.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| TokenError::issue(err.to_string()))
    }

    fn resolve(&self, token: &str) -> Result<UserId, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|err| {
            debug!(error = %err, "token rejected");
            TokenError::Invalid
        })?;

        data.claims
            .sub
            .parse::<i32>()
            .map(UserId::new)
            .map_err(|_| TokenError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn service() -> JwtTokenService {
        JwtTokenService::new("test-secret")
    }

    #[rstest]
    fn issue_then_resolve_recovers_identity() {
        let tokens = service();
        let token = tokens.issue(UserId::new(42)).expect("issue");
        assert_eq!(tokens.resolve(&token).expect("resolve"), UserId::new(42));
    }

    #[rstest]
    fn expired_token_is_rejected() {
        let tokens = JwtTokenService::with_expiry("test-secret", -5);
        let token = tokens.issue(UserId::new(7)).expect("issue");
        assert_eq!(tokens.resolve(&token), Err(TokenError::Invalid));
    }

    #[rstest]
    fn token_signed_with_other_secret_is_rejected() {
        let token = JwtTokenService::new("other-secret")
            .issue(UserId::new(7))
            .expect("issue");
        assert_eq!(service().resolve(&token), Err(TokenError::Invalid));
    }

    #[rstest]
    #[case("")]
    #[case("not.a.token")]
    fn garbage_tokens_are_rejected(#[case] token: &str) {
        assert_eq!(service().resolve(token), Err(TokenError::Invalid));
    }
}
