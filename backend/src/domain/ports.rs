//! Domain ports defining the edges of the hexagon.
//!
//! Ports describe how the domain expects to interact with driven adapters
//! (credential primitives, the relational store, the text-generation API).
//! Each trait exposes strongly typed errors so adapters map their failures
//! into predictable variants instead of returning `anyhow::Result`.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use thiserror::Error;

use super::diagnostics::{
    DiagnosticResult, DiagnosticSession, PartForecast, PartPrediction, RepairSummary, SessionId,
};
use super::users::{User, UserId};

/// Errors surfaced by the password hashing primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordHashError {
    /// The hashing backend rejected the input or its own parameters.
    #[error("password hashing failed: {message}")]
    Hash { message: String },
}

impl PasswordHashError {
    /// Helper for hashing backend failures.
    pub fn hash(message: impl Into<String>) -> Self {
        Self::Hash {
            message: message.into(),
        }
    }
}

/// One-way salted password hashing and verification.
///
/// Hashing is bounded CPU work; implementations stay synchronous and are
/// invoked directly from request handlers.
pub trait PasswordHasher: Send + Sync {
    /// Produce a salted, irreversible hash of `plaintext`.
    fn hash(&self, plaintext: &str) -> Result<String, PasswordHashError>;

    /// Check `plaintext` against a stored hash. A malformed stored hash
    /// verifies as `false`, never as a crash.
    fn verify(&self, plaintext: &str, hash: &str) -> bool;
}

/// Errors surfaced by the token primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Token could not be signed.
    #[error("token issuance failed: {message}")]
    Issue { message: String },
    /// Signature invalid, token expired, or claims malformed.
    #[error("invalid or expired token")]
    Invalid,
}

impl TokenError {
    /// Helper for signing failures.
    pub fn issue(message: impl Into<String>) -> Self {
        Self::Issue {
            message: message.into(),
        }
    }
}

/// Issues and resolves signed bearer tokens carrying a user identity claim
/// and a fixed expiry window.
pub trait TokenService: Send + Sync {
    /// Issue a signed token asserting `user_id` until the expiry window ends.
    fn issue(&self, user_id: UserId) -> Result<String, TokenError>;

    /// Recover the identity claim, failing with [`TokenError::Invalid`] on a
    /// bad signature, expiry, or malformed claims. Whether the identity is
    /// still known is for the caller to establish with a user lookup.
    fn resolve(&self, token: &str) -> Result<UserId, TokenError>;
}

/// Errors surfaced by the user persistence adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserPersistenceError {
    /// The email is already registered.
    #[error("email already registered")]
    Conflict,
    /// Database connectivity failures.
    #[error("user persistence connection failed: {message}")]
    Connection { message: String },
    /// Catch-all for query failures that bubble up from the adapter.
    #[error("user persistence failed: {message}")]
    Query { message: String },
}

impl UserPersistenceError {
    /// Helper for connection related adapter errors.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Errors surfaced by the session and diagnostic persistence adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    /// Database connectivity failures.
    #[error("persistence connection failed: {message}")]
    Connection { message: String },
    /// Catch-all for query failures that bubble up from the adapter.
    #[error("persistence failed: {message}")]
    Query { message: String },
}

impl PersistenceError {
    /// Helper for connection related adapter errors.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Store for registered users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. A duplicate email maps to
    /// [`UserPersistenceError::Conflict`].
    async fn create(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<User, UserPersistenceError>;

    /// Look up a user by exact email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserPersistenceError>;

    /// Look up a user by id.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError>;
}

/// Store for diagnostic sessions. Every read is filtered by the owning
/// user; an unowned session behaves exactly like a missing one.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a session for `user_id`, optionally seeded with symptom text.
    async fn create(
        &self,
        user_id: UserId,
        input_text: Option<&str>,
    ) -> Result<DiagnosticSession, PersistenceError>;

    /// All sessions owned by `user_id`, newest first.
    async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<DiagnosticSession>, PersistenceError>;

    /// Fetch a session only when it belongs to `user_id`.
    async fn find_owned(
        &self,
        session_id: SessionId,
        user_id: UserId,
    ) -> Result<Option<DiagnosticSession>, PersistenceError>;

    /// Overwrite the session's latest symptom text.
    async fn update_input(
        &self,
        session_id: SessionId,
        input_text: &str,
    ) -> Result<(), PersistenceError>;
}

/// Store for artefacts generated against a session. Callers establish
/// ownership of the session before touching its children.
#[async_trait]
pub trait DiagnosticRepository: Send + Sync {
    /// Record one completed generation.
    async fn record_result(
        &self,
        session_id: SessionId,
        input_message: &str,
        output_text: &str,
    ) -> Result<DiagnosticResult, PersistenceError>;

    /// All results for a session, oldest first.
    async fn results_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<DiagnosticResult>, PersistenceError>;

    /// The first recorded result, if any.
    async fn first_result(
        &self,
        session_id: SessionId,
    ) -> Result<Option<DiagnosticResult>, PersistenceError>;

    /// Persist one prediction row per forecast, atomically.
    async fn record_predictions(
        &self,
        session_id: SessionId,
        forecasts: &[PartForecast],
    ) -> Result<Vec<PartPrediction>, PersistenceError>;

    /// All predictions recorded for a session, oldest first.
    async fn parts_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<PartPrediction>, PersistenceError>;

    /// Append a technician note. Notes are never read back through the
    /// public contract, only folded into summaries at generation time.
    async fn record_note(
        &self,
        session_id: SessionId,
        note_text: &str,
    ) -> Result<(), PersistenceError>;

    /// Persist a generated customer-facing summary.
    async fn record_summary(
        &self,
        session_id: SessionId,
        summary_text: &str,
    ) -> Result<RepairSummary, PersistenceError>;

    /// The first recorded summary, if any.
    async fn first_summary(
        &self,
        session_id: SessionId,
    ) -> Result<Option<RepairSummary>, PersistenceError>;
}

/// Ordered, finite stream of non-empty diagnosis fragments. The producer
/// folds its own failures into content, so consumers never see an error
/// variant; dropping the stream cancels the underlying call.
pub type DiagnosisStream = BoxStream<'static, String>;

/// Adapter over the external text-generation API.
///
/// None of these operations retry, and none of them fail: upstream errors
/// are folded into the content channel (an error-shaped chunk, an empty
/// forecast list, or an error-description string) exactly once per call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiagnosticGenerator: Send + Sync {
    /// Stream a diagnosis for free-text symptoms. Yields at least one chunk,
    /// even when the upstream call fails; concatenating the chunks in yield
    /// order reproduces the full diagnosis.
    async fn diagnose(&self, symptoms: &str) -> DiagnosisStream;

    /// Predict replacement parts from a completed diagnosis. Unparsable or
    /// failed upstream responses yield an empty list, never an error.
    async fn predict_parts(&self, diagnosis: &str) -> Vec<PartForecast>;

    /// Produce a customer-facing repair narrative.
    async fn summarize<'a>(
        &self,
        diagnosis: &str,
        part_names: &[String],
        notes: Option<&'a str>,
    ) -> String;
}
