//! Deterministic test doubles and fixtures shared across adapter tests.
//!
//! The in-memory store implements the three repository ports over plain
//! vectors so handler and relay behaviour can be exercised without a
//! database; the scripted generator replaces the external model with a
//! fixed chunk script.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use futures_util::stream::{self, StreamExt};

use crate::domain::ports::{
    DiagnosisStream, DiagnosticGenerator, DiagnosticRepository, PasswordHasher, PersistenceError,
    SessionRepository, TokenService, UserPersistenceError, UserRepository,
};
use crate::domain::{
    DiagnosticResult, DiagnosticSession, PartForecast, PartPrediction, RepairSummary, SessionId,
    User, UserId,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::ws::registry::ConnectionRegistry;
use crate::inbound::ws::state::WsState;
use crate::outbound::security::{Argon2PasswordHasher, JwtTokenService};

/// Vector-backed implementation of every repository port.
#[derive(Default)]
pub(crate) struct InMemoryStore {
    next_id: AtomicI32,
    users: Mutex<Vec<User>>,
    sessions: Mutex<Vec<DiagnosticSession>>,
    results: Mutex<Vec<DiagnosticResult>>,
    parts: Mutex<Vec<PartPrediction>>,
    notes: Mutex<Vec<(SessionId, String)>>,
    summaries: Mutex<Vec<RepairSummary>>,
}

impl InMemoryStore {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicI32::new(1),
            ..Self::default()
        })
    }

    fn next_id(&self) -> i32 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Snapshot of every persisted diagnostic result.
    pub(crate) fn recorded_results(&self) -> Vec<DiagnosticResult> {
        self.results.lock().expect("results lock").clone()
    }

    /// Number of technician notes recorded.
    pub(crate) fn note_count(&self) -> usize {
        self.notes.lock().expect("notes lock").len()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, UserPersistenceError> {
        let mut users = self.users.lock().expect("users lock");
        if users.iter().any(|user| user.email == email) {
            return Err(UserPersistenceError::Conflict);
        }
        let user = User {
            id: UserId::new(self.next_id()),
            email: email.to_owned(),
            password_hash: password_hash.to_owned(),
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserPersistenceError> {
        let users = self.users.lock().expect("users lock");
        Ok(users.iter().find(|user| user.email == email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        let users = self.users.lock().expect("users lock");
        Ok(users.iter().find(|user| user.id == id).cloned())
    }
}

#[async_trait]
impl SessionRepository for InMemoryStore {
    async fn create(
        &self,
        user_id: UserId,
        input_text: Option<&str>,
    ) -> Result<DiagnosticSession, PersistenceError> {
        let session = DiagnosticSession {
            id: SessionId::new(self.next_id()),
            user_id,
            input_text: input_text.map(ToOwned::to_owned),
            created_at: Utc::now(),
        };
        self.sessions
            .lock()
            .expect("sessions lock")
            .push(session.clone());
        Ok(session)
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<DiagnosticSession>, PersistenceError> {
        let sessions = self.sessions.lock().expect("sessions lock");
        let mut owned: Vec<DiagnosticSession> = sessions
            .iter()
            .filter(|session| session.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.id.as_i32().cmp(&a.id.as_i32()))
        });
        Ok(owned)
    }

    async fn find_owned(
        &self,
        session_id: SessionId,
        user_id: UserId,
    ) -> Result<Option<DiagnosticSession>, PersistenceError> {
        let sessions = self.sessions.lock().expect("sessions lock");
        Ok(sessions
            .iter()
            .find(|session| session.id == session_id && session.user_id == user_id)
            .cloned())
    }

    async fn update_input(
        &self,
        session_id: SessionId,
        input_text: &str,
    ) -> Result<(), PersistenceError> {
        let mut sessions = self.sessions.lock().expect("sessions lock");
        if let Some(session) = sessions.iter_mut().find(|session| session.id == session_id) {
            session.input_text = Some(input_text.to_owned());
        }
        Ok(())
    }
}

#[async_trait]
impl DiagnosticRepository for InMemoryStore {
    async fn record_result(
        &self,
        session_id: SessionId,
        input_message: &str,
        output_text: &str,
    ) -> Result<DiagnosticResult, PersistenceError> {
        let result = DiagnosticResult {
            id: self.next_id(),
            session_id,
            input_message: input_message.to_owned(),
            output_text: output_text.to_owned(),
            created_at: Utc::now(),
        };
        self.results
            .lock()
            .expect("results lock")
            .push(result.clone());
        Ok(result)
    }

    async fn results_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<DiagnosticResult>, PersistenceError> {
        let results = self.results.lock().expect("results lock");
        Ok(results
            .iter()
            .filter(|result| result.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn first_result(
        &self,
        session_id: SessionId,
    ) -> Result<Option<DiagnosticResult>, PersistenceError> {
        Ok(self
            .results_for_session(session_id)
            .await?
            .into_iter()
            .next())
    }

    async fn record_predictions(
        &self,
        session_id: SessionId,
        forecasts: &[PartForecast],
    ) -> Result<Vec<PartPrediction>, PersistenceError> {
        let mut parts = self.parts.lock().expect("parts lock");
        let recorded: Vec<PartPrediction> = forecasts
            .iter()
            .map(|forecast| PartPrediction {
                id: self.next_id(),
                session_id,
                part_name: forecast.name.clone(),
                confidence_score: forecast.confidence,
                selected: true,
                price_estimate: forecast.price.clone(),
                created_at: Utc::now(),
            })
            .collect();
        parts.extend(recorded.iter().cloned());
        Ok(recorded)
    }

    async fn parts_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<PartPrediction>, PersistenceError> {
        let parts = self.parts.lock().expect("parts lock");
        Ok(parts
            .iter()
            .filter(|part| part.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn record_note(
        &self,
        session_id: SessionId,
        note_text: &str,
    ) -> Result<(), PersistenceError> {
        self.notes
            .lock()
            .expect("notes lock")
            .push((session_id, note_text.to_owned()));
        Ok(())
    }

    async fn record_summary(
        &self,
        session_id: SessionId,
        summary_text: &str,
    ) -> Result<RepairSummary, PersistenceError> {
        let summary = RepairSummary {
            id: self.next_id(),
            session_id,
            summary_text: summary_text.to_owned(),
            created_at: Utc::now(),
        };
        self.summaries
            .lock()
            .expect("summaries lock")
            .push(summary.clone());
        Ok(summary)
    }

    async fn first_summary(
        &self,
        session_id: SessionId,
    ) -> Result<Option<RepairSummary>, PersistenceError> {
        let summaries = self.summaries.lock().expect("summaries lock");
        Ok(summaries
            .iter()
            .find(|summary| summary.session_id == session_id)
            .cloned())
    }
}

/// Generator double emitting a fixed chunk script.
#[derive(Default)]
pub(crate) struct ScriptedGenerator {
    pub chunks: Vec<String>,
    /// Keep the stream pending after the scripted chunks instead of ending.
    pub hang_after_chunks: bool,
    pub parts: Vec<PartForecast>,
    pub summary: String,
}

impl ScriptedGenerator {
    pub(crate) fn with_chunks(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|chunk| (*chunk).to_owned()).collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl DiagnosticGenerator for ScriptedGenerator {
    async fn diagnose(&self, _symptoms: &str) -> DiagnosisStream {
        let chunks = self.chunks.clone();
        if self.hang_after_chunks {
            stream::iter(chunks).chain(stream::pending()).boxed()
        } else {
            stream::iter(chunks).boxed()
        }
    }

    async fn predict_parts(&self, _diagnosis: &str) -> Vec<PartForecast> {
        self.parts.clone()
    }

    async fn summarize<'a>(
        &self,
        _diagnosis: &str,
        _part_names: &[String],
        _notes: Option<&'a str>,
    ) -> String {
        self.summary.clone()
    }
}

/// HTTP state plus a handle for asserting on persisted artefacts.
pub(crate) struct HttpTestHarness {
    pub state: HttpState,
    pub store: Arc<InMemoryStore>,
}

/// HTTP state over in-memory doubles and real credential primitives.
pub(crate) fn http_test_state() -> HttpState {
    http_test_state_with(Arc::new(ScriptedGenerator::default()))
}

/// HTTP state with an explicit generator double.
pub(crate) fn http_test_state_with(generator: Arc<dyn DiagnosticGenerator>) -> HttpState {
    http_test_harness_with(generator).state
}

/// HTTP harness exposing the backing store alongside the state.
pub(crate) fn http_test_harness_with(generator: Arc<dyn DiagnosticGenerator>) -> HttpTestHarness {
    let store = InMemoryStore::new();
    let state = HttpState {
        hasher: Arc::new(Argon2PasswordHasher::new()),
        tokens: Arc::new(JwtTokenService::new("test-secret")),
        users: store.clone(),
        sessions: store.clone(),
        diagnostics: store.clone(),
        generator,
    };
    HttpTestHarness { state, store }
}

/// Relay state plus handles for asserting on persisted artefacts.
pub(crate) struct WsTestHarness {
    pub state: WsState,
    pub store: Arc<InMemoryStore>,
}

/// Relay state over in-memory doubles with an explicit generator double.
pub(crate) fn ws_test_harness(generator: Arc<dyn DiagnosticGenerator>) -> WsTestHarness {
    let store = InMemoryStore::new();
    let state = WsState {
        tokens: Arc::new(JwtTokenService::new("test-secret")),
        users: store.clone(),
        sessions: store.clone(),
        diagnostics: store.clone(),
        generator,
        registry: Arc::new(ConnectionRegistry::new()),
    };
    WsTestHarness { state, store }
}

/// Register a user straight through the repository port.
pub(crate) async fn seed_user(state: &HttpState, email: &str) -> User {
    let password_hash = state.hasher.hash("password").expect("hash password");
    state
        .users
        .create(email, &password_hash)
        .await
        .expect("seed user")
}

/// Authorization header value for a seeded user.
pub(crate) fn bearer_for(state: &HttpState, user_id: UserId) -> String {
    let token = state.tokens.issue(user_id).expect("issue token");
    format!("Bearer {token}")
}
