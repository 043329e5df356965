//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable with deterministic doubles.

use std::sync::Arc;

use crate::domain::ports::{
    DiagnosticGenerator, DiagnosticRepository, PasswordHasher, SessionRepository, TokenService,
    UserRepository,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub hasher: Arc<dyn PasswordHasher>,
    pub tokens: Arc<dyn TokenService>,
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub diagnostics: Arc<dyn DiagnosticRepository>,
    pub generator: Arc<dyn DiagnosticGenerator>,
}
