//! Shared WebSocket adapter state.
//!
//! The relay depends on domain ports (never concrete adapters) plus the
//! connection registry, so connections are testable with deterministic
//! doubles and the registry is never reached as ambient state.

use std::sync::Arc;

use crate::domain::ports::{
    DiagnosticGenerator, DiagnosticRepository, SessionRepository, TokenService, UserRepository,
};

use super::registry::ConnectionRegistry;

/// Dependency bundle for the diagnostic streaming relay.
#[derive(Clone)]
pub struct WsState {
    pub tokens: Arc<dyn TokenService>,
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub diagnostics: Arc<dyn DiagnosticRepository>,
    pub generator: Arc<dyn DiagnosticGenerator>,
    pub registry: Arc<ConnectionRegistry>,
}
