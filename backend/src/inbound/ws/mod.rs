//! WebSocket inbound adapter: the diagnostic streaming relay.
//!
//! Responsibilities:
//! - complete the transport upgrade, then validate the query-string token
//! - bind the connection to an owned diagnostic session, creating one for
//!   the user when the requested id is absent (a deliberate side effect of
//!   the authenticating step, not an incidental lookup)
//! - track the live connection in the per-user registry
//! - hand the connection to the relay loop

use std::sync::Arc;

use actix_web::web::{self, Payload};
use actix_web::{get, HttpRequest, HttpResponse};
use actix_ws::{CloseCode, CloseReason, MessageStream, Session};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::ports::{SessionRepository as _, TokenService as _, UserRepository as _};
use crate::domain::{DiagnosticSession, SessionId, User, UserId};

pub mod messages;
pub mod registry;
mod relay;
pub mod state;

use state::WsState;

/// Query parameters accepted on the upgrade request.
#[derive(Debug, Deserialize)]
pub struct DiagnosticsWsQuery {
    pub token: Option<String>,
}

/// Handle WebSocket upgrade for `/ws/diagnostics/{session_id}`.
#[get("/ws/diagnostics/{session_id}")]
pub async fn diagnostics_ws(
    state: web::Data<WsState>,
    path: web::Path<i32>,
    query: web::Query<DiagnosticsWsQuery>,
    req: HttpRequest,
    body: Payload,
) -> actix_web::Result<HttpResponse> {
    let (response, session, stream) = actix_ws::handle(&req, body)?;

    let state = state.into_inner();
    let requested = SessionId::new(path.into_inner());
    let token = query.into_inner().token;
    actix_web::rt::spawn(run_connection(state, requested, token, session, stream));

    Ok(response)
}

/// Authenticate, bind the session, register the connection, and relay.
async fn run_connection(
    state: Arc<WsState>,
    requested: SessionId,
    token: Option<String>,
    ws: Session,
    stream: MessageStream,
) {
    let user = match authenticate(&state, token.as_deref()).await {
        Ok(user) => user,
        Err(reason) => {
            close_policy(ws, reason).await;
            return;
        }
    };

    let session = match resolve_session(&state, requested, user.id).await {
        Ok(session) => session,
        Err(reason) => {
            close_policy(ws, reason).await;
            return;
        }
    };

    let _guard = state.registry.register(user.id);
    relay::Relay::new(Arc::clone(&state), session.id)
        .run(ws, stream)
        .await;
}

/// Resolve the query-string token to a live user.
async fn authenticate(state: &WsState, token: Option<&str>) -> Result<User, &'static str> {
    let token = token
        .filter(|token| !token.is_empty())
        .ok_or("No authentication token")?;

    let user_id = state
        .tokens
        .resolve(token)
        .map_err(|_| "Invalid authentication token")?;

    match state.users.find_by_id(user_id).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err("Invalid authentication token"),
        Err(err) => {
            warn!(error = %err, "user lookup failed during relay handshake");
            Err("Authentication unavailable")
        }
    }
}

/// Fetch the requested session when owned by the caller, or create a fresh
/// one for them when it is not.
async fn resolve_session(
    state: &WsState,
    requested: SessionId,
    user_id: UserId,
) -> Result<DiagnosticSession, &'static str> {
    let found = state
        .sessions
        .find_owned(requested, user_id)
        .await
        .map_err(|err| {
            warn!(error = %err, "session lookup failed during relay handshake");
            "Session unavailable"
        })?;

    match found {
        Some(session) => Ok(session),
        None => state.sessions.create(user_id, None).await.map_err(|err| {
            warn!(error = %err, "session creation failed during relay handshake");
            "Session unavailable"
        }),
    }
}

/// Close the already-upgraded connection with a policy-violation code.
async fn close_policy(ws: Session, reason: &str) {
    let close = CloseReason {
        code: CloseCode::Policy,
        description: Some(reason.to_owned()),
    };
    if let Err(err) = ws.close(Some(close)).await {
        debug!(error = %err, "failed to close unauthenticated connection");
    }
}
