//! Diagnostic session CRUD handlers.

use actix_web::{get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{DiagnosticRepository as _, SessionRepository as _};
use crate::domain::{DiagnosticSession, Error, SessionId};

use super::auth::{map_persistence_error, AuthenticatedUser};
use super::error::ApiResult;
use super::state::HttpState;

/// Body for `POST /sessions`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SessionCreateRequest {
    pub input_text: Option<String>,
}

/// Body for `POST /diagnostic/start`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct StartDiagnosticRequest {
    pub input: Option<String>,
}

/// Full session representation returned on creation.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub id: i32,
    pub user_id: i32,
    pub input_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<DiagnosticSession> for SessionResponse {
    fn from(session: DiagnosticSession) -> Self {
        Self {
            id: session.id.as_i32(),
            user_id: session.user_id.as_i32(),
            input_text: session.input_text,
            created_at: session.created_at,
        }
    }
}

/// Summary row for session listings and `POST /diagnostic/start`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionSummaryResponse {
    pub session_id: i32,
    pub input_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<DiagnosticSession> for SessionSummaryResponse {
    fn from(session: DiagnosticSession) -> Self {
        Self {
            session_id: session.id.as_i32(),
            input_text: session.input_text,
            created_at: session.created_at,
        }
    }
}

/// One generation shown in session detail.
#[derive(Debug, Serialize, ToSchema)]
pub struct DiagnosticResultView {
    pub input_message: String,
    pub output_text: String,
}

/// One predicted part shown in session detail and `POST /predict-parts`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PartView {
    pub id: i32,
    pub name: String,
    pub confidence: f64,
    pub price: Option<String>,
}

/// Aggregate view returned by `GET /sessions/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionDetailResponse {
    pub session_id: i32,
    pub input_text: Option<String>,
    pub diagnostic_results: Vec<DiagnosticResultView>,
    pub parts: Vec<PartView>,
    /// The first recorded summary, when any exist.
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create a session, optionally seeded with symptom text.
#[utoipa::path(
    post,
    path = "/sessions",
    request_body = SessionCreateRequest,
    responses(
        (status = 200, description = "Session created", body = SessionResponse),
        (status = 401, description = "Unauthorised"),
    ),
    tags = ["sessions"]
)]
#[post("/sessions")]
pub async fn create_session(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<SessionCreateRequest>,
) -> ApiResult<web::Json<SessionResponse>> {
    let session = state
        .sessions
        .create(user.0.id, payload.input_text.as_deref())
        .await
        .map_err(map_persistence_error)?;
    Ok(web::Json(SessionResponse::from(session)))
}

/// List the caller's sessions, newest first.
#[utoipa::path(
    get,
    path = "/sessions",
    responses(
        (status = 200, description = "Sessions", body = [SessionSummaryResponse]),
        (status = 401, description = "Unauthorised"),
    ),
    tags = ["sessions"]
)]
#[get("/sessions")]
pub async fn list_sessions(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<Vec<SessionSummaryResponse>>> {
    let sessions = state
        .sessions
        .list_for_user(user.0.id)
        .await
        .map_err(map_persistence_error)?;
    Ok(web::Json(
        sessions.into_iter().map(SessionSummaryResponse::from).collect(),
    ))
}

/// Fetch one owned session with its accumulated artefacts.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    params(("id" = i32, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session detail", body = SessionDetailResponse),
        (status = 404, description = "Missing or not owned"),
    ),
    tags = ["sessions"]
)]
#[get("/sessions/{id}")]
pub async fn get_session(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> ApiResult<web::Json<SessionDetailResponse>> {
    let session_id = SessionId::new(path.into_inner());

    let session = state
        .sessions
        .find_owned(session_id, user.0.id)
        .await
        .map_err(map_persistence_error)?
        .ok_or_else(|| Error::not_found("Session not found"))?;

    let results = state
        .diagnostics
        .results_for_session(session_id)
        .await
        .map_err(map_persistence_error)?;
    let parts = state
        .diagnostics
        .parts_for_session(session_id)
        .await
        .map_err(map_persistence_error)?;
    let summary = state
        .diagnostics
        .first_summary(session_id)
        .await
        .map_err(map_persistence_error)?;

    Ok(web::Json(SessionDetailResponse {
        session_id: session.id.as_i32(),
        input_text: session.input_text,
        diagnostic_results: results
            .into_iter()
            .map(|result| DiagnosticResultView {
                input_message: result.input_message,
                output_text: result.output_text,
            })
            .collect(),
        parts: parts
            .into_iter()
            .map(|part| PartView {
                id: part.id,
                name: part.part_name,
                confidence: part.confidence_score,
                price: part.price_estimate,
            })
            .collect(),
        summary: summary.map(|s| s.summary_text),
        created_at: session.created_at,
    }))
}

/// Create a session from an initial symptom description.
#[utoipa::path(
    post,
    path = "/diagnostic/start",
    request_body = StartDiagnosticRequest,
    responses(
        (status = 200, description = "Session created", body = SessionSummaryResponse),
        (status = 401, description = "Unauthorised"),
    ),
    tags = ["sessions"]
)]
#[post("/diagnostic/start")]
pub async fn start_diagnostic(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<StartDiagnosticRequest>,
) -> ApiResult<web::Json<SessionSummaryResponse>> {
    let session = state
        .sessions
        .create(user.0.id, payload.input.as_deref())
        .await
        .map_err(map_persistence_error)?;
    Ok(web::Json(SessionSummaryResponse::from(session)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{DiagnosticRepository as _, SessionRepository as _};
    use crate::test_support::{bearer_for, http_test_state, seed_user};
    use actix_web::http::StatusCode;
    use actix_web::{test as actix_test, App};
    use rstest::rstest;
    use serde_json::{json, Value};

    #[rstest]
    #[actix_rt::test]
    async fn session_detail_is_hidden_from_other_users() {
        let state = http_test_state();
        let owner = seed_user(&state, "owner@example.com").await;
        let other = seed_user(&state, "other@example.com").await;
        let session = state
            .sessions
            .create(owner.id, Some("engine rattles"))
            .await
            .expect("create session");

        let app = actix_test::init_service(
            App::new()
                .app_data(actix_web::web::Data::new(state.clone()))
                .service(get_session),
        )
        .await;

        let uri = format!("/sessions/{}", session.id);
        let request = actix_test::TestRequest::get()
            .uri(&uri)
            .insert_header(("Authorization", bearer_for(&state, other.id)))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let request = actix_test::TestRequest::get()
            .uri(&uri)
            .insert_header(("Authorization", bearer_for(&state, owner.id)))
            .to_request();
        let detail: Value = actix_test::call_and_read_body_json(&app, request).await;
        assert_eq!(
            detail.get("input_text").and_then(Value::as_str),
            Some("engine rattles")
        );
    }

    #[rstest]
    #[actix_rt::test]
    async fn session_detail_reads_are_idempotent() {
        let state = http_test_state();
        let owner = seed_user(&state, "owner@example.com").await;
        let session = state
            .sessions
            .create(owner.id, Some("brakes squeal"))
            .await
            .expect("create session");
        state
            .diagnostics
            .record_result(session.id, "brakes squeal", "Worn pads.")
            .await
            .expect("record result");

        let app = actix_test::init_service(
            App::new()
                .app_data(actix_web::web::Data::new(state.clone()))
                .service(get_session),
        )
        .await;

        let uri = format!("/sessions/{}", session.id);
        let mut bodies = Vec::new();
        for _ in 0..2 {
            let request = actix_test::TestRequest::get()
                .uri(&uri)
                .insert_header(("Authorization", bearer_for(&state, owner.id)))
                .to_request();
            bodies.push(
                actix_test::call_and_read_body_json::<_, _, Value>(&app, request).await,
            );
        }
        assert_eq!(bodies[0], bodies[1]);
    }

    #[rstest]
    #[actix_rt::test]
    async fn listing_returns_newest_sessions_first() {
        let state = http_test_state();
        let owner = seed_user(&state, "owner@example.com").await;
        for input in ["first", "second", "third"] {
            state
                .sessions
                .create(owner.id, Some(input))
                .await
                .expect("create session");
        }

        let app = actix_test::init_service(
            App::new()
                .app_data(actix_web::web::Data::new(state.clone()))
                .service(list_sessions),
        )
        .await;

        let request = actix_test::TestRequest::get()
            .uri("/sessions")
            .insert_header(("Authorization", bearer_for(&state, owner.id)))
            .to_request();
        let listed: Value = actix_test::call_and_read_body_json(&app, request).await;
        let inputs: Vec<&str> = listed
            .as_array()
            .expect("array body")
            .iter()
            .filter_map(|row| row.get("input_text").and_then(Value::as_str))
            .collect();
        assert_eq!(inputs, vec!["third", "second", "first"]);
    }

    #[rstest]
    #[actix_rt::test]
    async fn start_diagnostic_creates_a_seeded_session() {
        let state = http_test_state();
        let owner = seed_user(&state, "owner@example.com").await;

        let app = actix_test::init_service(
            App::new()
                .app_data(actix_web::web::Data::new(state.clone()))
                .service(start_diagnostic),
        )
        .await;

        let request = actix_test::TestRequest::post()
            .uri("/diagnostic/start")
            .insert_header(("Authorization", bearer_for(&state, owner.id)))
            .set_json(json!({ "input": "check engine light" }))
            .to_request();
        let created: Value = actix_test::call_and_read_body_json(&app, request).await;
        assert_eq!(
            created.get("input_text").and_then(Value::as_str),
            Some("check engine light")
        );
        assert!(created.get("session_id").is_some());
    }
}
