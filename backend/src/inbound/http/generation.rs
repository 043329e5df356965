//! Parts prediction and repair summary handlers.
//!
//! Both endpoints await the external generation call in full before
//! responding; nothing here is streamed. Upstream generation failures are
//! folded into the content by the gateway, so these handlers only surface
//! authentication, ownership, and persistence errors.

use actix_web::{post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{
    DiagnosticGenerator as _, DiagnosticRepository as _, SessionRepository as _,
};
use crate::domain::{Error, RepairSummary, SessionId};

use super::auth::{map_persistence_error, AuthenticatedUser};
use super::error::ApiResult;
use super::sessions::PartView;
use super::state::HttpState;

/// Query for `POST /predict-parts`.
#[derive(Debug, Deserialize)]
pub struct PredictPartsQuery {
    pub session_id: i32,
}

/// Query for `POST /summarize-order`.
#[derive(Debug, Deserialize)]
pub struct SummarizeOrderQuery {
    pub session_id: i32,
    pub notes: Option<String>,
}

/// Persisted repair summary returned to the caller.
#[derive(Debug, Serialize, ToSchema)]
pub struct RepairSummaryResponse {
    pub id: i32,
    pub session_id: i32,
    pub summary_text: String,
    pub created_at: DateTime<Utc>,
}

impl From<RepairSummary> for RepairSummaryResponse {
    fn from(summary: RepairSummary) -> Self {
        Self {
            id: summary.id,
            session_id: summary.session_id.as_i32(),
            summary_text: summary.summary_text,
            created_at: summary.created_at,
        }
    }
}

/// Predict replacement parts from the session's first diagnostic result
/// and persist each forecast.
#[utoipa::path(
    post,
    path = "/predict-parts",
    params(("session_id" = i32, Query, description = "Session id")),
    responses(
        (status = 200, description = "Predicted parts", body = [PartView]),
        (status = 404, description = "Session or diagnostic result missing"),
    ),
    tags = ["generation"]
)]
#[post("/predict-parts")]
pub async fn predict_parts(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    query: web::Query<PredictPartsQuery>,
) -> ApiResult<web::Json<Vec<PartView>>> {
    let session_id = SessionId::new(query.session_id);

    state
        .sessions
        .find_owned(session_id, user.0.id)
        .await
        .map_err(map_persistence_error)?
        .ok_or_else(|| Error::not_found("Session not found"))?;

    let result = state
        .diagnostics
        .first_result(session_id)
        .await
        .map_err(map_persistence_error)?
        .ok_or_else(|| Error::not_found("Diagnostic result not found"))?;

    let forecasts = state.generator.predict_parts(&result.output_text).await;

    let predictions = state
        .diagnostics
        .record_predictions(session_id, &forecasts)
        .await
        .map_err(map_persistence_error)?;

    Ok(web::Json(
        predictions
            .into_iter()
            .map(|part| PartView {
                id: part.id,
                name: part.part_name,
                confidence: part.confidence_score,
                price: part.price_estimate,
            })
            .collect(),
    ))
}

/// Generate and persist a customer-facing repair summary, appending the
/// technician note first when one is supplied.
#[utoipa::path(
    post,
    path = "/summarize-order",
    params(
        ("session_id" = i32, Query, description = "Session id"),
        ("notes" = Option<String>, Query, description = "Technician note to append"),
    ),
    responses(
        (status = 200, description = "Repair summary", body = RepairSummaryResponse),
        (status = 404, description = "Session or diagnostic result missing"),
    ),
    tags = ["generation"]
)]
#[post("/summarize-order")]
pub async fn summarize_order(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    query: web::Query<SummarizeOrderQuery>,
) -> ApiResult<web::Json<RepairSummaryResponse>> {
    let session_id = SessionId::new(query.session_id);
    let notes = query.notes.as_deref().filter(|notes| !notes.is_empty());

    state
        .sessions
        .find_owned(session_id, user.0.id)
        .await
        .map_err(map_persistence_error)?
        .ok_or_else(|| Error::not_found("Session not found"))?;

    let result = state
        .diagnostics
        .first_result(session_id)
        .await
        .map_err(map_persistence_error)?
        .ok_or_else(|| Error::not_found("Diagnostic result not found"))?;

    let parts = state
        .diagnostics
        .parts_for_session(session_id)
        .await
        .map_err(map_persistence_error)?;

    if let Some(notes) = notes {
        state
            .diagnostics
            .record_note(session_id, notes)
            .await
            .map_err(map_persistence_error)?;
    }

    let part_names: Vec<String> = parts.into_iter().map(|part| part.part_name).collect();
    let summary_text = state
        .generator
        .summarize(&result.output_text, &part_names, notes)
        .await;

    let summary = state
        .diagnostics
        .record_summary(session_id, &summary_text)
        .await
        .map_err(map_persistence_error)?;

    Ok(web::Json(RepairSummaryResponse::from(summary)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        DiagnosticRepository as _, MockDiagnosticGenerator, SessionRepository as _,
    };
    use crate::domain::PartForecast;
    use crate::test_support::{
        bearer_for, http_test_harness_with, http_test_state, http_test_state_with, seed_user,
    };
    use actix_web::http::StatusCode;
    use actix_web::{test as actix_test, App};
    use futures_util::stream;
    use futures_util::StreamExt as _;
    use rstest::rstest;
    use serde_json::Value;
    use std::sync::Arc;

    fn mock_generator_with_parts(parts: Vec<PartForecast>) -> Arc<MockDiagnosticGenerator> {
        let mut generator = MockDiagnosticGenerator::new();
        generator
            .expect_predict_parts()
            .returning(move |_| parts.clone());
        generator
            .expect_summarize()
            .returning(|_, _, _| "All sorted.".to_owned());
        generator
            .expect_diagnose()
            .returning(|_| stream::empty().boxed());
        Arc::new(generator)
    }

    #[rstest]
    #[actix_rt::test]
    async fn unparsable_forecasts_yield_empty_list_and_no_rows() {
        let state = http_test_state_with(mock_generator_with_parts(Vec::new()));
        let owner = seed_user(&state, "owner@example.com").await;
        let session = state
            .sessions
            .create(owner.id, Some("rough idle"))
            .await
            .expect("create session");
        state
            .diagnostics
            .record_result(session.id, "rough idle", "Vacuum leak likely.")
            .await
            .expect("record result");

        let app = actix_test::init_service(
            App::new()
                .app_data(actix_web::web::Data::new(state.clone()))
                .service(predict_parts),
        )
        .await;

        let request = actix_test::TestRequest::post()
            .uri(&format!("/predict-parts?session_id={}", session.id))
            .insert_header(("Authorization", bearer_for(&state, owner.id)))
            .to_request();
        let parts: Value = actix_test::call_and_read_body_json(&app, request).await;
        assert_eq!(parts, serde_json::json!([]));

        let stored = state
            .diagnostics
            .parts_for_session(session.id)
            .await
            .expect("query parts");
        assert!(stored.is_empty());
    }

    #[rstest]
    #[actix_rt::test]
    async fn predicted_parts_are_persisted_with_ids() {
        let forecasts = vec![PartForecast {
            name: "Brake pads".to_owned(),
            confidence: 0.9,
            price: Some("$80-$120".to_owned()),
        }];
        let state = http_test_state_with(mock_generator_with_parts(forecasts));
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
                .service(predict_parts),
        )
        .await;

        let request = actix_test::TestRequest::post()
            .uri(&format!("/predict-parts?session_id={}", session.id))
            .insert_header(("Authorization", bearer_for(&state, owner.id)))
            .to_request();
        let parts: Value = actix_test::call_and_read_body_json(&app, request).await;
        let first = &parts.as_array().expect("array body")[0];
        assert_eq!(first.get("name").and_then(Value::as_str), Some("Brake pads"));
        assert!(first.get("id").is_some());

        let stored = state
            .diagnostics
            .parts_for_session(session.id)
            .await
            .expect("query parts");
        assert_eq!(stored.len(), 1);
    }

    #[rstest]
    #[actix_rt::test]
    async fn missing_diagnostic_result_is_not_found() {
        let state = http_test_state();
        let owner = seed_user(&state, "owner@example.com").await;
        let session = state
            .sessions
            .create(owner.id, None)
            .await
            .expect("create session");

        let app = actix_test::init_service(
            App::new()
                .app_data(actix_web::web::Data::new(state.clone()))
                .service(predict_parts)
                .service(summarize_order),
        )
        .await;

        for uri in [
            format!("/predict-parts?session_id={}", session.id),
            format!("/summarize-order?session_id={}", session.id),
        ] {
            let request = actix_test::TestRequest::post()
                .uri(&uri)
                .insert_header(("Authorization", bearer_for(&state, owner.id)))
                .to_request();
            let response = actix_test::call_service(&app, request).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }
    }

    #[rstest]
    #[actix_rt::test]
    async fn summarize_order_records_note_and_summary() {
        let harness = http_test_harness_with(mock_generator_with_parts(Vec::new()));
        let state = harness.state.clone();
        let owner = seed_user(&state, "owner@example.com").await;
        let session = state
            .sessions
            .create(owner.id, Some("overheating"))
            .await
            .expect("create session");
        state
            .diagnostics
            .record_result(session.id, "overheating", "Thermostat stuck closed.")
            .await
            .expect("record result");

        let app = actix_test::init_service(
            App::new()
                .app_data(actix_web::web::Data::new(state.clone()))
                .service(summarize_order),
        )
        .await;

        let request = actix_test::TestRequest::post()
            .uri(&format!(
                "/summarize-order?session_id={}&notes=coolant%20flushed",
                session.id
            ))
            .insert_header(("Authorization", bearer_for(&state, owner.id)))
            .to_request();
        let summary: Value = actix_test::call_and_read_body_json(&app, request).await;
        assert_eq!(
            summary.get("summary_text").and_then(Value::as_str),
            Some("All sorted.")
        );

        let stored = state
            .diagnostics
            .first_summary(session.id)
            .await
            .expect("query summary");
        assert!(stored.is_some());
        assert_eq!(harness.store.note_count(), 1);
    }
}
