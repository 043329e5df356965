//! OpenAPI documentation configuration.
//!
//! Registers every REST path plus the request/response schemas, and the
//! bearer token security scheme. The generated specification backs the
//! Swagger UI mounted in debug builds. The WebSocket relay is outside the
//! OpenAPI surface.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Detect Auto API",
        description = "Authentication, diagnostic sessions, and generation endpoints."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::login,
        crate::inbound::http::users::me,
        crate::inbound::http::sessions::create_session,
        crate::inbound::http::sessions::list_sessions,
        crate::inbound::http::sessions::get_session,
        crate::inbound::http::sessions::start_diagnostic,
        crate::inbound::http::generation::predict_parts,
        crate::inbound::http::generation::summarize_order,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        crate::inbound::http::error::ApiError,
        crate::inbound::http::users::RegisterRequest,
        crate::inbound::http::users::LoginRequest,
        crate::inbound::http::users::UserResponse,
        crate::inbound::http::users::TokenResponse,
        crate::inbound::http::sessions::SessionCreateRequest,
        crate::inbound::http::sessions::StartDiagnosticRequest,
        crate::inbound::http::sessions::SessionResponse,
        crate::inbound::http::sessions::SessionSummaryResponse,
        crate::inbound::http::sessions::SessionDetailResponse,
        crate::inbound::http::sessions::DiagnosticResultView,
        crate::inbound::http::sessions::PartView,
        crate::inbound::http::generation::RepairSummaryResponse,
    ))
)]
pub struct ApiDoc;
