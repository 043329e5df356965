//! Server construction and wiring.
//!
//! Builds the adapter states from concrete outbound implementations and
//! registers every route. The rest of the binary only touches
//! [`AppSettings`], [`ServerDeps`], and [`create_server`].

mod config;

pub use config::AppSettings;

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App, HttpServer};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use backend::doc::ApiDoc;
use backend::inbound::http::generation::{predict_parts, summarize_order};
use backend::inbound::http::health::{live, ready, HealthState};
use backend::inbound::http::sessions::{
    create_session, get_session, list_sessions, start_diagnostic,
};
use backend::inbound::http::state::HttpState;
use backend::inbound::http::users::{login, me, register};
use backend::inbound::ws;
use backend::inbound::ws::registry::ConnectionRegistry;
use backend::inbound::ws::state::WsState;
use backend::outbound::generation::{GenerationConfig, GenerationHttpGateway};
use backend::outbound::persistence::{
    DbPool, DieselDiagnosticRepository, DieselSessionRepository, DieselUserRepository,
};
use backend::outbound::security::{Argon2PasswordHasher, JwtTokenService};

/// Everything the server factory needs beyond the health state.
pub struct ServerDeps {
    pub pool: DbPool,
    pub token_secret: String,
    pub token_expiry_minutes: i64,
    pub generation: GenerationConfig,
    pub bind_addr: SocketAddr,
}

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    ws_state: web::Data<WsState>,
}

fn build_states(deps: &ServerDeps) -> std::io::Result<(HttpState, WsState)> {
    let users = Arc::new(DieselUserRepository::new(deps.pool.clone()));
    let sessions = Arc::new(DieselSessionRepository::new(deps.pool.clone()));
    let diagnostics = Arc::new(DieselDiagnosticRepository::new(deps.pool.clone()));
    let hasher = Arc::new(Argon2PasswordHasher::new());
    let tokens = Arc::new(JwtTokenService::with_expiry(
        &deps.token_secret,
        deps.token_expiry_minutes,
    ));
    let generator = Arc::new(
        GenerationHttpGateway::new(deps.generation.clone())
            .map_err(|err| std::io::Error::other(format!("generation client: {err}")))?,
    );

    let http_state = HttpState {
        hasher,
        tokens: tokens.clone(),
        users: users.clone(),
        sessions: sessions.clone(),
        diagnostics: diagnostics.clone(),
        generator: generator.clone(),
    };
    let ws_state = WsState {
        tokens,
        users,
        sessions,
        diagnostics,
        generator,
        registry: Arc::new(ConnectionRegistry::new()),
    };
    Ok((http_state, ws_state))
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        ws_state,
    } = deps;

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(ws_state)
        .service(register)
        .service(login)
        .service(me)
        .service(create_session)
        .service(list_sessions)
        .service(get_session)
        .service(start_diagnostic)
        .service(predict_parts)
        .service(summarize_order)
        .service(ws::diagnostics_ws)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct the HTTP server with every adapter wired.
///
/// # Errors
///
/// Propagates [`std::io::Error`] when the generation client cannot be
/// built or the socket cannot be bound.
pub fn create_server(
    health_state: web::Data<HealthState>,
    deps: ServerDeps,
) -> std::io::Result<Server> {
    let (http_state, ws_state) = build_states(&deps)?;
    let http_state = web::Data::new(http_state);
    let ws_state = web::Data::new(ws_state);

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: health_state.clone(),
            http_state: http_state.clone(),
            ws_state: ws_state.clone(),
        })
    })
    .bind(deps.bind_addr)?
    .run();

    Ok(server)
}
