//! Bearer authentication for HTTP handlers.
//!
//! Handlers take an [`AuthenticatedUser`] argument; extraction resolves the
//! `Authorization: Bearer` header through the token service and confirms
//! the identity still exists. Persistence error mapping helpers live here
//! too so the handler modules stay focused on request/response shapes.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;

use crate::domain::ports::{
    PersistenceError, TokenService as _, UserPersistenceError, UserRepository as _,
};
use crate::domain::{Error, User};

use super::error::ApiError;
use super::state::HttpState;

/// Map user persistence failures onto the domain error taxonomy.
pub(crate) fn map_user_persistence_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Conflict => Error::conflict("Email already registered"),
        UserPersistenceError::Connection { message } | UserPersistenceError::Query { message } => {
            Error::internal(message)
        }
    }
}

/// Map session/diagnostic persistence failures onto the domain error taxonomy.
pub(crate) fn map_persistence_error(error: PersistenceError) -> Error {
    match error {
        PersistenceError::Connection { message } | PersistenceError::Query { message } => {
            Error::internal(message)
        }
    }
}

fn bearer_token(header: Option<&str>) -> Result<&str, Error> {
    let value = header.ok_or_else(|| Error::unauthorized("missing bearer token"))?;
    value
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::unauthorized("missing bearer token"))
}

/// Resolve a presented token to a live user record.
pub(crate) async fn resolve_bearer_user(state: &HttpState, token: &str) -> Result<User, Error> {
    let user_id = state
        .tokens
        .resolve(token)
        .map_err(|_| Error::unauthorized("invalid or expired token"))?;
    state
        .users
        .find_by_id(user_id)
        .await
        .map_err(map_user_persistence_error)?
        .ok_or_else(|| Error::unauthorized("unknown user"))
}

/// The caller proven by a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let header = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned);

        Box::pin(async move {
            let state =
                state.ok_or_else(|| ApiError::from(Error::internal("HTTP state missing")))?;
            let token = bearer_token(header.as_deref()).map_err(ApiError::from)?;
            resolve_bearer_user(&state, token)
                .await
                .map(AuthenticatedUser)
                .map_err(ApiError::from)
        })
    }
}
