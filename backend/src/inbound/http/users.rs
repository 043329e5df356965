//! Registration, login, and current-user handlers.
//!
//! ```text
//! POST /auth/register {"email":"ada@example.com","password":"secret"}
//! POST /auth/login    {"username":"ada@example.com","password":"secret"}
//! GET  /auth/me       (bearer)
//! ```

use actix_web::{get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::{PasswordHasher as _, TokenService as _, UserRepository as _};
use crate::domain::{CredentialValidationError, Credentials, Error, User};

use super::auth::{map_user_persistence_error, AuthenticatedUser};
use super::error::ApiResult;
use super::state::HttpState;

/// Registration request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Login request body. The `username` field carries the email, mirroring
/// password-grant conventions.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Public view of an account.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.as_i32(),
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Issued bearer credential.
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

fn map_credential_validation_error(err: CredentialValidationError) -> Error {
    let (field, code) = match err {
        CredentialValidationError::EmptyEmail => ("email", "empty_email"),
        CredentialValidationError::MalformedEmail => ("email", "malformed_email"),
        CredentialValidationError::EmptyPassword => ("password", "empty_password"),
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

fn invalid_credentials() -> Error {
    Error::unauthorized("Incorrect email or password")
}

/// Register a new account.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid payload or email already registered"),
    ),
    tags = ["auth"],
    security([])
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let payload = payload.into_inner();
    let credentials = Credentials::try_from_parts(&payload.email, &payload.password)
        .map_err(map_credential_validation_error)?;

    let password_hash = state
        .hasher
        .hash(credentials.password())
        .map_err(|err| Error::internal(err.to_string()))?;

    let user = state
        .users
        .create(credentials.email(), &password_hash)
        .await
        .map_err(map_user_persistence_error)?;

    Ok(web::Json(UserResponse::from(user)))
}

/// Authenticate and issue a bearer token.
///
/// Unknown emails and wrong passwords are indistinguishable to the caller.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Bad credentials"),
    ),
    tags = ["auth"],
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<TokenResponse>> {
    let LoginRequest { username, password } = payload.into_inner();

    let user = state
        .users
        .find_by_email(&username)
        .await
        .map_err(map_user_persistence_error)?
        .ok_or_else(invalid_credentials)?;

    if !state.hasher.verify(&password, &user.password_hash) {
        return Err(invalid_credentials().into());
    }

    let access_token = state
        .tokens
        .issue(user.id)
        .map_err(|err| Error::internal(err.to_string()))?;

    Ok(web::Json(TokenResponse {
        access_token,
        token_type: "bearer".to_owned(),
    }))
}

/// Return the authenticated caller's account.
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorised"),
    ),
    tags = ["auth"]
)]
#[get("/auth/me")]
pub async fn me(user: AuthenticatedUser) -> web::Json<UserResponse> {
    web::Json(UserResponse::from(user.0))
}
