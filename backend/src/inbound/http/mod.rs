//! HTTP inbound adapter: stateless handlers over the domain ports.
//!
//! Each handler authenticates the caller, applies ownership filtering via
//! the repository queries, performs one unit of work, and returns a
//! response shape. Errors travel as [`ApiError`] envelopes.

pub mod auth;
pub mod error;
pub mod generation;
pub mod health;
pub mod sessions;
pub mod state;
pub mod users;

pub use error::{ApiError, ApiResult};
