//! PostgreSQL-backed `SessionRepository` implementation using Diesel.
//!
//! Every read filters on the owning user id so an unowned session is
//! indistinguishable from a missing one at this layer already.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{PersistenceError, SessionRepository};
use crate::domain::{DiagnosticSession, SessionId, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewSessionRow, SessionRow};
use super::pool::DbPool;
use super::schema::sessions;

/// Diesel-backed implementation of the session repository port.
#[derive(Clone)]
pub struct DieselSessionRepository {
    pool: DbPool,
}

impl DieselSessionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_error(error: diesel::result::Error) -> PersistenceError {
    map_diesel_error(error, PersistenceError::query, PersistenceError::connection)
}

#[async_trait]
impl SessionRepository for DieselSessionRepository {
    async fn create(
        &self,
        user_id: UserId,
        input_text: Option<&str>,
    ) -> Result<DiagnosticSession, PersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, PersistenceError::connection))?;

        let new_row = NewSessionRow {
            user_id: user_id.as_i32(),
            input_text,
        };

        diesel::insert_into(sessions::table)
            .values(&new_row)
            .returning(SessionRow::as_returning())
            .get_result::<SessionRow>(&mut conn)
            .await
            .map(DiagnosticSession::from)
            .map_err(map_error)
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<DiagnosticSession>, PersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, PersistenceError::connection))?;

        sessions::table
            .filter(sessions::user_id.eq(user_id.as_i32()))
            .order(sessions::created_at.desc())
            .select(SessionRow::as_select())
            .load::<SessionRow>(&mut conn)
            .await
            .map(|rows| rows.into_iter().map(DiagnosticSession::from).collect())
            .map_err(map_error)
    }

    async fn find_owned(
        &self,
        session_id: SessionId,
        user_id: UserId,
    ) -> Result<Option<DiagnosticSession>, PersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, PersistenceError::connection))?;

        sessions::table
            .filter(sessions::id.eq(session_id.as_i32()))
            .filter(sessions::user_id.eq(user_id.as_i32()))
            .select(SessionRow::as_select())
            .first::<SessionRow>(&mut conn)
            .await
            .optional()
            .map(|row| row.map(DiagnosticSession::from))
            .map_err(map_error)
    }

    async fn update_input(
        &self,
        session_id: SessionId,
        input_text: &str,
    ) -> Result<(), PersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, PersistenceError::connection))?;

        diesel::update(sessions::table.filter(sessions::id.eq(session_id.as_i32())))
            .set(sessions::input_text.eq(Some(input_text)))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_error)
    }
}
