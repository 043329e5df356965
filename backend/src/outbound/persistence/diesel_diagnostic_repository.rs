//! PostgreSQL-backed `DiagnosticRepository` implementation using Diesel.
//!
//! Persists the artefacts generated against a session: diagnostic results,
//! part predictions, technician notes, and repair summaries. Ownership of
//! the parent session is established by the caller before these run.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{DiagnosticRepository, PersistenceError};
use crate::domain::{DiagnosticResult, PartForecast, PartPrediction, RepairSummary, SessionId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{
    DiagnosticResultRow, NewDiagnosticResultRow, NewPartPredictionRow, NewRepairNoteRow,
    NewRepairSummaryRow, PartPredictionRow, RepairSummaryRow,
};
use super::pool::DbPool;
use super::schema::{diagnostic_results, part_predictions, repair_notes, repair_summaries};

/// Diesel-backed implementation of the diagnostic artefact repository port.
#[derive(Clone)]
pub struct DieselDiagnosticRepository {
    pool: DbPool,
}

impl DieselDiagnosticRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_error(error: diesel::result::Error) -> PersistenceError {
    map_diesel_error(error, PersistenceError::query, PersistenceError::connection)
}

#[async_trait]
impl DiagnosticRepository for DieselDiagnosticRepository {
    async fn record_result(
        &self,
        session_id: SessionId,
        input_message: &str,
        output_text: &str,
    ) -> Result<DiagnosticResult, PersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, PersistenceError::connection))?;

        let new_row = NewDiagnosticResultRow {
            session_id: session_id.as_i32(),
            input_message,
            output_text,
        };

        diesel::insert_into(diagnostic_results::table)
            .values(&new_row)
            .returning(DiagnosticResultRow::as_returning())
            .get_result::<DiagnosticResultRow>(&mut conn)
            .await
            .map(DiagnosticResult::from)
            .map_err(map_error)
    }

    async fn results_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<DiagnosticResult>, PersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, PersistenceError::connection))?;

        diagnostic_results::table
            .filter(diagnostic_results::session_id.eq(session_id.as_i32()))
            .order(diagnostic_results::id.asc())
            .select(DiagnosticResultRow::as_select())
            .load::<DiagnosticResultRow>(&mut conn)
            .await
            .map(|rows| rows.into_iter().map(DiagnosticResult::from).collect())
            .map_err(map_error)
    }

    async fn first_result(
        &self,
        session_id: SessionId,
    ) -> Result<Option<DiagnosticResult>, PersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, PersistenceError::connection))?;

        diagnostic_results::table
            .filter(diagnostic_results::session_id.eq(session_id.as_i32()))
            .order(diagnostic_results::id.asc())
            .select(DiagnosticResultRow::as_select())
            .first::<DiagnosticResultRow>(&mut conn)
            .await
            .optional()
            .map(|row| row.map(DiagnosticResult::from))
            .map_err(map_error)
    }

    async fn record_predictions(
        &self,
        session_id: SessionId,
        forecasts: &[PartForecast],
    ) -> Result<Vec<PartPrediction>, PersistenceError> {
        if forecasts.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, PersistenceError::connection))?;

        let new_rows: Vec<NewPartPredictionRow<'_>> = forecasts
            .iter()
            .map(|forecast| NewPartPredictionRow {
                session_id: session_id.as_i32(),
                part_name: forecast.name.as_str(),
                confidence_score: forecast.confidence,
                price_estimate: forecast.price.as_deref(),
            })
            .collect();

        // One multi-row insert keeps the write atomic without an explicit
        // transaction.
        diesel::insert_into(part_predictions::table)
            .values(&new_rows)
            .returning(PartPredictionRow::as_returning())
            .get_results::<PartPredictionRow>(&mut conn)
            .await
            .map(|rows| rows.into_iter().map(PartPrediction::from).collect())
            .map_err(map_error)
    }

    async fn parts_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<PartPrediction>, PersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, PersistenceError::connection))?;

        part_predictions::table
            .filter(part_predictions::session_id.eq(session_id.as_i32()))
            .order(part_predictions::id.asc())
            .select(PartPredictionRow::as_select())
            .load::<PartPredictionRow>(&mut conn)
            .await
            .map(|rows| rows.into_iter().map(PartPrediction::from).collect())
            .map_err(map_error)
    }

    async fn record_note(
        &self,
        session_id: SessionId,
        note_text: &str,
    ) -> Result<(), PersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, PersistenceError::connection))?;

        let new_row = NewRepairNoteRow {
            session_id: session_id.as_i32(),
            note_text,
        };

        diesel::insert_into(repair_notes::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_error)
    }

    async fn record_summary(
        &self,
        session_id: SessionId,
        summary_text: &str,
    ) -> Result<RepairSummary, PersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, PersistenceError::connection))?;

        let new_row = NewRepairSummaryRow {
            session_id: session_id.as_i32(),
            summary_text,
        };

        diesel::insert_into(repair_summaries::table)
            .values(&new_row)
            .returning(RepairSummaryRow::as_returning())
            .get_result::<RepairSummaryRow>(&mut conn)
            .await
            .map(RepairSummary::from)
            .map_err(map_error)
    }

    async fn first_summary(
        &self,
        session_id: SessionId,
    ) -> Result<Option<RepairSummary>, PersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, PersistenceError::connection))?;

        repair_summaries::table
            .filter(repair_summaries::session_id.eq(session_id.as_i32()))
            .order(repair_summaries::id.asc())
            .select(RepairSummaryRow::as_select())
            .first::<RepairSummaryRow>(&mut conn)
            .await
            .optional()
            .map(|row| row.map(RepairSummary::from))
            .map_err(map_error)
    }
}
