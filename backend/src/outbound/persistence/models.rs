//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations; conversion into domain
//! entities happens in the repository adapters.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::{
    DiagnosticResult, DiagnosticSession, PartPrediction, RepairSummary, SessionId, User, UserId,
};

use super::schema::{
    diagnostic_results, part_predictions, repair_notes, repair_summaries, sessions, users,
};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
}

/// Row struct for reading from the sessions table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SessionRow {
    pub id: i32,
    pub user_id: i32,
    pub input_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<SessionRow> for DiagnosticSession {
    fn from(row: SessionRow) -> Self {
        Self {
            id: SessionId::new(row.id),
            user_id: UserId::new(row.user_id),
            input_text: row.input_text,
            created_at: row.created_at,
        }
    }
}

/// Insertable struct for creating new session records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sessions)]
pub(crate) struct NewSessionRow<'a> {
    pub user_id: i32,
    pub input_text: Option<&'a str>,
}

/// Row struct for reading from the diagnostic_results table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = diagnostic_results)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DiagnosticResultRow {
    pub id: i32,
    pub session_id: i32,
    pub input_message: String,
    pub output_text: String,
    pub created_at: DateTime<Utc>,
}

impl From<DiagnosticResultRow> for DiagnosticResult {
    fn from(row: DiagnosticResultRow) -> Self {
        Self {
            id: row.id,
            session_id: SessionId::new(row.session_id),
            input_message: row.input_message,
            output_text: row.output_text,
            created_at: row.created_at,
        }
    }
}

/// Insertable struct for recording a completed generation.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = diagnostic_results)]
pub(crate) struct NewDiagnosticResultRow<'a> {
    pub session_id: i32,
    pub input_message: &'a str,
    pub output_text: &'a str,
}

/// Row struct for reading from the part_predictions table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = part_predictions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PartPredictionRow {
    pub id: i32,
    pub session_id: i32,
    pub part_name: String,
    pub confidence_score: f64,
    pub selected: bool,
    pub price_estimate: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<PartPredictionRow> for PartPrediction {
    fn from(row: PartPredictionRow) -> Self {
        Self {
            id: row.id,
            session_id: SessionId::new(row.session_id),
            part_name: row.part_name,
            confidence_score: row.confidence_score,
            selected: row.selected,
            price_estimate: row.price_estimate,
            created_at: row.created_at,
        }
    }
}

/// Insertable struct for recording part forecasts.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = part_predictions)]
pub(crate) struct NewPartPredictionRow<'a> {
    pub session_id: i32,
    pub part_name: &'a str,
    pub confidence_score: f64,
    pub price_estimate: Option<&'a str>,
}

/// Insertable struct for appending technician notes.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = repair_notes)]
pub(crate) struct NewRepairNoteRow<'a> {
    pub session_id: i32,
    pub note_text: &'a str,
}

/// Row struct for reading from the repair_summaries table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = repair_summaries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RepairSummaryRow {
    pub id: i32,
    pub session_id: i32,
    pub summary_text: String,
    pub created_at: DateTime<Utc>,
}

impl From<RepairSummaryRow> for RepairSummary {
    fn from(row: RepairSummaryRow) -> Self {
        Self {
            id: row.id,
            session_id: SessionId::new(row.session_id),
            summary_text: row.summary_text,
            created_at: row.created_at,
        }
    }
}

/// Insertable struct for recording generated summaries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = repair_summaries)]
pub(crate) struct NewRepairSummaryRow<'a> {
    pub session_id: i32,
    pub summary_text: &'a str,
}
