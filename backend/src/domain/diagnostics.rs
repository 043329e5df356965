//! Diagnostic session entities.
//!
//! A session is a persisted conversation thread tied to one user; it is not
//! a network connection. Generated artefacts (results, part predictions,
//! repair summaries) hang off a session and are never updated or deleted;
//! only `input_text` is overwritten, once per new diagnostic request.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::users::UserId;

/// Opaque integer key identifying a diagnostic session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(i32);

impl SessionId {
    /// Wrap a raw database key.
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    /// Raw key for persistence adapters.
    pub fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One diagnostic conversation thread owned by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticSession {
    pub id: SessionId,
    pub user_id: UserId,
    /// Latest raw symptom text; overwritten on every new diagnostic request.
    pub input_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One completed generation: the symptom text at generation time and the
/// fully assembled model response. A session accumulates one per completed
/// generation.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticResult {
    pub id: i32,
    pub session_id: SessionId,
    pub input_message: String,
    pub output_text: String,
    pub created_at: DateTime<Utc>,
}

/// A part the model expects to need replacing, as produced by the
/// generation gateway before persistence assigns a key.
#[derive(Debug, Clone, PartialEq)]
pub struct PartForecast {
    pub name: String,
    /// Always within `[0, 1]`; the gateway clamps before handing over.
    pub confidence: f64,
    /// Free-form price estimate, e.g. a range.
    pub price: Option<String>,
}

/// A persisted part prediction attached to a session.
#[derive(Debug, Clone, PartialEq)]
pub struct PartPrediction {
    pub id: i32,
    pub session_id: SessionId,
    pub part_name: String,
    pub confidence_score: f64,
    /// Kept-in-the-final-order flag; defaults to true.
    pub selected: bool,
    pub price_estimate: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A customer-facing narrative generated for a session.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairSummary {
    pub id: i32,
    pub session_id: SessionId,
    pub summary_text: String,
    pub created_at: DateTime<Utc>,
}
