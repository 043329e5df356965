//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are
//! used by Diesel for compile-time query validation and type-safe SQL
//! generation; regenerate with `diesel print-schema` after changing the
//! migrations.

diesel::table! {
    /// Registered accounts.
    users (id) {
        id -> Int4,
        email -> Text,
        password_hash -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Diagnostic sessions, one owner each.
    sessions (id) {
        id -> Int4,
        user_id -> Int4,
        input_text -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per completed streamed generation.
    diagnostic_results (id) {
        id -> Int4,
        session_id -> Int4,
        input_message -> Text,
        output_text -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Parts the model expects to need replacing.
    part_predictions (id) {
        id -> Int4,
        session_id -> Int4,
        part_name -> Text,
        confidence_score -> Float8,
        selected -> Bool,
        price_estimate -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only technician notes.
    repair_notes (id) {
        id -> Int4,
        session_id -> Int4,
        note_text -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Customer-facing repair narratives.
    repair_summaries (id) {
        id -> Int4,
        session_id -> Int4,
        summary_text -> Text,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(sessions -> users (user_id));
diesel::joinable!(diagnostic_results -> sessions (session_id));
diesel::joinable!(part_predictions -> sessions (session_id));
diesel::joinable!(repair_notes -> sessions (session_id));
diesel::joinable!(repair_summaries -> sessions (session_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    sessions,
    diagnostic_results,
    part_predictions,
    repair_notes,
    repair_summaries,
);
