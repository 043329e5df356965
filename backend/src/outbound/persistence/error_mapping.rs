//! Shared Diesel error mapping for the repository adapters.

use tracing::debug;

use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error constructor.
pub(crate) fn map_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map common Diesel error variants into query/connection constructors.
///
/// Unique-violation handling stays with the callers that care about it; this
/// helper captures the repeated mapping where everything else collapses into
/// a query or connection failure.
pub(crate) fn map_diesel_error<E, Q, C>(error: diesel::result::Error, query: Q, connection: C) -> E
where
    Q: Fn(&'static str) -> E,
    C: Fn(&'static str) -> E,
{
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        DieselError::DatabaseError(_, _) => query("database error"),
        _ => query("database error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::PersistenceError;
    use rstest::rstest;

    fn map(error: diesel::result::Error) -> PersistenceError {
        map_diesel_error(
            error,
            PersistenceError::query,
            PersistenceError::connection,
        )
    }

    #[rstest]
    fn not_found_maps_to_query_error() {
        assert!(matches!(
            map(diesel::result::Error::NotFound),
            PersistenceError::Query { .. }
        ));
    }

    #[rstest]
    fn closed_connection_maps_to_connection_error() {
        let error = diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::ClosedConnection,
            Box::new("gone".to_owned()),
        );
        assert!(matches!(map(error), PersistenceError::Connection { .. }));
    }

    #[rstest]
    fn pool_errors_map_to_connection_error() {
        let mapped: PersistenceError =
            map_pool_error(PoolError::checkout("timed out"), PersistenceError::connection);
        assert!(matches!(mapped, PersistenceError::Connection { .. }));
    }
}
