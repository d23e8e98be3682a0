use std::time::Instant;

use tracing::{Instrument, debug, info_span, warn};

/// SQLSTATE raised by Postgres when a selected column does not exist.
pub const UNDEFINED_COLUMN: &str = "42703";

pub fn is_undefined_column(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_error) => db_error.code().as_deref() == Some(UNDEFINED_COLUMN),
        _ => false,
    }
}

pub async fn log_query<F, T, R>(query_name: &str, query: F, row_counter: R) -> Result<T, sqlx::Error>
where
    F: std::future::Future<Output = Result<T, sqlx::Error>>,
    R: Fn(&T) -> Option<u64>,
{
    let span = info_span!("db_query", query = %query_name);
    let start = Instant::now();
    let result = query.instrument(span.clone()).await;
    let duration_ms = start.elapsed().as_millis();

    span.in_scope(|| match &result {
        Ok(value) => match row_counter(value) {
            Some(rows) => debug!(latency_ms = %duration_ms, rows = %rows, "Query executed successfully"),
            None => debug!(latency_ms = %duration_ms, "Query executed successfully"),
        },
        // Older schemas are probed on purpose; a missing column is expected there.
        Err(error) if is_undefined_column(error) => {
            debug!(latency_ms = %duration_ms, error = %error, "Query hit a missing column")
        }
        Err(error) => warn!(latency_ms = %duration_ms, error = ?error, "Query failed"),
    });

    result
}

#[macro_export]
macro_rules! log_query_fetch_all {
    ($name:expr, $query:expr) => {
        $crate::telemetry::database::log_query($name, $query, |rows| Some(rows.len() as u64)).await
    };
}

#[macro_export]
macro_rules! log_query_fetch_optional {
    ($name:expr, $query:expr) => {
        $crate::telemetry::database::log_query($name, $query, |row| {
            Some(u64::from(row.is_some()))
        })
        .await
    };
}

#[macro_export]
macro_rules! log_query_fetch_one {
    ($name:expr, $query:expr) => {
        $crate::telemetry::database::log_query($name, $query, |_| Some(1)).await
    };
}

#[cfg(test)]
pub(crate) mod test_errors {
    use std::{borrow::Cow, error::Error, fmt};

    use sqlx::error::{DatabaseError, ErrorKind};

    /// Database error carrying only a SQLSTATE, shaped like a Postgres one.
    #[derive(Debug)]
    struct SqlStateError {
        code: &'static str,
    }

    impl fmt::Display for SqlStateError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "database error {}", self.code)
        }
    }

    impl Error for SqlStateError {}

    impl DatabaseError for SqlStateError {
        fn message(&self) -> &str {
            "database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    pub fn with_sqlstate(code: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(SqlStateError { code }))
    }

    pub fn undefined_column() -> sqlx::Error {
        with_sqlstate(super::UNDEFINED_COLUMN)
    }
}

#[cfg(test)]
mod tests {
    use super::test_errors::{undefined_column, with_sqlstate};
    use super::*;

    #[tokio::test]
    async fn passes_through_the_query_result() {
        let ok: Result<Vec<u8>, sqlx::Error> = log_query("test.ok", async { Ok(vec![1, 2, 3]) }, |rows| {
            Some(rows.len() as u64)
        })
        .await;
        assert_eq!(ok.unwrap().len(), 3);

        let err: Result<(), sqlx::Error> =
            log_query("test.err", async { Err(sqlx::Error::PoolTimedOut) }, |_| None).await;
        assert!(matches!(err, Err(sqlx::Error::PoolTimedOut)));
    }

    #[test]
    fn detects_undefined_column_sqlstate() {
        assert!(is_undefined_column(&undefined_column()));
        // undefined_table
        assert!(!is_undefined_column(&with_sqlstate("42P01")));
    }

    #[tokio::test]
    async fn missing_column_is_passed_through_unchanged() {
        let result: Result<(), sqlx::Error> =
            log_query("test.missing_column", async { Err(undefined_column()) }, |_| None).await;
        assert!(result.as_ref().is_err_and(is_undefined_column));
    }

    #[test]
    fn non_database_errors_are_not_missing_columns() {
        assert!(!is_undefined_column(&sqlx::Error::PoolTimedOut));
        assert!(!is_undefined_column(&sqlx::Error::RowNotFound));
    }
}
