//! Transaction plumbing shared by the ledger repositories.
//!
//! Every mutation runs inside [`run_bounded`], which caps the wall-clock time
//! of the whole unit of work, and calls [`set_lock_timeout`] first thing so a
//! blocked row lock surfaces as a retryable error instead of hanging.

use std::future::Future;
use std::time::Duration;

use bursar_core::fees::{FeeError, ReversalPolicy};
use bursar_shared::LedgerConfig;
use chrono::{NaiveDate, Utc};
use sea_orm::{
    AccessMode, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr,
    IsolationLevel, SqlErr, Statement, TransactionTrait,
};
use tracing::error;

/// Ledger knobs resolved from [`LedgerConfig`].
#[derive(Debug, Clone)]
pub struct LedgerSettings {
    /// Receipt number prefix.
    pub receipt_prefix: String,
    /// Reversal window.
    pub reversal_policy: ReversalPolicy,
    /// Upper bound on one unit of work.
    pub unit_of_work_timeout: Duration,
    /// Postgres `lock_timeout` in milliseconds.
    pub lock_timeout_ms: u64,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self::from(&LedgerConfig::default())
    }
}

impl From<&LedgerConfig> for LedgerSettings {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            receipt_prefix: config.receipt_prefix.clone(),
            reversal_policy: ReversalPolicy::new(config.reversal_window_days),
            unit_of_work_timeout: Duration::from_millis(config.unit_of_work_timeout_ms),
            lock_timeout_ms: config.lock_timeout_ms,
        }
    }
}

/// Today's date in UTC.
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Postgres messages for lock_not_available, serialization_failure and
/// deadlock_detected.
const TRANSIENT_MARKERS: [&str; 3] = [
    "lock timeout",
    "could not serialize access",
    "deadlock detected",
];

/// Maps a database error onto the ledger taxonomy.
///
/// Lock timeouts, serialization failures, deadlocks and pool exhaustion are
/// transient; everything else is a database failure.
pub(crate) fn db_err(err: DbErr) -> FeeError {
    if matches!(err, DbErr::ConnectionAcquire(_)) {
        return FeeError::Timeout(err.to_string());
    }

    let message = err.to_string();
    if TRANSIENT_MARKERS.iter().any(|m| message.contains(m)) {
        return FeeError::Timeout(message);
    }

    error!(error = %message, "Database operation failed");
    FeeError::Database(message)
}

/// Returns true if the error is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Sets a transaction-local Postgres `lock_timeout`.
pub(crate) async fn set_lock_timeout(
    txn: &DatabaseTransaction,
    lock_timeout_ms: u64,
) -> Result<(), FeeError> {
    txn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT set_config('lock_timeout', $1, true)",
        [format!("{lock_timeout_ms}ms").into()],
    ))
    .await
    .map_err(db_err)?;
    Ok(())
}

/// Begins a read-only repeatable-read transaction, so every query in it sees
/// the same snapshot.
pub(crate) async fn begin_snapshot(db: &DatabaseConnection) -> Result<DatabaseTransaction, FeeError> {
    db.begin_with_config(Some(IsolationLevel::RepeatableRead), Some(AccessMode::ReadOnly))
        .await
        .map_err(db_err)
}

/// Runs a unit of work under a wall-clock timeout.
///
/// On expiry the future is dropped, which drops its open transaction and
/// rolls it back.
pub(crate) async fn run_bounded<T, F>(limit: Duration, work: F) -> Result<T, FeeError>
where
    F: Future<Output = Result<T, FeeError>>,
{
    tokio::time::timeout(limit, work)
        .await
        .map_err(|_| FeeError::Timeout(format!("unit of work exceeded {} ms", limit.as_millis())))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_config() {
        let config = LedgerConfig {
            reversal_window_days: 7,
            receipt_prefix: "SCH".to_string(),
            unit_of_work_timeout_ms: 2500,
            lock_timeout_ms: 100,
        };
        let settings = LedgerSettings::from(&config);
        assert_eq!(settings.receipt_prefix, "SCH");
        assert_eq!(settings.reversal_policy, ReversalPolicy::new(7));
        assert_eq!(settings.unit_of_work_timeout, Duration::from_millis(2500));
        assert_eq!(settings.lock_timeout_ms, 100);
    }

    #[test]
    fn test_db_err_classification() {
        let err = db_err(DbErr::Custom("canceling statement due to lock timeout".into()));
        assert!(err.is_retryable());

        let err = db_err(DbErr::Custom("relation does not exist".into()));
        assert!(matches!(err, FeeError::Database(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_run_bounded_times_out() {
        let result: Result<(), FeeError> = run_bounded(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(FeeError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_run_bounded_passes_through() {
        let result = run_bounded(Duration::from_secs(1), async { Ok::<_, FeeError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
