use crate::domain_port::RepoError;
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::mysql::MySqlDatabaseError;

/// Timestamp columns are `DATETIME(3)`; values handed back to callers must
/// match what a later read returns.
pub fn db_timestamp(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(3)
}

pub fn is_dup_key(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db) = err {
        if let Some(mysql_err) = db.try_downcast_ref::<MySqlDatabaseError>() {
            return mysql_err.number() == 1062; // ER_DUP_ENTRY
        }
    }

    false
}

pub fn store_err(err: sqlx::Error) -> RepoError {
    if is_dup_key(&err) {
        RepoError::Duplicate
    } else {
        RepoError::Store(err.to_string())
    }
}
