//! Conversions between database rows and domain values.

use chrono::{DateTime, Utc};
use ledgerkeep_core::persistence::StoreError;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{DbErr, SqlErr};

pub(crate) fn to_utc(at: DateTimeWithTimeZone) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

pub(crate) fn to_utc_opt(at: Option<DateTimeWithTimeZone>) -> Option<DateTime<Utc>> {
    at.map(to_utc)
}

pub(crate) fn to_db(at: DateTime<Utc>) -> DateTimeWithTimeZone {
    at.into()
}

pub(crate) fn to_db_opt(at: Option<DateTime<Utc>>) -> Option<DateTimeWithTimeZone> {
    at.map(to_db)
}

pub(crate) fn to_i64(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

pub(crate) fn to_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

/// Parses a stored enum column.
pub(crate) fn parse_column<T>(
    column: &'static str,
    value: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T, StoreError> {
    parse(value).ok_or_else(|| StoreError::Backend(format!("invalid {column} {value:?} in database")))
}

/// Maps a database error, turning unique violations into conflicts.
pub(crate) fn store_error(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => StoreError::Conflict(detail),
        _ => StoreError::Backend(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_round_trip_keeps_instant() {
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 23, 59, 59).unwrap();
        assert_eq!(to_utc(to_db(at)), at);
    }

    #[test]
    fn test_counts_saturate() {
        assert_eq!(to_i64(u64::MAX), i64::MAX);
        assert_eq!(to_u64(-1), 0);
        assert_eq!(to_u64(42), 42);
    }

    #[test]
    fn test_parse_column_reports_value() {
        let err = parse_column("status", "NOPE", |_| None::<u8>).unwrap_err();
        assert!(err.to_string().contains("\"NOPE\""));
    }

    #[test]
    fn test_plain_error_is_backend() {
        let err = store_error(DbErr::Custom("boom".into()));
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
