//! Shared storage helper functions.
//!
//! Warehouse timestamps are stored as fixed-width UTC text so lexical order
//! equals chronological order on every backend. Dates use `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sea_query::Value;

use crate::interfaces::{Result, StorageError};
use crate::model::{ColumnType, WarehouseRow, WarehouseTable};

/// Stored timestamp format, microsecond precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";
/// Stored date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format a timestamp for storage.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp.
pub fn parse_timestamp(table: &str, column: &str, raw: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)))
        .map_err(|_| invalid(table, column, raw))
}

/// Format a date for storage and as a `dim_date` key.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a stored date.
pub fn parse_date(table: &str, column: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| invalid(table, column, raw))
}

fn invalid(table: &str, column: &str, raw: &str) -> StorageError {
    StorageError::InvalidValue {
        table: table.to_string(),
        column: column.to_string(),
        value: raw.to_string(),
    }
}

pub fn text(value: impl Into<String>) -> Value {
    Value::String(Some(Box::new(value.into())))
}

pub fn opt_text(value: Option<&str>) -> Value {
    Value::String(value.map(|v| Box::new(v.to_string())))
}

pub fn double(value: f64) -> Value {
    Value::Double(Some(value))
}

pub fn opt_double(value: Option<f64>) -> Value {
    Value::Double(value)
}

pub fn bigint(value: i64) -> Value {
    Value::BigInt(Some(value))
}

/// Booleans are stored as 0/1 integers.
pub fn flag(value: bool) -> Value {
    Value::BigInt(Some(i64::from(value)))
}

pub fn timestamp(ts: DateTime<Utc>) -> Value {
    text(format_timestamp(ts))
}

pub fn opt_timestamp(ts: Option<DateTime<Utc>>) -> Value {
    Value::String(ts.map(|t| Box::new(format_timestamp(t))))
}

pub fn date(d: NaiveDate) -> Value {
    text(format_date(d))
}

pub fn opt_date(d: Option<NaiveDate>) -> Value {
    Value::String(d.map(|v| Box::new(format_date(v))))
}

/// Typed NULL for a column.
pub fn null(ty: ColumnType) -> Value {
    match ty {
        ColumnType::Text => Value::String(None),
        ColumnType::Double => Value::Double(None),
        ColumnType::BigInt => Value::BigInt(None),
    }
}

/// Borrow a non-null text value.
pub fn as_str(value: &Value) -> Option<&str> {
    match value {
        Value::String(Some(s)) => Some(s.as_str()),
        _ => None,
    }
}

/// Reject rows whose value count does not match the table.
pub fn check_row(table: WarehouseTable, row: &WarehouseRow) -> Result<()> {
    let expected = table.columns().len();
    if row.values.len() != expected {
        return Err(StorageError::ColumnMismatch {
            table: table.name().to_string(),
            expected,
            actual: row.values.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests;
