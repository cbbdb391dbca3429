use chrono::TimeZone;

use super::*;

#[test]
fn test_timestamp_format_is_fixed_width_and_sortable() {
    let early = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let late = early + chrono::Duration::microseconds(1500);

    let a = format_timestamp(early);
    let b = format_timestamp(late);

    assert_eq!(a, "2024-01-02T03:04:05.000000Z");
    assert_eq!(a.len(), b.len());
    assert!(a < b);
}

#[test]
fn test_timestamp_round_trip() {
    let ts = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap()
        + chrono::Duration::microseconds(123_456);
    let parsed = parse_timestamp("t", "c", &format_timestamp(ts)).unwrap();
    assert_eq!(parsed, ts);
}

#[test]
fn test_parse_timestamp_accepts_rfc3339() {
    let parsed = parse_timestamp("t", "c", "2024-05-01T10:00:00+02:00").unwrap();
    assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap());
}

#[test]
fn test_parse_timestamp_rejects_garbage() {
    let err = parse_timestamp("sales_fact", "event_at", "yesterday").unwrap_err();
    assert!(matches!(
        err,
        StorageError::InvalidValue { ref column, .. } if column == "event_at"
    ));
}

#[test]
fn test_date_format() {
    let d = NaiveDate::from_ymd_opt(2024, 2, 9).unwrap();
    assert_eq!(format_date(d), "2024-02-09");
    assert_eq!(parse_date("t", "c", "2024-02-09").unwrap(), d);
}

#[test]
fn test_value_helpers() {
    assert_eq!(as_str(&text("abc")), Some("abc"));
    assert_eq!(as_str(&opt_text(None)), None);
    assert_eq!(flag(true), Value::BigInt(Some(1)));
    assert_eq!(null(ColumnType::Double), Value::Double(None));
}

#[test]
fn test_check_row_rejects_wrong_arity() {
    let row = WarehouseRow::new("c1", None, vec![text("c1")]);
    assert!(matches!(
        check_row(WarehouseTable::DimCustomer, &row),
        Err(StorageError::ColumnMismatch { expected: 9, actual: 1, .. })
    ));
}
