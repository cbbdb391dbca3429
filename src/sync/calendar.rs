//! `dim_date` generation.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Deserialize;

use crate::model::WarehouseRow;
use crate::storage::helpers::{bigint, flag, format_date, text};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Calendar window covered by `dim_date`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CalendarOptions {
    /// First generated day, inclusive.
    pub start: NaiveDate,
    /// Last generated day, inclusive.
    pub end: NaiveDate,
    /// Month (1-12) the fiscal year starts in.
    pub fiscal_year_start_month: u32,
}

impl Default for CalendarOptions {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2030, 12, 31).unwrap_or_default(),
            fiscal_year_start_month: 1,
        }
    }
}

impl CalendarOptions {
    /// Days in the window; 0 when inverted.
    pub fn days(&self) -> u64 {
        u64::try_from((self.end - self.start).num_days() + 1).unwrap_or(0)
    }

    /// Fiscal year and quarter of a date.
    ///
    /// A fiscal year not starting in January is named after the calendar
    /// year it ends in.
    pub fn fiscal(&self, date: NaiveDate) -> (i32, u32) {
        let start = self.fiscal_year_start_month.clamp(1, 12);
        let year = if start > 1 && date.month() >= start {
            date.year() + 1
        } else {
            date.year()
        };
        let offset = (date.month() + 12 - start) % 12;
        (year, offset / 3 + 1)
    }
}

fn day_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// One `dim_date` row.
pub fn date_row(options: &CalendarOptions, date: NaiveDate) -> WarehouseRow {
    let key = format_date(date);
    let weekday = date.weekday();
    let (fiscal_year, fiscal_quarter) = options.fiscal(date);
    let month_index = date.month0() as usize;

    WarehouseRow::new(
        key.clone(),
        None,
        vec![
            text(key),
            bigint(i64::from(date.year())),
            bigint(i64::from(date.month0() / 3 + 1)),
            bigint(i64::from(date.month())),
            text(MONTH_NAMES[month_index]),
            bigint(i64::from(date.iso_week().week())),
            bigint(i64::from(date.day())),
            bigint(i64::from(weekday.num_days_from_sunday())),
            text(day_name(weekday)),
            flag(matches!(weekday, Weekday::Sat | Weekday::Sun)),
            bigint(i64::from(fiscal_year)),
            bigint(i64::from(fiscal_quarter)),
        ],
    )
}

/// Every day of the window, in order.
pub fn calendar_rows(options: &CalendarOptions) -> Vec<WarehouseRow> {
    options
        .start
        .iter_days()
        .take_while(|d| *d <= options.end)
        .map(|d| date_row(options, d))
        .collect()
}
