//! Query parameters and result shapes for the analytics read path.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::QueryError;

/// Default number of ranked items.
pub const DEFAULT_LIMIT: u32 = 20;
/// Largest accepted ranking limit.
pub const MAX_LIMIT: u32 = 100;

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, QueryError> {
        if start > end {
            return Err(QueryError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Number of days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// The range of equal length ending the day before `start`.
    pub fn prior(&self) -> DateRange {
        let end = self.start - Duration::days(1);
        let start = end - Duration::days(self.days() - 1);
        DateRange { start, end }
    }

    pub fn start_key(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_key(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

/// Time-series bucket width.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Daily,
    /// ISO weeks, starting Monday.
    Weekly,
    Monthly,
}

impl Granularity {
    /// First day of the bucket containing `date`.
    pub fn bucket_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Daily => date,
            Granularity::Weekly => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            Granularity::Monthly => date.with_day(1).unwrap_or(date),
        }
    }
}

impl FromStr for Granularity {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "daily" => Ok(Granularity::Daily),
            "weekly" => Ok(Granularity::Weekly),
            "monthly" => Ok(Granularity::Monthly),
            other => Err(QueryError::InvalidGranularity(other.to_string())),
        }
    }
}

/// Common analytics query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub granularity: Granularity,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl QueryParams {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            granularity: Granularity::Daily,
            limit: None,
        }
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn range(&self) -> Result<DateRange, QueryError> {
        DateRange::new(self.start_date, self.end_date)
    }

    /// Requested limit, defaulting to 20 and clamped to `[1, 100]`.
    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// How a series metric folds its per-day `(sum, count)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Sum,
    Count,
    Mean,
}

impl Aggregation {
    pub fn value(self, sum: f64, count: u64) -> f64 {
        match self {
            Aggregation::Sum => sum,
            Aggregation::Count => count as f64,
            Aggregation::Mean if count == 0 => 0.0,
            Aggregation::Mean => sum / count as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesMetric {
    /// Sales line totals in base currency.
    Revenue,
    /// Purchase line totals in base currency.
    ProcurementSpend,
    /// Number of stock movements.
    InventoryMovement,
    /// Debit minus credit in base currency.
    LedgerBalance,
    /// Mean worked hours per attendance record.
    AttendanceHours,
}

impl SeriesMetric {
    pub fn aggregation(self) -> Aggregation {
        match self {
            SeriesMetric::Revenue | SeriesMetric::ProcurementSpend | SeriesMetric::LedgerBalance => {
                Aggregation::Sum
            }
            SeriesMetric::InventoryMovement => Aggregation::Count,
            SeriesMetric::AttendanceHours => Aggregation::Mean,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    /// Articles by revenue; quantity is units sold.
    TopProducts,
    /// Customers by revenue; quantity is distinct orders.
    TopCustomers,
    /// Suppliers by spend; quantity is distinct purchase orders.
    TopSuppliers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiMetric {
    Revenue,
    Orders,
    ProcurementSpend,
    InventoryMovements,
    /// Share of `PRESENT`/`LATE` attendance records, in percent.
    AttendanceRate,
}

impl KpiMetric {
    pub fn label(self) -> &'static str {
        match self {
            KpiMetric::Revenue => "Revenue",
            KpiMetric::Orders => "Orders",
            KpiMetric::ProcurementSpend => "Procurement Spend",
            KpiMetric::InventoryMovements => "Inventory Movements",
            KpiMetric::AttendanceRate => "Attendance Rate",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            KpiMetric::Revenue | KpiMetric::ProcurementSpend => "currency",
            KpiMetric::Orders | KpiMetric::InventoryMovements => "count",
            KpiMetric::AttendanceRate => "percentage",
        }
    }
}

/// One day's raw aggregate as returned by a reader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub sum: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub date: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedItem {
    pub id: String,
    pub name: String,
    pub value: f64,
    pub quantity: i64,
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewKpi {
    pub label: String,
    pub value: f64,
    /// Percentage change versus the prior period; 0 when the prior value is 0.
    pub change: f64,
    pub prior_value: f64,
    pub unit: String,
}

impl OverviewKpi {
    pub fn new(metric: KpiMetric, value: f64, prior_value: f64) -> Self {
        let change = if prior_value > 0.0 {
            (value - prior_value) / prior_value * 100.0
        } else {
            0.0
        };
        Self {
            label: metric.label().to_string(),
            value,
            change,
            prior_value,
            unit: metric.unit().to_string(),
        }
    }
}

/// Cross-module KPI summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub revenue: OverviewKpi,
    pub orders: OverviewKpi,
    pub procurement_spend: OverviewKpi,
    pub inventory_movements: OverviewKpi,
    pub attendance: OverviewKpi,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_effective_limit_defaults_and_clamps() {
        let params = QueryParams::new(date(2024, 1, 1), date(2024, 1, 31));
        assert_eq!(params.effective_limit(), 20);
        assert_eq!(params.clone().with_limit(0).effective_limit(), 1);
        assert_eq!(params.clone().with_limit(7).effective_limit(), 7);
        assert_eq!(params.with_limit(500).effective_limit(), 100);
    }

    #[test]
    fn test_range_rejects_inverted_dates() {
        let params = QueryParams::new(date(2024, 2, 1), date(2024, 1, 1));
        assert!(matches!(params.range(), Err(QueryError::InvalidRange { .. })));
    }

    #[test]
    fn test_prior_range_has_equal_length() {
        let range = DateRange::new(date(2024, 3, 1), date(2024, 3, 10)).unwrap();
        let prior = range.prior();
        assert_eq!(prior.start, date(2024, 2, 20));
        assert_eq!(prior.end, date(2024, 2, 29));
        assert_eq!(prior.days(), range.days());
    }

    #[test]
    fn test_bucket_start() {
        // 2024-05-16 is a Thursday
        let d = date(2024, 5, 16);
        assert_eq!(Granularity::Daily.bucket_start(d), d);
        assert_eq!(Granularity::Weekly.bucket_start(d), date(2024, 5, 13));
        assert_eq!(Granularity::Monthly.bucket_start(d), date(2024, 5, 1));
    }

    #[test]
    fn test_granularity_parse() {
        assert_eq!("weekly".parse::<Granularity>().unwrap(), Granularity::Weekly);
        assert_eq!("".parse::<Granularity>().unwrap(), Granularity::Daily);
        assert!("hourly".parse::<Granularity>().is_err());
    }

    #[test]
    fn test_kpi_change() {
        let kpi = OverviewKpi::new(KpiMetric::Revenue, 150.0, 100.0);
        assert_eq!(kpi.change, 50.0);
        let flat = OverviewKpi::new(KpiMetric::Orders, 3.0, 0.0);
        assert_eq!(flat.change, 0.0);
        assert_eq!(flat.unit, "count");
    }
}
