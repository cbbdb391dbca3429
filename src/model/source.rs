//! Operational store records.
//!
//! One struct per source entity, shaped after the ERP tables they are read
//! from. Every record carries `changed_at`, the change-tracking timestamp
//! (`COALESCE(updated_at, created_at)`) used for incremental extraction.

use chrono::{DateTime, NaiveDate, Utc};

/// Common accessors used by the loaders for ordering and watermarking.
pub trait SourceRecord: Send + Sync {
    /// Operational primary key, reused as the warehouse natural key.
    fn source_id(&self) -> &str;

    /// Change-tracking timestamp; the watermark basis.
    fn changed_at(&self) -> DateTime<Utc>;
}

macro_rules! impl_source_record {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SourceRecord for $ty {
                fn source_id(&self) -> &str {
                    &self.id
                }

                fn changed_at(&self) -> DateTime<Utc> {
                    self.changed_at
                }
            }
        )*
    };
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct CustomerRecord {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub customer_type: Option<String>,
    pub status: Option<String>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct SupplierRecord {
    pub id: String,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub supplier_type: Option<String>,
    pub status: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// Article joined with its classification, color and model names.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct ArticleRecord {
    pub id: String,
    pub barcode: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub classification_id: Option<String>,
    pub classification_name: Option<String>,
    pub color_id: Option<String>,
    pub color_name: Option<String>,
    pub model_id: Option<String>,
    pub model_name: Option<String>,
    pub price: f64,
    pub cost: f64,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct WarehouseRecord {
    pub id: String,
    pub code: Option<String>,
    pub name: String,
    pub city: Option<String>,
    pub warehouse_type: Option<String>,
    pub status: Option<String>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct EmployeeRecord {
    pub id: String,
    pub employee_code: Option<String>,
    pub employee_name: String,
    pub department: Option<String>,
    pub position: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub employment_status: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// One sales line: either a whole sales order (`source_type = "sales_order"`)
/// or a single POS item (`source_type = "pos"`).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct SalesRecord {
    pub id: String,
    pub source_type: String,
    pub order_id: String,
    pub transaction_at: DateTime<Utc>,
    pub customer_id: Option<String>,
    pub article_id: Option<String>,
    pub warehouse_id: Option<String>,
    pub cashier_id: Option<String>,
    pub quantity: i64,
    pub unit_price: f64,
    pub discount_amount: f64,
    pub tax_amount: f64,
    pub line_total: f64,
    pub order_total: f64,
    pub status: String,
    pub payment_method: String,
    pub payment_status: String,
    pub changed_at: DateTime<Utc>,
}

/// Purchase order line joined with its header.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct ProcurementRecord {
    pub id: String,
    pub po_id: String,
    pub po_number: String,
    pub transaction_at: DateTime<Utc>,
    pub supplier_id: Option<String>,
    pub article_id: Option<String>,
    pub created_by_id: Option<String>,
    pub quantity: i64,
    pub received_quantity: i64,
    pub unit_price: f64,
    pub line_total: f64,
    pub order_total: f64,
    pub currency: String,
    pub status: String,
    pub payment_status: String,
    pub payment_terms: String,
    pub purchase_request_id: Option<String>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct InventoryMovementRecord {
    pub id: String,
    pub movement_at: DateTime<Utc>,
    pub article_id: Option<String>,
    pub warehouse_id: Option<String>,
    pub quantity: i64,
    pub unit_cost: f64,
    pub movement_type: String,
    pub reference_id: String,
    pub reference_type: String,
    pub changed_at: DateTime<Utc>,
}

/// Journal entry line joined with its entry and chart-of-accounts row.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct FinancialRecord {
    pub id: String,
    pub journal_entry_id: String,
    pub entry_number: String,
    pub entry_date: NaiveDate,
    pub account_id: Option<String>,
    pub account_code: String,
    pub account_name: String,
    pub company_id: String,
    pub description: String,
    pub debit_amount: f64,
    pub credit_amount: f64,
    pub currency_code: String,
    pub exchange_rate: f64,
    pub source_module: String,
    pub source_id: String,
    pub status: String,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct AttendanceRecord {
    pub id: String,
    pub attendance_date: NaiveDate,
    pub employee_id: Option<String>,
    pub clock_in: Option<DateTime<Utc>>,
    pub clock_out: Option<DateTime<Utc>>,
    pub work_hours: f64,
    pub overtime_hours: f64,
    pub late_minutes: i64,
    pub early_out_minutes: i64,
    pub status: String,
    pub changed_at: DateTime<Utc>,
}

impl_source_record!(
    CustomerRecord,
    SupplierRecord,
    ArticleRecord,
    WarehouseRecord,
    EmployeeRecord,
    SalesRecord,
    ProcurementRecord,
    InventoryMovementRecord,
    FinancialRecord,
    AttendanceRecord,
);
