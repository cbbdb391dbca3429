//! Star-schema table catalog.
//!
//! Every warehouse table is described by a static column list. The first
//! column is always the natural key. Fact tables additionally carry
//! `event_at` (source change timestamp, the watermark basis) and `date_key`
//! (business date, foreign key into `dim_date`) as their second and third
//! columns.

use std::fmt;

use chrono::{DateTime, Utc};
use sea_query::Value;
use serde::Serialize;

/// Storage type of a warehouse column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Double,
    BigInt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
}

const fn text(name: &'static str) -> Column {
    Column { name, ty: ColumnType::Text }
}

const fn double(name: &'static str) -> Column {
    Column { name, ty: ColumnType::Double }
}

const fn bigint(name: &'static str) -> Column {
    Column { name, ty: ColumnType::BigInt }
}

/// Name of the change-timestamp column on fact tables.
pub const EVENT_AT_COLUMN: &str = "event_at";
/// Name of the business-date column on fact tables and `dim_date`.
pub const DATE_KEY_COLUMN: &str = "date_key";

const DIM_DATE: &[Column] = &[
    text("date_key"),
    bigint("year"),
    bigint("quarter"),
    bigint("month"),
    text("month_name"),
    bigint("week"),
    bigint("day_of_month"),
    bigint("day_of_week"),
    text("day_name"),
    bigint("is_weekend"),
    bigint("fiscal_year"),
    bigint("fiscal_quarter"),
];

const DIM_CUSTOMER: &[Column] = &[
    text("id"),
    text("name"),
    text("phone"),
    text("email"),
    text("address"),
    text("city"),
    text("customer_type"),
    bigint("is_active"),
    text("updated_at"),
];

const DIM_SUPPLIER: &[Column] = &[
    text("id"),
    text("name"),
    text("contact_person"),
    text("phone"),
    text("email"),
    text("address"),
    text("city"),
    text("supplier_type"),
    bigint("is_active"),
    text("updated_at"),
];

const DIM_ARTICLE: &[Column] = &[
    text("id"),
    text("code"),
    text("name"),
    text("description"),
    text("classification_id"),
    text("classification_name"),
    text("color_id"),
    text("color_name"),
    text("model_id"),
    text("model_name"),
    text("category"),
    double("price"),
    double("cost"),
    bigint("is_active"),
    text("updated_at"),
];

const DIM_WAREHOUSE: &[Column] = &[
    text("id"),
    text("code"),
    text("name"),
    text("location"),
    text("warehouse_type"),
    bigint("is_active"),
    text("updated_at"),
];

const DIM_EMPLOYEE: &[Column] = &[
    text("id"),
    text("employee_code"),
    text("full_name"),
    text("department"),
    text("position"),
    text("hire_date"),
    bigint("is_active"),
    text("updated_at"),
];

const SALES_FACT: &[Column] = &[
    text("id"),
    text("event_at"),
    text("date_key"),
    text("source_type"),
    text("order_id"),
    text("transaction_at"),
    text("customer_id"),
    text("article_id"),
    text("warehouse_id"),
    text("cashier_id"),
    bigint("quantity"),
    double("unit_price"),
    double("discount_amount"),
    double("tax_amount"),
    double("line_total"),
    double("line_total_base"),
    double("order_total"),
    text("currency"),
    text("status"),
    text("payment_method"),
    text("payment_status"),
    text("channel"),
];

const PROCUREMENT_FACT: &[Column] = &[
    text("id"),
    text("event_at"),
    text("date_key"),
    text("po_id"),
    text("po_number"),
    text("transaction_at"),
    text("supplier_id"),
    text("article_id"),
    text("created_by_id"),
    bigint("quantity"),
    bigint("received_quantity"),
    double("unit_price"),
    double("line_total"),
    double("line_total_base"),
    double("order_total"),
    double("order_total_base"),
    text("currency"),
    double("exchange_rate"),
    text("status"),
    text("payment_status"),
    text("payment_terms"),
    text("purchase_request_id"),
];

const INVENTORY_MOVEMENT_FACT: &[Column] = &[
    text("id"),
    text("event_at"),
    text("date_key"),
    text("movement_at"),
    text("article_id"),
    text("warehouse_id"),
    bigint("quantity"),
    double("unit_cost"),
    double("total_value"),
    text("movement_type"),
    text("reference_id"),
    text("reference_type"),
];

const FINANCIAL_TRANSACTION_FACT: &[Column] = &[
    text("id"),
    text("event_at"),
    text("date_key"),
    text("journal_entry_id"),
    text("entry_number"),
    text("account_id"),
    text("account_code"),
    text("account_name"),
    text("company_id"),
    double("debit_amount"),
    double("credit_amount"),
    double("debit_amount_base"),
    double("credit_amount_base"),
    text("currency_code"),
    double("exchange_rate"),
    text("status"),
    text("source_module"),
    text("source_id"),
    text("description"),
];

const ATTENDANCE_FACT: &[Column] = &[
    text("id"),
    text("event_at"),
    text("date_key"),
    text("employee_id"),
    text("clock_in"),
    text("clock_out"),
    double("work_hours"),
    double("overtime_hours"),
    bigint("late_minutes"),
    bigint("early_out_minutes"),
    text("status"),
    text("source"),
];

/// Every table the pipeline writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "&'static str")]
pub enum WarehouseTable {
    DimDate,
    DimCustomer,
    DimSupplier,
    DimArticle,
    DimWarehouse,
    DimEmployee,
    SalesFact,
    ProcurementFact,
    InventoryMovementFact,
    FinancialTransactionFact,
    AttendanceFact,
}

impl WarehouseTable {
    pub const DIMENSIONS: [WarehouseTable; 6] = [
        WarehouseTable::DimDate,
        WarehouseTable::DimCustomer,
        WarehouseTable::DimSupplier,
        WarehouseTable::DimArticle,
        WarehouseTable::DimWarehouse,
        WarehouseTable::DimEmployee,
    ];

    pub const FACTS: [WarehouseTable; 5] = [
        WarehouseTable::SalesFact,
        WarehouseTable::ProcurementFact,
        WarehouseTable::InventoryMovementFact,
        WarehouseTable::FinancialTransactionFact,
        WarehouseTable::AttendanceFact,
    ];

    /// All tables, dimensions first.
    pub fn all() -> impl Iterator<Item = WarehouseTable> {
        Self::DIMENSIONS.into_iter().chain(Self::FACTS)
    }

    pub fn name(self) -> &'static str {
        match self {
            WarehouseTable::DimDate => "dim_date",
            WarehouseTable::DimCustomer => "dim_customer",
            WarehouseTable::DimSupplier => "dim_supplier",
            WarehouseTable::DimArticle => "dim_article",
            WarehouseTable::DimWarehouse => "dim_warehouse",
            WarehouseTable::DimEmployee => "dim_employee",
            WarehouseTable::SalesFact => "sales_fact",
            WarehouseTable::ProcurementFact => "procurement_fact",
            WarehouseTable::InventoryMovementFact => "inventory_movement_fact",
            WarehouseTable::FinancialTransactionFact => "financial_transaction_fact",
            WarehouseTable::AttendanceFact => "attendance_fact",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().find(|table| table.name() == name)
    }

    pub fn is_fact(self) -> bool {
        Self::FACTS.contains(&self)
    }

    pub fn columns(self) -> &'static [Column] {
        match self {
            WarehouseTable::DimDate => DIM_DATE,
            WarehouseTable::DimCustomer => DIM_CUSTOMER,
            WarehouseTable::DimSupplier => DIM_SUPPLIER,
            WarehouseTable::DimArticle => DIM_ARTICLE,
            WarehouseTable::DimWarehouse => DIM_WAREHOUSE,
            WarehouseTable::DimEmployee => DIM_EMPLOYEE,
            WarehouseTable::SalesFact => SALES_FACT,
            WarehouseTable::ProcurementFact => PROCUREMENT_FACT,
            WarehouseTable::InventoryMovementFact => INVENTORY_MOVEMENT_FACT,
            WarehouseTable::FinancialTransactionFact => FINANCIAL_TRANSACTION_FACT,
            WarehouseTable::AttendanceFact => ATTENDANCE_FACT,
        }
    }

    pub fn key_column(self) -> &'static str {
        self.columns()[0].name
    }

    pub fn column_index(self, name: &str) -> Option<usize> {
        self.columns().iter().position(|c| c.name == name)
    }
}

impl From<WarehouseTable> for &'static str {
    fn from(table: WarehouseTable) -> Self {
        table.name()
    }
}

impl fmt::Display for WarehouseTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One target row, values aligned with [`WarehouseTable::columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct WarehouseRow {
    pub key: String,
    /// Source change timestamp; `None` for generated rows (`dim_date`).
    pub event_at: Option<DateTime<Utc>>,
    pub values: Vec<Value>,
}

impl WarehouseRow {
    pub fn new(key: impl Into<String>, event_at: Option<DateTime<Utc>>, values: Vec<Value>) -> Self {
        Self {
            key: key.into(),
            event_at,
            values,
        }
    }

    /// Value of the named column, if the table has it.
    pub fn value(&self, table: WarehouseTable, column: &str) -> Option<&Value> {
        table.column_index(column).and_then(|i| self.values.get(i))
    }
}
