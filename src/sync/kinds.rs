//! Dimension and fact kinds, iterated in fixed order by the orchestrator.

use serde::Serialize;

use crate::model::{WarehouseTable, DATE_KEY_COLUMN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionKind {
    Date,
    Customer,
    Supplier,
    Article,
    Warehouse,
    Employee,
}

impl DimensionKind {
    /// Load order. `Date` first so fact date keys always resolve.
    pub const ALL: [DimensionKind; 6] = [
        DimensionKind::Date,
        DimensionKind::Customer,
        DimensionKind::Supplier,
        DimensionKind::Article,
        DimensionKind::Warehouse,
        DimensionKind::Employee,
    ];

    pub fn table(self) -> WarehouseTable {
        match self {
            DimensionKind::Date => WarehouseTable::DimDate,
            DimensionKind::Customer => WarehouseTable::DimCustomer,
            DimensionKind::Supplier => WarehouseTable::DimSupplier,
            DimensionKind::Article => WarehouseTable::DimArticle,
            DimensionKind::Warehouse => WarehouseTable::DimWarehouse,
            DimensionKind::Employee => WarehouseTable::DimEmployee,
        }
    }

    /// Generated from the calendar rather than extracted.
    pub fn is_generated(self) -> bool {
        self == DimensionKind::Date
    }
}

/// A fact column that must name an existing dimension row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub column: &'static str,
    pub dimension: WarehouseTable,
}

const fn reference(column: &'static str, dimension: WarehouseTable) -> Reference {
    Reference { column, dimension }
}

const DATE: Reference = reference(DATE_KEY_COLUMN, WarehouseTable::DimDate);

const SALES_REFS: &[Reference] = &[
    reference("customer_id", WarehouseTable::DimCustomer),
    reference("article_id", WarehouseTable::DimArticle),
    reference("warehouse_id", WarehouseTable::DimWarehouse),
    DATE,
];

const PROCUREMENT_REFS: &[Reference] = &[
    reference("supplier_id", WarehouseTable::DimSupplier),
    reference("article_id", WarehouseTable::DimArticle),
    DATE,
];

const INVENTORY_REFS: &[Reference] = &[
    reference("article_id", WarehouseTable::DimArticle),
    reference("warehouse_id", WarehouseTable::DimWarehouse),
    DATE,
];

const FINANCIAL_REFS: &[Reference] = &[DATE];

const ATTENDANCE_REFS: &[Reference] = &[reference("employee_id", WarehouseTable::DimEmployee), DATE];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FactKind {
    Sales,
    Procurement,
    InventoryMovement,
    FinancialTransaction,
    Attendance,
}

impl FactKind {
    pub const ALL: [FactKind; 5] = [
        FactKind::Sales,
        FactKind::Procurement,
        FactKind::InventoryMovement,
        FactKind::FinancialTransaction,
        FactKind::Attendance,
    ];

    pub fn table(self) -> WarehouseTable {
        match self {
            FactKind::Sales => WarehouseTable::SalesFact,
            FactKind::Procurement => WarehouseTable::ProcurementFact,
            FactKind::InventoryMovement => WarehouseTable::InventoryMovementFact,
            FactKind::FinancialTransaction => WarehouseTable::FinancialTransactionFact,
            FactKind::Attendance => WarehouseTable::AttendanceFact,
        }
    }

    /// Dimension references resolved before insert.
    pub fn references(self) -> &'static [Reference] {
        match self {
            FactKind::Sales => SALES_REFS,
            FactKind::Procurement => PROCUREMENT_REFS,
            FactKind::InventoryMovement => INVENTORY_REFS,
            FactKind::FinancialTransaction => FINANCIAL_REFS,
            FactKind::Attendance => ATTENDANCE_REFS,
        }
    }
}
