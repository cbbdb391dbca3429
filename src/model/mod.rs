//! Domain types shared by the stores, loaders and query service.

pub mod source;
pub mod table;
pub mod watermark;

pub use source::{
    ArticleRecord, AttendanceRecord, CustomerRecord, EmployeeRecord, FinancialRecord,
    InventoryMovementRecord, ProcurementRecord, SalesRecord, SourceRecord, SupplierRecord,
    WarehouseRecord,
};
pub use table::{Column, ColumnType, WarehouseRow, WarehouseTable, DATE_KEY_COLUMN, EVENT_AT_COLUMN};
pub use watermark::{SyncType, UnknownSyncType, Watermark};
