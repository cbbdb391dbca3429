//! OperationalStore trait definition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::Result;
use crate::model::{
    ArticleRecord, AttendanceRecord, CustomerRecord, EmployeeRecord, FinancialRecord,
    InventoryMovementRecord, ProcurementRecord, SalesRecord, SupplierRecord, WarehouseRecord,
};

/// Read-only extraction contract over the ERP's transactional database.
///
/// Every method returns rows whose `changed_at` is strictly greater than
/// `since` (all rows when `since` is `None`), ordered by `changed_at`
/// ascending.
///
/// # Implementations
///
/// - `PgOperationalStore`: PostgreSQL ERP schema
/// - `MockOperationalStore`: In-memory mock for testing
#[async_trait]
pub trait OperationalStore: Send + Sync {
    async fn customers(&self, since: Option<DateTime<Utc>>) -> Result<Vec<CustomerRecord>>;

    async fn suppliers(&self, since: Option<DateTime<Utc>>) -> Result<Vec<SupplierRecord>>;

    async fn articles(&self, since: Option<DateTime<Utc>>) -> Result<Vec<ArticleRecord>>;

    async fn warehouses(&self, since: Option<DateTime<Utc>>) -> Result<Vec<WarehouseRecord>>;

    async fn employees(&self, since: Option<DateTime<Utc>>) -> Result<Vec<EmployeeRecord>>;

    /// Sales order headers and POS item lines, unified.
    async fn sales(&self, since: Option<DateTime<Utc>>) -> Result<Vec<SalesRecord>>;

    async fn procurement(&self, since: Option<DateTime<Utc>>) -> Result<Vec<ProcurementRecord>>;

    async fn inventory_movements(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<InventoryMovementRecord>>;

    async fn financial_transactions(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<FinancialRecord>>;

    async fn attendance(&self, since: Option<DateTime<Utc>>) -> Result<Vec<AttendanceRecord>>;
}
