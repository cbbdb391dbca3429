//! Mock OperationalStore implementation for testing.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::interfaces::{OperationalStore, Result, StorageError};
use crate::model::{
    ArticleRecord, AttendanceRecord, CustomerRecord, EmployeeRecord, FinancialRecord,
    InventoryMovementRecord, ProcurementRecord, SalesRecord, SourceRecord, SupplierRecord,
    WarehouseRecord,
};

#[derive(Default)]
struct Tables {
    customers: Vec<CustomerRecord>,
    suppliers: Vec<SupplierRecord>,
    articles: Vec<ArticleRecord>,
    warehouses: Vec<WarehouseRecord>,
    employees: Vec<EmployeeRecord>,
    sales: Vec<SalesRecord>,
    procurement: Vec<ProcurementRecord>,
    inventory_movements: Vec<InventoryMovementRecord>,
    financial_transactions: Vec<FinancialRecord>,
    attendance: Vec<AttendanceRecord>,
}

/// In-memory operational store.
///
/// Failures and delays are keyed by extraction method name
/// (`"customers"`, `"sales"`, `"inventory_movements"`, ...).
#[derive(Default)]
pub struct MockOperationalStore {
    tables: RwLock<Tables>,
    fail_on: RwLock<HashSet<&'static str>>,
    delays: RwLock<HashMap<&'static str, Duration>>,
}

/// Rows changed after `since`, ordered by change timestamp.
fn changed_since<R: SourceRecord + Clone>(rows: &[R], since: Option<DateTime<Utc>>) -> Vec<R> {
    let mut out: Vec<R> = rows
        .iter()
        .filter(|r| since.map_or(true, |s| r.changed_at() > s))
        .cloned()
        .collect();
    out.sort_by_key(|r| r.changed_at());
    out
}

macro_rules! mock_setters {
    ($($field:ident: $record:ty => $add:ident),* $(,)?) => {
        impl MockOperationalStore {
            $(
                pub async fn $add(&self, rows: impl IntoIterator<Item = $record>) {
                    self.tables.write().await.$field.extend(rows);
                }
            )*
        }
    };
}

mock_setters! {
    customers: CustomerRecord => add_customers,
    suppliers: SupplierRecord => add_suppliers,
    articles: ArticleRecord => add_articles,
    warehouses: WarehouseRecord => add_warehouses,
    employees: EmployeeRecord => add_employees,
    sales: SalesRecord => add_sales,
    procurement: ProcurementRecord => add_procurement,
    inventory_movements: InventoryMovementRecord => add_inventory_movements,
    financial_transactions: FinancialRecord => add_financial_transactions,
    attendance: AttendanceRecord => add_attendance,
}

impl MockOperationalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make one extraction method fail with `Unavailable`.
    pub async fn set_fail_on(&self, source: &'static str, fail: bool) {
        let mut fail_on = self.fail_on.write().await;
        if fail {
            fail_on.insert(source);
        } else {
            fail_on.remove(source);
        }
    }

    /// Make one extraction method sleep before answering.
    pub async fn set_delay(&self, source: &'static str, delay: Duration) {
        self.delays.write().await.insert(source, delay);
    }

    async fn enter(&self, source: &'static str) -> Result<()> {
        let delay = self.delays.read().await.get(source).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on.read().await.contains(source) {
            return Err(StorageError::Unavailable(format!(
                "operational store refused {source}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl OperationalStore for MockOperationalStore {
    async fn customers(&self, since: Option<DateTime<Utc>>) -> Result<Vec<CustomerRecord>> {
        self.enter("customers").await?;
        Ok(changed_since(&self.tables.read().await.customers, since))
    }

    async fn suppliers(&self, since: Option<DateTime<Utc>>) -> Result<Vec<SupplierRecord>> {
        self.enter("suppliers").await?;
        Ok(changed_since(&self.tables.read().await.suppliers, since))
    }

    async fn articles(&self, since: Option<DateTime<Utc>>) -> Result<Vec<ArticleRecord>> {
        self.enter("articles").await?;
        Ok(changed_since(&self.tables.read().await.articles, since))
    }

    async fn warehouses(&self, since: Option<DateTime<Utc>>) -> Result<Vec<WarehouseRecord>> {
        self.enter("warehouses").await?;
        Ok(changed_since(&self.tables.read().await.warehouses, since))
    }

    async fn employees(&self, since: Option<DateTime<Utc>>) -> Result<Vec<EmployeeRecord>> {
        self.enter("employees").await?;
        Ok(changed_since(&self.tables.read().await.employees, since))
    }

    async fn sales(&self, since: Option<DateTime<Utc>>) -> Result<Vec<SalesRecord>> {
        self.enter("sales").await?;
        Ok(changed_since(&self.tables.read().await.sales, since))
    }

    async fn procurement(&self, since: Option<DateTime<Utc>>) -> Result<Vec<ProcurementRecord>> {
        self.enter("procurement").await?;
        Ok(changed_since(&self.tables.read().await.procurement, since))
    }

    async fn inventory_movements(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<InventoryMovementRecord>> {
        self.enter("inventory_movements").await?;
        Ok(changed_since(
            &self.tables.read().await.inventory_movements,
            since,
        ))
    }

    async fn financial_transactions(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<FinancialRecord>> {
        self.enter("financial_transactions").await?;
        Ok(changed_since(
            &self.tables.read().await.financial_transactions,
            since,
        ))
    }

    async fn attendance(&self, since: Option<DateTime<Utc>>) -> Result<Vec<AttendanceRecord>> {
        self.enter("attendance").await?;
        Ok(changed_since(&self.tables.read().await.attendance, since))
    }
}
