//! PostgreSQL implementations of storage interfaces.

mod operational;

pub use operational::PgOperationalStore;

// Warehouse and watermark stores use the unified SQL implementation
pub use super::sql::postgres::{PostgresWarehouse, PostgresWatermarkStore};
