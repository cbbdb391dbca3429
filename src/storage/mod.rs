//! Storage implementations.

use std::sync::Arc;

use tracing::{error, info};

use crate::config::{AnalyticalBackend, AnalyticalConfig, OperationalConfig};
use crate::interfaces::{AnalyticsReader, OperationalStore, Warehouse, WatermarkStore};
#[cfg(any(feature = "postgres", feature = "sqlite"))]
use crate::utils::bootstrap::connect_with_retry;

pub mod helpers;
pub mod mock;
pub mod schema;

#[cfg(any(feature = "postgres", feature = "sqlite"))]
pub mod sql;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::{PgOperationalStore, PostgresWarehouse, PostgresWatermarkStore};

#[cfg(feature = "sqlite")]
pub use sql::sqlite::{SqliteWarehouse, SqliteWatermarkStore};

pub use mock::{MockOperationalStore, MockWarehouse, MockWatermarkStore};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Analytical store handles sharing one pool.
pub struct AnalyticalStores {
    pub warehouse: Arc<dyn Warehouse>,
    pub watermarks: Arc<dyn WatermarkStore>,
    pub reader: Arc<dyn AnalyticsReader>,
}

/// Operational store handles sharing one pool.
///
/// `fallback` serves live aggregates while the analytical store is empty.
pub struct OperationalStores {
    pub source: Arc<dyn OperationalStore>,
    pub fallback: Arc<dyn AnalyticsReader>,
}

/// Connect to the ERP database.
#[cfg(feature = "postgres")]
pub async fn init_operational(config: &OperationalConfig) -> Result<OperationalStores, BoxError> {
    info!(max_connections = config.max_connections, "Operational store: postgres");

    let pool = connect_with_retry("operational", || {
        sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
    })
    .await?;

    let store = Arc::new(PgOperationalStore::new(pool));
    Ok(OperationalStores {
        source: store.clone(),
        fallback: store,
    })
}

#[cfg(not(feature = "postgres"))]
pub async fn init_operational(_config: &OperationalConfig) -> Result<OperationalStores, BoxError> {
    error!("Operational store requires the 'postgres' feature");
    Err("postgres feature not enabled".into())
}

/// Connect to the analytical store and create its schema.
pub async fn init_analytical(config: &AnalyticalConfig) -> Result<AnalyticalStores, BoxError> {
    let backend = config.backend()?;
    info!(?backend, max_connections = config.max_connections, "Analytical store");

    let stores = match backend {
        #[cfg(feature = "sqlite")]
        AnalyticalBackend::Sqlite => {
            let pool = connect_with_retry("analytical", || {
                sqlx::sqlite::SqlitePoolOptions::new()
                    .max_connections(config.max_connections)
                    .connect(&config.url)
            })
            .await?;

            let warehouse = Arc::new(SqliteWarehouse::new(pool.clone()));
            AnalyticalStores {
                warehouse: warehouse.clone(),
                watermarks: Arc::new(SqliteWatermarkStore::new(pool)),
                reader: warehouse,
            }
        }
        #[cfg(feature = "postgres")]
        AnalyticalBackend::Postgres => {
            let pool = connect_with_retry("analytical", || {
                sqlx::postgres::PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .connect(&config.url)
            })
            .await?;

            let warehouse = Arc::new(PostgresWarehouse::new(pool.clone()));
            AnalyticalStores {
                warehouse: warehouse.clone(),
                watermarks: Arc::new(PostgresWatermarkStore::new(pool)),
                reader: warehouse,
            }
        }
        #[allow(unreachable_patterns)]
        other => {
            error!(backend = ?other, "Analytical backend not compiled in");
            return Err(format!("analytical backend {other:?} not enabled").into());
        }
    };

    stores.warehouse.init().await?;
    Ok(stores)
}
