//! Mock storage implementations for testing.

mod operational;
mod warehouse;
mod watermark_store;

pub use operational::MockOperationalStore;
pub use warehouse::MockWarehouse;
pub use watermark_store::MockWatermarkStore;
