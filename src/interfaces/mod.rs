//! Abstract interfaces for starsync components.
//!
//! These traits define the contracts for:
//! - Operational store extraction (ERP source rows)
//! - Warehouse writes (dimension upserts, fact window replacement)
//! - Watermark persistence (per-table sync cursors)
//! - Analytics reads (analytical store or operational fallback)

pub mod analytics_reader;
pub mod operational_store;
pub mod warehouse;
pub mod watermark_store;

pub use analytics_reader::AnalyticsReader;
pub use operational_store::OperationalStore;
pub use warehouse::{Result, StorageError, Warehouse};
pub use watermark_store::WatermarkStore;
