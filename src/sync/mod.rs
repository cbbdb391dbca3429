//! Batch sync pipeline.
//!
//! Extracts operational rows, maps them onto the star schema and loads them
//! into the analytical store, tracking a watermark per table so repeated
//! runs only move what changed.
//!
//! - [`DimensionLoader`]: reference entities, upserted by natural key
//! - [`FactLoader`]: transactional rows, window-replaced after foreign-key
//!   resolution
//! - [`BatchSyncOrchestrator`]: runs every dimension, then every fact, and
//!   commits watermarks per table

pub mod calendar;
pub mod currency;
pub mod dimension;
pub mod fact;
pub mod kinds;
pub mod orchestrator;
pub mod outcome;
pub mod transform;

pub use calendar::CalendarOptions;
pub use currency::ExchangeRates;
pub use dimension::DimensionLoader;
pub use fact::FactLoader;
pub use kinds::{DimensionKind, FactKind, Reference};
pub use orchestrator::{BatchSyncOrchestrator, RunContext, SyncError, SyncOptions};
pub use outcome::{
    LoadResult, LoadStats, RunPhase, SyncReport, TableOutcome, TablePhase, TableReport,
};
pub use transform::TransformError;
