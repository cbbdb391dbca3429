//! Starsync - ERP analytics batch sync
//!
//! Moves rows from an ERP operational database into a star-schema
//! analytical store and serves aggregate queries over it.
//!
//! - [`sync`]: dimension and fact loaders plus the run orchestrator
//! - [`analytics`]: time series, rankings and KPIs with an operational
//!   fallback while the warehouse is not ready
//! - [`storage`]: SQL and in-memory stores behind the [`interfaces`] traits

pub mod analytics;
pub mod config;
pub mod interfaces;
pub mod model;
pub mod storage;
pub mod sync;
pub mod utils;
