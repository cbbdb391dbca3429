//! Shared storage integration tests.
//!
//! Tests the Warehouse, WatermarkStore and AnalyticsReader interfaces
//! against SQL implementations. Each backend module runs these through the
//! `run_*_tests!` macros.

pub mod analytics_reader_tests;
pub mod warehouse_tests;
pub mod watermark_store_tests;
