//! Process-level helpers shared by the binary and integration tests.

pub mod bootstrap;
pub mod retry;
