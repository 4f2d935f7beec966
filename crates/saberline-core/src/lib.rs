// Library root: re-exports all modules so integration tests and the CLI can
// reach the crate's public API.

pub mod config;
pub mod evaluation;
pub mod stats;
pub mod table;
