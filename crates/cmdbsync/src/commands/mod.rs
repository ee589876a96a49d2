//! Command dispatch: bridges CLI args -> core reconciliation -> output formatting.

pub mod apply;
pub mod config_cmd;
pub mod reconcile;
pub mod report;
pub mod resources;
pub mod util;
