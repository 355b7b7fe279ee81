//! CLI command implementations
//!
//! This module re-exports all CLI command functions.

mod agent;
mod config_management;
mod report;
mod settle;

pub use agent::*;
pub use config_management::*;
pub use report::*;
pub use settle::*;
