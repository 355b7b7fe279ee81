//! System-level modules
//!
//! This module contains system-level functionality:
//! - Logging initialization
//! - The in-process event bus used for conversion notifications

pub mod event;
pub mod logging;
