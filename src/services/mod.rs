//! Service layer for business logic
//!
//! This module provides unified business logic that can be shared between
//! different interfaces (HTTP API, CLI).

mod agent_service;
mod reporting_service;
mod settlement_service;
mod tracking_service;

pub use agent_service::*;
pub use reporting_service::*;
pub use settlement_service::*;
pub use tracking_service::*;
