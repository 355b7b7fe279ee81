//! Admin API service module
//!
//! Everything the back-office talks to:
//! - agent roster CRUD
//! - conversion listing and status workflow
//! - summary reports
//! - monthly settlement (preview, settle, CSV export)
//! - notification feed

mod agents;
mod conversions;
pub mod error_code;
mod helpers;
mod notifications;
mod reports;
pub mod routes;
mod settlements;
mod types;

pub use types::*;

pub use helpers::{
    api_result, error_from_reftracker, error_response, json_response, success_response,
};

pub use error_code::ErrorCode;

pub use agents::{delete_agent, get_agent, get_all_agents, post_agent, update_agent};

pub use conversions::{change_conversion_status, get_conversions};

pub use reports::get_summary_report;

pub use settlements::{export_settlement_csv, get_settlement_preview, settle_month};

pub use notifications::get_notifications;
