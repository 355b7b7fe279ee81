//! Reftracker - marketing link attribution and commission tracking
//!
//! Agents hand out referral links carrying a 6-character code; an embeddable
//! client reports clicks and form conversions; the server keeps immutable
//! click and conversion records, binds visitor sessions to the first agent
//! that touched them, and computes commissions per conversion with a monthly
//! settlement run.
//!
//! # Architecture
//! - `storage`: SeaOrmStorage facade over sqlite/mysql/postgres
//! - `services`: agent roster, tracking writes, reporting, settlement
//! - `client`: embeddable tracking agent (attribution store + transport)
//! - `api`: HTTP services and middleware
//! - `cli`: operator commands (roster, reports, settlement)
//! - `config`: configuration management
//! - `runtime`: application lifecycle and execution modes
//! - `system`: logging and the notification event bus

pub mod api;
pub mod cli;
pub mod client;
pub mod commission;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
