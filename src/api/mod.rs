//! HTTP API surface
//!
//! Three route families share one actix app:
//! - `/track/*` public ingestion, fixed minimal wire shapes
//! - `/api/v1/*` admin envelope API
//! - `/health` probes

pub mod admin;
pub mod health;
pub mod middleware;
pub mod track;

pub use health::{AppStartTime, health_routes};
pub use track::track_routes;
