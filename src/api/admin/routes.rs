//! Admin API route configuration
//!
//! Routes under /v1 are split per resource to keep each handler file
//! focused.

use actix_web::web;

use super::agents::{delete_agent, get_agent, get_all_agents, post_agent, update_agent};
use super::conversions::{change_conversion_status, get_conversions};
use super::notifications::get_notifications;
use super::reports::get_summary_report;
use super::settlements::{export_settlement_csv, get_settlement_preview, settle_month};

/// Agent roster routes `/agents`
///
/// - GET/HEAD /agents - list the roster
/// - POST /agents - register an agent
/// - GET/HEAD /agents/{code} - fetch one agent
/// - PUT /agents/{code} - update an agent
/// - DELETE /agents/{code} - deactivate an agent
pub fn agents_routes() -> actix_web::Scope {
    web::scope("/agents")
        .route("", web::get().to(get_all_agents))
        .route("", web::head().to(get_all_agents))
        .route("", web::post().to(post_agent))
        .route("/{code}", web::get().to(get_agent))
        .route("/{code}", web::head().to(get_agent))
        .route("/{code}", web::put().to(update_agent))
        .route("/{code}", web::delete().to(delete_agent))
}

/// Conversion routes `/conversions`
///
/// - GET /conversions - paginated listing with filters
/// - POST /conversions/{id}/status - advance workflow status
pub fn conversions_routes() -> actix_web::Scope {
    web::scope("/conversions")
        .route("", web::get().to(get_conversions))
        .route("/{id}/status", web::post().to(change_conversion_status))
}

/// Reporting routes `/reports`
pub fn reports_routes() -> actix_web::Scope {
    web::scope("/reports").route("/summary", web::get().to(get_summary_report))
}

/// Settlement routes `/settlements`
///
/// - GET /settlements/{month} - payout preview
/// - POST /settlements/{month}/settle - settle the month
/// - GET /settlements/{month}/export - preview as CSV
pub fn settlements_routes() -> actix_web::Scope {
    web::scope("/settlements")
        // {month}/settle and {month}/export must be before {month}
        .route("/{month}/settle", web::post().to(settle_month))
        .route("/{month}/export", web::get().to(export_settlement_csv))
        .route("/{month}", web::get().to(get_settlement_preview))
}

/// Notification routes `/notifications`
pub fn notifications_routes() -> actix_web::Scope {
    web::scope("/notifications").route("", web::get().to(get_notifications))
}

/// Admin API v1 routes, combining all resource scopes.
pub fn admin_v1_routes() -> actix_web::Scope {
    web::scope("/v1")
        .service(agents_routes())
        .service(conversions_routes())
        .service(reports_routes())
        .service(settlements_routes())
        .service(notifications_routes())
}
