//! Admin API monthly settlement endpoints

use actix_web::{HttpRequest, HttpResponse, Responder, Result as ActixResult, web};
use std::sync::Arc;
use tracing::{info, trace};

use crate::services::SettlementService;

use super::helpers::{api_result, error_from_reftracker};

/// Per-agent payout preview for one calendar month. Read-only.
pub async fn get_settlement_preview(
    _req: HttpRequest,
    month: web::Path<String>,
    settlements: web::Data<Arc<SettlementService>>,
) -> ActixResult<impl Responder> {
    trace!("Admin API: settlement preview request - month: {}", month);

    Ok(api_result(settlements.preview(&month).await))
}

/// Settle the month: every contacted conversion in the window flips to
/// settled. Running it again settles nothing new.
pub async fn settle_month(
    _req: HttpRequest,
    month: web::Path<String>,
    settlements: web::Data<Arc<SettlementService>>,
) -> ActixResult<impl Responder> {
    info!("Admin API: settle request - month: {}", month);

    Ok(api_result(settlements.settle(&month).await))
}

/// The same preview as CSV, for handing to accounting.
pub async fn export_settlement_csv(
    _req: HttpRequest,
    month: web::Path<String>,
    settlements: web::Data<Arc<SettlementService>>,
) -> ActixResult<impl Responder> {
    let month = month.into_inner();
    info!("Admin API: settlement export request - month: {}", month);

    match settlements.export_csv(&month).await {
        Ok(csv) => Ok(HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"settlement_{}.csv\"", month),
            ))
            .body(csv)),
        Err(e) => Ok(error_from_reftracker(&e)),
    }
}
