//! Admin API reporting endpoint

use actix_web::{HttpRequest, Responder, Result as ActixResult, web};
use std::sync::Arc;
use tracing::trace;

use crate::errors::ReftrackerError;
use crate::services::{Granularity, ReportingService};

use super::helpers::{api_result, error_from_reftracker};
use super::types::ReportQuery;

/// Per-agent click/conversion/commission rollup over a date range.
///
/// Dates come as a pair or not at all; the default window is the last
/// 30 days. `full_roster=true` keeps zero-activity agents in the list
/// so settlement views can show them as owed nothing.
pub async fn get_summary_report(
    _req: HttpRequest,
    query: web::Query<ReportQuery>,
    reporting: web::Data<Arc<ReportingService>>,
) -> ActixResult<impl Responder> {
    trace!("Admin API: summary report request: {:?}", query);

    let (start, end) = match ReportingService::parse_date_range_strict(
        query.start.as_deref(),
        query.end.as_deref(),
    ) {
        Ok(range) => range,
        Err(e) => return Ok(error_from_reftracker(&e)),
    };

    let granularity = match query.granularity.as_deref() {
        None => Granularity::default(),
        Some(raw) => match raw.parse::<Granularity>() {
            Ok(parsed) => parsed,
            Err(_) => {
                return Ok(error_from_reftracker(&ReftrackerError::invalid_argument(
                    format!("invalid granularity '{}': expected day or month", raw),
                )));
            }
        },
    };

    let full_roster = query.full_roster.unwrap_or(false);

    Ok(api_result(
        reporting.summary(start, end, granularity, full_roster).await,
    ))
}
