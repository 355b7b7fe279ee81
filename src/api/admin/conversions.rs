//! Admin API conversion listing and status workflow

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, Result as ActixResult, web};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, trace};

use crate::storage::{ConversionFilter, ConversionStatus, SeaOrmStorage};

use super::error_code::ErrorCode;
use super::helpers::{api_result, error_from_reftracker, error_response};
use super::types::{
    ConversionResponse, GetConversionsQuery, PaginatedResponse, PaginationInfo,
    StatusChangeRequest,
};

/// List conversions, newest first, optionally filtered by agent code
/// and workflow status.
pub async fn get_conversions(
    _req: HttpRequest,
    query: web::Query<GetConversionsQuery>,
    storage: web::Data<Arc<SeaOrmStorage>>,
) -> ActixResult<impl Responder> {
    trace!("Admin API: request to list conversions: {:?}", query);

    let mut filter = ConversionFilter::default();

    if let Some(ref agent_code) = query.agent {
        match storage.get_agent_by_code(agent_code).await {
            Ok(Some(agent)) => filter.agent_id = Some(agent.id),
            Ok(None) => {
                return Ok(error_response(
                    StatusCode::NOT_FOUND,
                    ErrorCode::NotFound,
                    &format!("agent not found: {}", agent_code),
                ));
            }
            Err(e) => return Ok(error_from_reftracker(&e)),
        }
    }

    if let Some(ref status) = query.status {
        match status.parse::<ConversionStatus>() {
            Ok(parsed) => filter.status = Some(parsed),
            Err(_) => {
                return Ok(error_response(
                    StatusCode::BAD_REQUEST,
                    ErrorCode::BadRequest,
                    &format!(
                        "invalid status '{}': expected pending, contacted or settled",
                        status
                    ),
                ));
            }
        }
    }

    let page = query.page.unwrap_or(1).max(1);
    let page_size = query.page_size.unwrap_or(20).clamp(1, 100);

    let (conversions, total) = match storage.list_conversions(&filter, page, page_size).await {
        Ok(result) => result,
        Err(e) => return Ok(error_from_reftracker(&e)),
    };

    // Rows store the agent id; the response speaks in public codes.
    let code_by_id: HashMap<i64, String> = match storage.list_agents(true).await {
        Ok(agents) => agents.into_iter().map(|a| (a.id, a.code)).collect(),
        Err(e) => return Ok(error_from_reftracker(&e)),
    };

    let total_pages = total.div_ceil(page_size);
    let data: Vec<ConversionResponse> = conversions
        .into_iter()
        .map(|c| {
            let agent_code = code_by_id
                .get(&c.agent_id)
                .cloned()
                .unwrap_or_else(|| format!("#{}", c.agent_id));
            ConversionResponse::from_conversion(c, agent_code)
        })
        .collect();

    info!(
        "Admin API: returning {} conversions (page {} of {}, total: {})",
        data.len(),
        page,
        total_pages,
        total
    );

    Ok(HttpResponse::Ok()
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(PaginatedResponse {
            code: 0,
            data,
            pagination: PaginationInfo {
                page,
                page_size,
                total,
                total_pages,
            },
        }))
}

/// Move a conversion along pending → contacted → settled. Going
/// backwards is rejected; requesting the current state is a no-op.
pub async fn change_conversion_status(
    _req: HttpRequest,
    id: web::Path<i64>,
    body: web::Json<StatusChangeRequest>,
    storage: web::Data<Arc<SeaOrmStorage>>,
) -> ActixResult<impl Responder> {
    let id = id.into_inner();
    info!(
        "Admin API: status change request - conversion: {}, status: {}",
        id, body.status
    );

    let next = match body.status.parse::<ConversionStatus>() {
        Ok(parsed) => parsed,
        Err(_) => {
            return Ok(error_response(
                StatusCode::BAD_REQUEST,
                ErrorCode::BadRequest,
                &format!(
                    "invalid status '{}': expected pending, contacted or settled",
                    body.status
                ),
            ));
        }
    };

    // The envelope speaks codes too, so resolve the agent for the row.
    Ok(match storage.advance_conversion_status(id, next).await {
        Ok(conversion) => {
            let agent_code = match storage.get_agent_by_id(conversion.agent_id).await {
                Ok(agent) => agent
                    .map(|a| a.code)
                    .unwrap_or_else(|| format!("#{}", conversion.agent_id)),
                Err(e) => return Ok(error_from_reftracker(&e)),
            };
            api_result(Ok(ConversionResponse::from_conversion(
                conversion, agent_code,
            )))
        }
        Err(e) => error_from_reftracker(&e),
    })
}
