//! Public tracking endpoints
//!
//! The two ingestion routes the browser agent talks to. Their wire
//! shapes are fixed and minimal, separate from the admin envelope:
//! embedders parse these bodies with hand-rolled code, so the field
//! names never change.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::{error, trace};

use crate::errors::ReftrackerError;
use crate::services::{RecordConversionRequest, TrackClickRequest, TrackingService};
use crate::utils::ip::extract_client_ip;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TrackClickBody {
    pub agent_id: Option<String>,
    pub session_id: Option<String>,
    pub referrer: Option<String>,
    pub landing_page: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TrackConversionBody {
    pub agent_id: Option<String>,
    pub session_id: Option<String>,
    pub form_data: Option<serde_json::Value>,
    pub estimated_value: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClickAccepted {
    success: bool,
    click_id: i64,
    session_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConversionAccepted {
    success: bool,
    conversion_id: i64,
    commission_amount: i64,
}

#[derive(Serialize)]
struct TrackErrorBody<'a> {
    error: &'a str,
}

pub struct TrackService {}

impl TrackService {
    pub async fn handle_click(
        req: HttpRequest,
        body: web::Json<TrackClickBody>,
        tracking: web::Data<Arc<TrackingService>>,
    ) -> impl Responder {
        trace!("Received track click request");
        let body = body.into_inner();

        // Fail fast before touching storage so a missing agent id gets
        // its contractual body even when the rest is garbage.
        let agent_code = body.agent_id.as_deref().unwrap_or("").trim();
        if agent_code.is_empty() {
            return Self::bad_request_response("Agent ID is required");
        }

        let request = TrackClickRequest {
            agent_code: agent_code.to_string(),
            session_code: body.session_id.unwrap_or_default(),
            referrer: body.referrer,
            landing_page: body.landing_page,
            ip: extract_client_ip(&req),
            user_agent: req
                .headers()
                .get("user-agent")
                .and_then(|h| h.to_str().ok())
                .map(String::from),
        };

        match tracking.record_click(request).await {
            Ok(result) => HttpResponse::Ok().json(ClickAccepted {
                success: true,
                click_id: result.click_id,
                session_id: result.session_code,
            }),
            Err(e) => Self::ingestion_error_response(e),
        }
    }

    pub async fn handle_conversion(
        body: web::Json<TrackConversionBody>,
        tracking: web::Data<Arc<TrackingService>>,
    ) -> impl Responder {
        trace!("Received track conversion request");
        let body = body.into_inner();

        let agent_code = body.agent_id.as_deref().unwrap_or("").trim();
        let form_data = match body.form_data {
            Some(data) if !data.is_null() => data,
            _ => serde_json::Value::Null,
        };
        if agent_code.is_empty() || form_data.is_null() {
            return Self::bad_request_response("Agent ID and form data are required");
        }

        let request = RecordConversionRequest {
            agent_code: agent_code.to_string(),
            session_code: body.session_id.unwrap_or_default(),
            form_data,
            estimated_value: body.estimated_value,
        };

        match tracking.record_conversion(request).await {
            Ok(result) => HttpResponse::Ok().json(ConversionAccepted {
                success: true,
                conversion_id: result.conversion_id,
                commission_amount: result.commission_amount,
            }),
            Err(e) => Self::ingestion_error_response(e),
        }
    }

    /// Catch-all for non-POST verbs on the tracking paths.
    pub async fn method_not_allowed() -> impl Responder {
        HttpResponse::build(StatusCode::METHOD_NOT_ALLOWED).json(TrackErrorBody {
            error: "Method not allowed",
        })
    }

    /// Unknown and deactivated agents share one body, so probing the
    /// endpoint reveals nothing about which codes exist.
    #[inline]
    fn agent_not_found_response() -> HttpResponse {
        HttpResponse::build(StatusCode::NOT_FOUND).json(TrackErrorBody {
            error: "Agent not found or inactive",
        })
    }

    #[inline]
    fn bad_request_response(message: &str) -> HttpResponse {
        HttpResponse::build(StatusCode::BAD_REQUEST).json(TrackErrorBody { error: message })
    }

    #[inline]
    fn internal_error_response() -> HttpResponse {
        HttpResponse::build(StatusCode::INTERNAL_SERVER_ERROR).json(TrackErrorBody {
            error: "Internal server error",
        })
    }

    fn ingestion_error_response(err: ReftrackerError) -> HttpResponse {
        match err {
            ReftrackerError::NotFound(_) => Self::agent_not_found_response(),
            ReftrackerError::InvalidArgument(msg) => Self::bad_request_response(&msg),
            e => {
                error!("Tracking ingestion failed: {}", e);
                Self::internal_error_response()
            }
        }
    }
}

/// Track route configuration. POST is the only accepted verb; the
/// catch-all keeps the 405 body JSON instead of actix's default.
pub fn track_routes() -> actix_web::Scope {
    web::scope("/track")
        .route("/click", web::post().to(TrackService::handle_click))
        .route("/click", web::route().to(TrackService::method_not_allowed))
        .route("/conversion", web::post().to(TrackService::handle_conversion))
        .route(
            "/conversion",
            web::route().to(TrackService::method_not_allowed),
        )
}
