//! Admin API helper functions

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;

use crate::errors::ReftrackerError;

use super::error_code::ErrorCode;
use super::types::ApiResponse;

/// Builds an enveloped JSON response.
pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: code as i32,
            message: message.into(),
            data,
        })
}

pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(data))
}

pub fn error_response(status: StatusCode, error_code: ErrorCode, message: &str) -> HttpResponse {
    json_response::<()>(status, error_code, message, None)
}

/// Maps a domain error to its HTTP status and numeric code.
pub fn error_from_reftracker(err: &ReftrackerError) -> HttpResponse {
    let status = StatusCode::from_u16(err.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let error_code = ErrorCode::from(err);
    error_response(status, error_code, err.message())
}

/// Unified Result → HttpResponse conversion: 200 with the payload, or
/// the mapped domain error.
pub fn api_result<T: Serialize>(result: Result<T, ReftrackerError>) -> HttpResponse {
    match result {
        Ok(data) => success_response(data),
        Err(e) => error_from_reftracker(&e),
    }
}
