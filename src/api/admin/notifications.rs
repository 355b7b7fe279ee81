//! Admin API notification feed
//!
//! Serves the event bus history so dashboards can poll for recent
//! activity without a live socket.

use actix_web::{HttpRequest, Responder, Result as ActixResult, web};
use std::sync::Arc;
use tracing::trace;

use crate::system::event::{Event, EventBus, EventPayload, EventType};

use super::helpers::success_response;
use super::types::{GetNotificationsQuery, NotificationResponse};

fn event_type_label(event_type: &EventType) -> String {
    match event_type {
        EventType::ConversionRecorded => "conversion_recorded".to_string(),
        EventType::AgentCreated => "agent_created".to_string(),
        EventType::AgentDeactivated => "agent_deactivated".to_string(),
        EventType::SystemStartup => "system_startup".to_string(),
        EventType::SystemShutdown => "system_shutdown".to_string(),
        EventType::Custom(name) => name.clone(),
    }
}

fn describe(event: &Event) -> NotificationResponse {
    let message = match &event.payload {
        EventPayload::Conversion {
            agent_code,
            estimated_value,
            commission_amount,
        } => format!(
            "agent {} converted: estimated value {}, commission {}",
            agent_code, estimated_value, commission_amount
        ),
        EventPayload::Agent {
            code,
            name: Some(name),
        } => format!("agent {} ({})", code, name),
        EventPayload::Agent { code, name: None } => format!("agent {}", code),
        EventPayload::System { message } => message.clone(),
        EventPayload::Custom(fields) => serde_json::to_string(fields).unwrap_or_default(),
    };

    NotificationResponse {
        event_type: event_type_label(&event.event_type),
        message,
        source: event.source.clone(),
        timestamp: event.timestamp.to_rfc3339(),
    }
}

/// Recent events, newest first. `limit` defaults to 50, capped at 200.
pub async fn get_notifications(
    _req: HttpRequest,
    query: web::Query<GetNotificationsQuery>,
    events: web::Data<Arc<EventBus>>,
) -> ActixResult<impl Responder> {
    trace!("Admin API: notifications request: {:?}", query);

    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let notifications: Vec<NotificationResponse> =
        events.recent(limit).iter().map(describe).collect();

    Ok(success_response(notifications))
}
