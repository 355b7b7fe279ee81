//! Admin API agent roster operations

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, Responder, Result as ActixResult, web};
use std::sync::Arc;
use tracing::{info, trace};

use crate::services::{AgentService, CreateAgentRequest};
use crate::storage::AgentUpdate;

use super::error_code::ErrorCode;
use super::helpers::{api_result, error_from_reftracker, json_response, success_response};
use super::types::{AgentCreatedResponse, AgentResponse, GetAgentsQuery, PatchAgent, PostNewAgent};

/// List the roster. Inactive agents only show up when asked for.
pub async fn get_all_agents(
    _req: HttpRequest,
    query: web::Query<GetAgentsQuery>,
    agents: web::Data<Arc<AgentService>>,
) -> ActixResult<impl Responder> {
    trace!("Admin API: request to list agents: {:?}", query);

    let include_inactive = query.include_inactive.unwrap_or(false);
    let result = agents.list_agents(include_inactive).await.map(|list| {
        info!("Admin API: returning {} agents", list.len());
        list.into_iter()
            .map(AgentResponse::from)
            .collect::<Vec<_>>()
    });

    Ok(api_result(result))
}

/// Register a new agent, generating a code when none is supplied.
pub async fn post_agent(
    _req: HttpRequest,
    body: web::Json<PostNewAgent>,
    agents: web::Data<Arc<AgentService>>,
) -> ActixResult<impl Responder> {
    let body = body.into_inner();
    info!(
        "Admin API: create agent request - name: {}, code: {}",
        body.name,
        body.code.as_deref().unwrap_or("(generate)")
    );

    let request = CreateAgentRequest {
        code: body.code,
        name: body.name,
        memo: body.memo,
        contact: body.contact,
        plan: body.plan,
    };

    match agents.create_agent(request).await {
        Ok(created) => Ok(json_response(
            StatusCode::CREATED,
            ErrorCode::Success,
            "OK",
            Some(AgentCreatedResponse {
                agent: AgentResponse::from(created.agent),
                generated_code: created.generated_code,
            }),
        )),
        Err(e) => Ok(error_from_reftracker(&e)),
    }
}

pub async fn get_agent(
    _req: HttpRequest,
    code: web::Path<String>,
    agents: web::Data<Arc<AgentService>>,
) -> ActixResult<impl Responder> {
    trace!("Admin API: get agent request - code: {}", code);

    Ok(api_result(
        agents.get_agent(&code).await.map(AgentResponse::from),
    ))
}

/// Partial update. Absent fields keep their stored value.
pub async fn update_agent(
    _req: HttpRequest,
    code: web::Path<String>,
    body: web::Json<PatchAgent>,
    agents: web::Data<Arc<AgentService>>,
) -> ActixResult<impl Responder> {
    let body = body.into_inner();
    info!("Admin API: update agent request - code: {}", code);

    let update = AgentUpdate {
        name: body.name,
        memo: body.memo,
        contact: body.contact,
        plan: body.plan,
        active: body.active,
    };

    Ok(api_result(
        agents
            .update_agent(&code, update)
            .await
            .map(AgentResponse::from),
    ))
}

/// Deactivation, not deletion. Clicks and conversions keep pointing at
/// the row.
pub async fn delete_agent(
    _req: HttpRequest,
    code: web::Path<String>,
    agents: web::Data<Arc<AgentService>>,
) -> ActixResult<impl Responder> {
    info!("Admin API: deactivate agent request - code: {}", code);

    match agents.deactivate_agent(&code).await {
        Ok(()) => {
            info!("Admin API: agent deactivated - {}", code);
            Ok(success_response(serde_json::json!({
                "message": "Agent deactivated"
            })))
        }
        Err(e) => Ok(error_from_reftracker(&e)),
    }
}
