//! Admin API type definitions

use serde::{Deserialize, Serialize};

use crate::commission::CommissionPlan;
use crate::storage::{Agent, Conversion, ConversionStatus};

/// Response envelope shared by all admin endpoints.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PostNewAgent {
    pub code: Option<String>,
    pub name: String,
    pub memo: Option<String>,
    pub contact: Option<String>,
    pub plan: CommissionPlan,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PatchAgent {
    pub name: Option<String>,
    pub memo: Option<String>,
    pub contact: Option<String>,
    pub plan: Option<CommissionPlan>,
    pub active: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GetAgentsQuery {
    pub include_inactive: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GetConversionsQuery {
    pub agent: Option<String>,
    pub status: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StatusChangeRequest {
    pub status: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ReportQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub granularity: Option<String>,
    pub full_roster: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GetNotificationsQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PaginatedResponse<T> {
    pub code: i32,
    pub data: T,
    pub pagination: PaginationInfo,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PaginationInfo {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

/// Agent as shown to admin clients. The internal row id stays private.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AgentResponse {
    pub code: String,
    pub name: String,
    pub memo: Option<String>,
    pub contact: Option<String>,
    pub plan: CommissionPlan,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Agent> for AgentResponse {
    fn from(agent: Agent) -> Self {
        Self {
            code: agent.code,
            name: agent.name,
            memo: agent.memo,
            contact: agent.contact,
            plan: agent.plan,
            active: agent.active,
            created_at: agent.created_at.to_rfc3339(),
            updated_at: agent.updated_at.to_rfc3339(),
        }
    }
}

/// Creation response, flagging whether the code came from the server.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AgentCreatedResponse {
    #[serde(flatten)]
    pub agent: AgentResponse,
    pub generated_code: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConversionResponse {
    pub id: i64,
    pub agent_code: String,
    pub session_code: String,
    pub click_id: Option<i64>,
    pub form_data: serde_json::Value,
    pub estimated_value: i64,
    pub commission_amount: i64,
    pub status: ConversionStatus,
    pub created_at: String,
    pub contacted_at: Option<String>,
    pub settled_at: Option<String>,
}

impl ConversionResponse {
    /// The storage row carries only the agent id; the caller resolves
    /// the public code from the roster.
    pub fn from_conversion(conversion: Conversion, agent_code: String) -> Self {
        Self {
            id: conversion.id,
            agent_code,
            session_code: conversion.session_code,
            click_id: conversion.click_id,
            form_data: conversion.form_data,
            estimated_value: conversion.estimated_value,
            commission_amount: conversion.commission_amount,
            status: conversion.status,
            created_at: conversion.created_at.to_rfc3339(),
            contacted_at: conversion.contacted_at.map(|dt| dt.to_rfc3339()),
            settled_at: conversion.settled_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NotificationResponse {
    pub event_type: String,
    pub message: String,
    pub source: String,
    pub timestamp: String,
}

// ============ Health check types ============

/// Storage health probe result.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthStorageCheck {
    pub status: String,
    pub agents_count: Option<u64>,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthChecks {
    pub storage: HealthStorageCheck,
}

/// Health check response.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
    pub uptime: u32,
    pub checks: HealthChecks,
    pub response_time_ms: u32,
}
