//! Agent roster service
//!
//! Business logic for managing marketing agents, shared between the
//! HTTP admin API and the CLI.

use std::sync::Arc;

use tracing::{info, warn};

use crate::commission::CommissionPlan;
use crate::config::get_config;
use crate::errors::{ReftrackerError, Result};
use crate::storage::{Agent, AgentUpdate, SeaOrmStorage};
use crate::system::event::{Event, EventBus};
use crate::utils::{generate_tracking_code, is_valid_code};

// ============ Request/Response DTOs ============

/// Request to register a new agent
#[derive(Debug, Clone)]
pub struct CreateAgentRequest {
    /// Tracking code (optional, generated if not provided)
    pub code: Option<String>,
    /// Display name
    pub name: String,
    /// Free-form note
    pub memo: Option<String>,
    /// Contact address (mail, phone, whatever the office uses)
    pub contact: Option<String>,
    /// Commission terms
    pub plan: CommissionPlan,
}

/// Result of agent creation
#[derive(Debug, Clone)]
pub struct AgentCreateResult {
    pub agent: Agent,
    /// Whether the code was auto-generated
    pub generated_code: bool,
}

// ============ AgentService Implementation ============

/// Service for agent roster operations
pub struct AgentService {
    storage: Arc<SeaOrmStorage>,
    events: Arc<EventBus>,
}

impl AgentService {
    pub fn new(storage: Arc<SeaOrmStorage>, events: Arc<EventBus>) -> Self {
        Self { storage, events }
    }

    /// Register an agent. A caller-supplied code is validated against
    /// the tracking alphabet; otherwise codes are generated and retried
    /// on collision up to the configured bound.
    pub async fn create_agent(&self, req: CreateAgentRequest) -> Result<AgentCreateResult> {
        if req.name.trim().is_empty() {
            return Err(ReftrackerError::invalid_argument(
                "agent name must not be empty",
            ));
        }
        req.plan.validate()?;

        let result = match req.code.clone().filter(|c| !c.is_empty()) {
            Some(code) => {
                if !is_valid_code(&code) {
                    return Err(ReftrackerError::invalid_argument(format!(
                        "invalid agent code '{}': expected {} characters from the tracking alphabet",
                        code,
                        crate::utils::CODE_LENGTH
                    )));
                }
                let agent = self
                    .storage
                    .insert_agent(&code, &req.name, req.memo, req.contact, &req.plan)
                    .await?;
                AgentCreateResult {
                    agent,
                    generated_code: false,
                }
            }
            None => {
                let agent = self.insert_with_generated_code(&req).await?;
                AgentCreateResult {
                    agent,
                    generated_code: true,
                }
            }
        };

        info!(
            "AgentService: created agent {} ({})",
            result.agent.code, result.agent.name
        );
        self.events
            .publish(Event::agent_created(
                &result.agent.code,
                &result.agent.name,
                "agent_service",
            ))
            .await;

        Ok(result)
    }

    async fn insert_with_generated_code(&self, req: &CreateAgentRequest) -> Result<Agent> {
        let retry_limit = get_config().tracking.code_retry_limit;

        for _ in 0..retry_limit {
            let code = generate_tracking_code();
            if self.storage.agent_code_exists(&code).await? {
                continue;
            }
            match self
                .storage
                .insert_agent(
                    &code,
                    &req.name,
                    req.memo.clone(),
                    req.contact.clone(),
                    &req.plan,
                )
                .await
            {
                Ok(agent) => return Ok(agent),
                // Lost the insert race to a concurrent creation with
                // the same generated code. Roll the dice again.
                Err(ReftrackerError::InvalidArgument(_)) => {
                    warn!("generated code {} collided, retrying", code);
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Err(ReftrackerError::capacity_exhausted(format!(
            "could not find a free agent code in {} attempts",
            retry_limit
        )))
    }

    pub async fn get_agent(&self, code: &str) -> Result<Agent> {
        self.storage
            .get_agent_by_code(code)
            .await?
            .ok_or_else(|| ReftrackerError::not_found(format!("agent not found: {}", code)))
    }

    pub async fn list_agents(&self, include_inactive: bool) -> Result<Vec<Agent>> {
        self.storage.list_agents(include_inactive).await
    }

    pub async fn update_agent(&self, code: &str, update: AgentUpdate) -> Result<Agent> {
        if let Some(ref plan) = update.plan {
            plan.validate()?;
        }
        if let Some(ref name) = update.name {
            if name.trim().is_empty() {
                return Err(ReftrackerError::invalid_argument(
                    "agent name must not be empty",
                ));
            }
        }

        self.storage.update_agent(code, update).await
    }

    /// Deactivate an agent. The row stays for attribution history; the
    /// tracking endpoints stop accepting its code.
    pub async fn deactivate_agent(&self, code: &str) -> Result<()> {
        self.storage.deactivate_agent(code).await?;
        self.events
            .publish(Event::agent_deactivated(code, "agent_service"))
            .await;
        Ok(())
    }
}
