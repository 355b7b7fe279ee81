//! Tracking service
//!
//! The hot path behind the public tracking endpoints: click recording
//! with session attribution, and conversion recording with commission
//! calculation. Both operations resolve the agent through the storage
//! cache, so a deactivated agent stops scoring within the cache TTL.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::commission;
use crate::errors::{ReftrackerError, Result};
use crate::storage::{NewClick, NewConversion, SeaOrmStorage};
use crate::system::event::{Event, EventBus};
use crate::utils::ua;

// ============ Request/Response DTOs ============

/// An incoming click, already parsed off the wire.
#[derive(Debug, Clone, Default)]
pub struct TrackClickRequest {
    pub agent_code: String,
    pub session_code: String,
    pub referrer: Option<String>,
    pub landing_page: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TrackClickResult {
    pub click_id: i64,
    pub session_code: String,
    /// Page views the session has accumulated, this click included.
    pub page_views: i64,
}

/// An incoming conversion, already parsed off the wire.
#[derive(Debug, Clone)]
pub struct RecordConversionRequest {
    pub agent_code: String,
    pub session_code: String,
    pub form_data: Value,
    pub estimated_value: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct RecordConversionResult {
    pub conversion_id: i64,
    pub commission_amount: i64,
    /// The click this conversion was attributed to, if the session had
    /// one for this agent.
    pub click_id: Option<i64>,
}

// ============ TrackingService Implementation ============

pub struct TrackingService {
    storage: Arc<SeaOrmStorage>,
    events: Arc<EventBus>,
}

impl TrackingService {
    pub fn new(storage: Arc<SeaOrmStorage>, events: Arc<EventBus>) -> Self {
        Self { storage, events }
    }

    /// Resolves an agent code for the tracking path. Unknown and
    /// deactivated codes are indistinguishable to the outside.
    async fn resolve_active_agent(&self, agent_code: &str) -> Result<crate::storage::Agent> {
        match self.storage.get_agent_by_code(agent_code).await? {
            Some(agent) if agent.active => Ok(agent),
            Some(_) => {
                debug!("tracking request for deactivated agent {}", agent_code);
                Err(ReftrackerError::not_found(format!(
                    "agent not found or inactive: {}",
                    agent_code
                )))
            }
            None => Err(ReftrackerError::not_found(format!(
                "agent not found or inactive: {}",
                agent_code
            ))),
        }
    }

    /// Records one click: touches (or creates) the session and appends
    /// a click row for the requested agent.
    ///
    /// Sessions keep their first agent. A click from a second agent in
    /// the same session is still logged under that second agent, but
    /// the session binding, and with it the conversion attribution,
    /// does not move.
    pub async fn record_click(&self, req: TrackClickRequest) -> Result<TrackClickResult> {
        if req.agent_code.trim().is_empty() || req.session_code.trim().is_empty() {
            return Err(ReftrackerError::invalid_argument(
                "agent code and session code are required",
            ));
        }

        let agent = self.resolve_active_agent(&req.agent_code).await?;

        let profile = ua::classify(req.user_agent.as_deref());
        let (session, created) = self
            .storage
            .touch_session(agent.id, &req.session_code, &profile)
            .await?;

        if session.agent_id != agent.id {
            warn!(
                "session {} is bound to agent id {}, click from {} recorded without rebinding",
                session.session_code, session.agent_id, agent.code
            );
        }

        let click = self
            .storage
            .insert_click(&NewClick {
                agent_id: agent.id,
                session_code: req.session_code.clone(),
                ip: req.ip,
                user_agent: req.user_agent,
                referrer: req.referrer,
                landing_url: req.landing_page,
            })
            .await?;

        info!(
            "TrackingService: click {} for agent {} (session {}, {})",
            click.id,
            agent.code,
            session.session_code,
            if created { "new session" } else { "returning" }
        );

        Ok(TrackClickResult {
            click_id: click.id,
            session_code: session.session_code,
            page_views: session.page_views,
        })
    }

    /// Records one conversion: attributes it to the latest click the
    /// agent earned in the session, computes commission from the
    /// agent's terms, and closes the session out.
    pub async fn record_conversion(
        &self,
        req: RecordConversionRequest,
    ) -> Result<RecordConversionResult> {
        if req.agent_code.trim().is_empty() {
            return Err(ReftrackerError::invalid_argument(
                "agent code and form data are required",
            ));
        }

        let agent = self.resolve_active_agent(&req.agent_code).await?;

        let estimated_value = req.estimated_value.unwrap_or(0);
        let commission_amount = commission::compute(&agent.plan, estimated_value)?;

        // A conversion with no tracked click still counts; click_id
        // just stays empty.
        let click = self
            .storage
            .latest_click_for(agent.id, &req.session_code)
            .await?;
        let click_id = click.map(|c| c.id);

        let conversion = self
            .storage
            .insert_conversion(&NewConversion {
                agent_id: agent.id,
                session_code: req.session_code.clone(),
                click_id,
                form_data: req.form_data,
                estimated_value,
                commission_amount,
            })
            .await?;

        self.storage
            .mark_session_converted(&req.session_code)
            .await?;

        info!(
            "TrackingService: conversion {} for agent {} (commission {})",
            conversion.id, agent.code, conversion.commission_amount
        );
        self.events
            .publish(Event::conversion_recorded(
                &agent.code,
                estimated_value,
                conversion.commission_amount,
                "tracking_service",
            ))
            .await;

        Ok(RecordConversionResult {
            conversion_id: conversion.id,
            commission_amount: conversion.commission_amount,
            click_id: conversion.click_id,
        })
    }
}
