use chrono::{DateTime, Utc};
use migration::entities::{agent, click, conversion, session};

use crate::commission::CommissionPlan;
use crate::errors::{ReftrackerError, Result};
use crate::storage::models::{
    Agent, Click, Conversion, ConversionStatus, NewClick, NewConversion, Session,
};

/// Converts a Sea-ORM agent row into the domain Agent.
pub fn model_to_agent(model: agent::Model) -> Result<Agent> {
    let plan = CommissionPlan::from_columns(
        &model.commission_type,
        model.commission_amount,
        model.commission_rate,
    )?;

    Ok(Agent {
        id: model.id,
        code: model.code,
        name: model.name,
        memo: model.memo,
        contact: model.contact,
        plan,
        active: model.active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

/// Builds the ActiveModel for inserting a new agent.
pub fn new_agent_active_model(
    code: &str,
    name: &str,
    memo: Option<String>,
    contact: Option<String>,
    plan: &CommissionPlan,
    now: DateTime<Utc>,
) -> agent::ActiveModel {
    use sea_orm::ActiveValue::*;

    let (commission_type, commission_amount, commission_rate) = plan.to_columns();

    agent::ActiveModel {
        id: NotSet,
        code: Set(code.to_string()),
        name: Set(name.to_string()),
        memo: Set(memo),
        contact: Set(contact),
        commission_type: Set(commission_type.to_string()),
        commission_amount: Set(commission_amount),
        commission_rate: Set(commission_rate),
        active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

/// Converts a Sea-ORM session row into the domain Session.
///
/// The device type string was produced by our own classifier, so an
/// unrecognized value falls back to the classifier default instead of
/// failing the whole query.
pub fn model_to_session(model: session::Model) -> Session {
    Session {
        id: model.id,
        session_code: model.session_code,
        agent_id: model.agent_id,
        device_type: model.device_type.parse().unwrap_or_default(),
        browser: model.browser,
        os: model.os,
        page_views: model.page_views,
        converted: model.converted,
        started_at: model.started_at,
        last_seen_at: model.last_seen_at,
        ended_at: model.ended_at,
    }
}

pub fn model_to_click(model: click::Model) -> Click {
    Click {
        id: model.id,
        agent_id: model.agent_id,
        session_code: model.session_code,
        ip: model.ip,
        user_agent: model.user_agent,
        referrer: model.referrer,
        landing_url: model.landing_url,
        created_at: model.created_at,
    }
}

/// Builds the ActiveModel for appending a click.
pub fn new_click_active_model(new_click: &NewClick, now: DateTime<Utc>) -> click::ActiveModel {
    use sea_orm::ActiveValue::*;

    click::ActiveModel {
        id: NotSet,
        agent_id: Set(new_click.agent_id),
        session_code: Set(new_click.session_code.clone()),
        ip: Set(new_click.ip.clone()),
        user_agent: Set(new_click.user_agent.clone()),
        referrer: Set(new_click.referrer.clone()),
        landing_url: Set(new_click.landing_url.clone()),
        created_at: Set(now),
    }
}

/// Converts a Sea-ORM conversion row into the domain Conversion.
///
/// Both the status string and the form_data JSON were written by this
/// crate; failing to read them back means the row was tampered with and
/// is reported as a storage error rather than silently defaulted.
pub fn model_to_conversion(model: conversion::Model) -> Result<Conversion> {
    let status: ConversionStatus = model.status.parse().map_err(|_| {
        ReftrackerError::database_operation(format!(
            "unknown conversion status in storage: {}",
            model.status
        ))
    })?;

    let form_data: serde_json::Value = serde_json::from_str(&model.form_data)?;

    Ok(Conversion {
        id: model.id,
        agent_id: model.agent_id,
        session_code: model.session_code,
        click_id: model.click_id,
        form_data,
        estimated_value: model.estimated_value,
        commission_amount: model.commission_amount,
        status,
        created_at: model.created_at,
        updated_at: model.updated_at,
        contacted_at: model.contacted_at,
        settled_at: model.settled_at,
    })
}

/// Builds the ActiveModel for appending a conversion (always `pending`).
pub fn new_conversion_active_model(
    new_conversion: &NewConversion,
    now: DateTime<Utc>,
) -> Result<conversion::ActiveModel> {
    use sea_orm::ActiveValue::*;

    let form_data = serde_json::to_string(&new_conversion.form_data)?;

    Ok(conversion::ActiveModel {
        id: NotSet,
        agent_id: Set(new_conversion.agent_id),
        session_code: Set(new_conversion.session_code.clone()),
        click_id: Set(new_conversion.click_id),
        form_data: Set(form_data),
        estimated_value: Set(new_conversion.estimated_value),
        commission_amount: Set(new_conversion.commission_amount),
        status: Set(ConversionStatus::Pending.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        contacted_at: Set(None),
        settled_at: Set(None),
    })
}
