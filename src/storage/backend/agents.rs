//! Agent roster operations for SeaOrmStorage

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, SqlErr,
};
use tracing::{debug, error, info};

use super::converters::{model_to_agent, new_agent_active_model};
use super::{AgentUpdate, SeaOrmStorage, retry};
use crate::commission::CommissionPlan;
use crate::errors::{ReftrackerError, Result};
use crate::storage::models::Agent;

use migration::entities::agent;

impl SeaOrmStorage {
    /// Inserts a new agent with the given tracking code.
    ///
    /// A duplicate code surfaces as `InvalidArgument` so callers can
    /// tell a collision from an infrastructure failure and retry with
    /// a fresh code.
    pub async fn insert_agent(
        &self,
        code: &str,
        name: &str,
        memo: Option<String>,
        contact: Option<String>,
        plan: &CommissionPlan,
    ) -> Result<Agent> {
        let active_model = new_agent_active_model(code, name, memo, contact, plan, Utc::now());

        let model = active_model.insert(&self.db).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                ReftrackerError::invalid_argument(format!("agent code already exists: {}", code))
            } else {
                ReftrackerError::database_operation(format!("failed to insert agent: {}", e))
            }
        })?;

        info!("Agent created: {} ({})", model.code, model.name);
        model_to_agent(model)
    }

    /// Checks whether a tracking code is already taken, without pulling
    /// the whole row.
    pub async fn agent_code_exists(&self, code: &str) -> Result<bool> {
        if self.agent_cache.contains_key(code) {
            return Ok(true);
        }

        let db = &self.db;
        let code_owned = code.to_string();

        let found = retry::with_retry(
            &format!("agent_code_exists({})", code),
            self.retry_config,
            || async {
                agent::Entity::find()
                    .select_only()
                    .column(agent::Column::Id)
                    .filter(agent::Column::Code.eq(&code_owned))
                    .into_tuple::<i64>()
                    .one(db)
                    .await
            },
        )
        .await
        .map_err(|e| {
            ReftrackerError::database_operation(format!("failed to check agent code: {}", e))
        })?;

        Ok(found.is_some())
    }

    /// Looks up an agent by tracking code, consulting the cache first.
    ///
    /// Inactive agents are returned too; callers on the tracking path
    /// check `active` themselves.
    pub async fn get_agent_by_code(&self, code: &str) -> Result<Option<Agent>> {
        if let Some(agent) = self.agent_cache.get(code) {
            debug!("agent cache hit: {}", code);
            return Ok(Some(agent));
        }

        let db = &self.db;
        let code_owned = code.to_string();

        let model = retry::with_retry(
            &format!("get_agent_by_code({})", code),
            self.retry_config,
            || async {
                agent::Entity::find()
                    .filter(agent::Column::Code.eq(&code_owned))
                    .one(db)
                    .await
            },
        )
        .await
        .map_err(|e| {
            ReftrackerError::database_operation(format!("failed to load agent: {}", e))
        })?;

        match model {
            Some(model) => {
                let agent = model_to_agent(model)?;
                self.agent_cache.insert(code.to_string(), agent.clone());
                Ok(Some(agent))
            }
            None => Ok(None),
        }
    }

    /// Looks up an agent by internal row id. Uncached; only admin
    /// paths resolve ids.
    pub async fn get_agent_by_id(&self, id: i64) -> Result<Option<Agent>> {
        let model = agent::Entity::find_by_id(id).one(&self.db).await.map_err(|e| {
            ReftrackerError::database_operation(format!("failed to load agent: {}", e))
        })?;

        model.map(model_to_agent).transpose()
    }

    /// Cheap liveness probe for health checks.
    pub async fn count_agents(&self) -> Result<u64> {
        agent::Entity::find().count(&self.db).await.map_err(|e| {
            ReftrackerError::database_operation(format!("failed to count agents: {}", e))
        })
    }

    /// Lists agents, newest first.
    pub async fn list_agents(&self, include_inactive: bool) -> Result<Vec<Agent>> {
        let mut query = agent::Entity::find().order_by_desc(agent::Column::CreatedAt);
        if !include_inactive {
            query = query.filter(agent::Column::Active.eq(true));
        }

        let models = query.all(&self.db).await.map_err(|e| {
            error!("failed to list agents: {}", e);
            ReftrackerError::database_operation(format!("failed to list agents: {}", e))
        })?;

        models.into_iter().map(model_to_agent).collect()
    }

    /// Applies a partial update to an agent and returns the new state.
    pub async fn update_agent(&self, code: &str, update: AgentUpdate) -> Result<Agent> {
        use sea_orm::ActiveValue::Set;

        let model = agent::Entity::find()
            .filter(agent::Column::Code.eq(code))
            .one(&self.db)
            .await
            .map_err(|e| {
                ReftrackerError::database_operation(format!("failed to load agent: {}", e))
            })?
            .ok_or_else(|| ReftrackerError::not_found(format!("agent not found: {}", code)))?;

        let mut active_model: agent::ActiveModel = model.into();
        if let Some(name) = update.name {
            active_model.name = Set(name);
        }
        if let Some(memo) = update.memo {
            active_model.memo = Set(Some(memo));
        }
        if let Some(contact) = update.contact {
            active_model.contact = Set(Some(contact));
        }
        if let Some(plan) = update.plan {
            let (commission_type, commission_amount, commission_rate) = plan.to_columns();
            active_model.commission_type = Set(commission_type.to_string());
            active_model.commission_amount = Set(commission_amount);
            active_model.commission_rate = Set(commission_rate);
        }
        if let Some(active) = update.active {
            active_model.active = Set(active);
        }
        active_model.updated_at = Set(Utc::now());

        let model = active_model.update(&self.db).await.map_err(|e| {
            ReftrackerError::database_operation(format!("failed to update agent: {}", e))
        })?;

        self.invalidate_agent_cache(code);
        info!("Agent updated: {}", code);
        model_to_agent(model)
    }

    /// Soft-deactivates an agent. Repeating the call on an already
    /// inactive agent is a no-op, not an error.
    pub async fn deactivate_agent(&self, code: &str) -> Result<()> {
        use sea_orm::sea_query::Expr;

        let result = agent::Entity::update_many()
            .col_expr(agent::Column::Active, Expr::value(false))
            .col_expr(agent::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(agent::Column::Code.eq(code))
            .exec(&self.db)
            .await
            .map_err(|e| {
                ReftrackerError::database_operation(format!("failed to deactivate agent: {}", e))
            })?;

        if result.rows_affected == 0 {
            return Err(ReftrackerError::not_found(format!(
                "agent not found: {}",
                code
            )));
        }

        self.invalidate_agent_cache(code);
        info!("Agent deactivated: {}", code);
        Ok(())
    }
}
