//! Conversion workflow operations for SeaOrmStorage
//!
//! Status changes are written as conditional updates filtered on the
//! current status, so two admins racing on the same row cannot apply
//! the same transition twice or move a row backwards.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ExprTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use tracing::info;

use super::converters::{model_to_conversion, new_conversion_active_model};
use super::{ConversionFilter, SeaOrmStorage, retry};
use crate::errors::{ReftrackerError, Result};
use crate::storage::models::{Conversion, ConversionStatus, NewConversion};

use migration::entities::conversion;

/// Per-agent commission totals over a settlement window.
#[derive(Debug, Clone, FromQueryResult)]
pub struct SettlementTotals {
    pub agent_id: i64,
    pub conversions: i64,
    pub pending_count: Option<i64>,
    pub contacted_count: Option<i64>,
    pub settled_count: Option<i64>,
    /// Commission for rows still awaiting settlement (`contacted`).
    pub payable_amount: Option<i64>,
    /// Commission already paid out (`settled`).
    pub settled_amount: Option<i64>,
}

fn status_case_count(status: ConversionStatus) -> sea_orm::sea_query::SimpleExpr {
    Expr::case(conversion::Column::Status.eq(status.to_string()), 1)
        .finally(0)
        .sum()
}

fn status_case_sum(status: ConversionStatus) -> sea_orm::sea_query::SimpleExpr {
    Expr::case(
        conversion::Column::Status.eq(status.to_string()),
        Expr::col(conversion::Column::CommissionAmount),
    )
    .finally(0)
    .sum()
}

fn filter_condition(filter: &ConversionFilter) -> Condition {
    let mut condition = Condition::all();

    if let Some(agent_id) = filter.agent_id {
        condition = condition.add(conversion::Column::AgentId.eq(agent_id));
    }
    if let Some(status) = filter.status {
        condition = condition.add(conversion::Column::Status.eq(status.to_string()));
    }
    if let Some(after) = filter.created_after {
        condition = condition.add(conversion::Column::CreatedAt.gte(after));
    }
    if let Some(before) = filter.created_before {
        condition = condition.add(conversion::Column::CreatedAt.lt(before));
    }

    condition
}

impl SeaOrmStorage {
    /// Appends a conversion in `pending` state and returns it with its
    /// assigned id.
    pub async fn insert_conversion(&self, new_conversion: &NewConversion) -> Result<Conversion> {
        let db = &self.db;
        let active_model = new_conversion_active_model(new_conversion, Utc::now())?;

        let model = retry::with_retry(
            &format!("insert_conversion({})", new_conversion.session_code),
            self.retry_config,
            || async { active_model.clone().insert(db).await },
        )
        .await
        .map_err(|e| {
            ReftrackerError::database_operation(format!("failed to insert conversion: {}", e))
        })?;

        info!(
            "Conversion recorded: id={} agent_id={} commission={}",
            model.id, model.agent_id, model.commission_amount
        );
        model_to_conversion(model)
    }

    pub async fn get_conversion(&self, id: i64) -> Result<Option<Conversion>> {
        let model = conversion::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| {
                ReftrackerError::database_operation(format!("failed to load conversion: {}", e))
            })?;

        model.map(model_to_conversion).transpose()
    }

    /// Lists conversions matching the filter, newest first, along with
    /// the total row count for pagination.
    pub async fn list_conversions(
        &self,
        filter: &ConversionFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Conversion>, u64)> {
        let condition = filter_condition(filter);

        let total = conversion::Entity::find()
            .filter(condition.clone())
            .count(&self.db)
            .await
            .map_err(|e| {
                ReftrackerError::database_operation(format!("failed to count conversions: {}", e))
            })?;

        let page_offset = page.saturating_sub(1);
        let models = conversion::Entity::find()
            .filter(condition)
            .order_by_desc(conversion::Column::Id)
            .paginate(&self.db, page_size)
            .fetch_page(page_offset)
            .await
            .map_err(|e| {
                ReftrackerError::database_operation(format!("failed to list conversions: {}", e))
            })?;

        let conversions = models
            .into_iter()
            .map(model_to_conversion)
            .collect::<Result<Vec<_>>>()?;
        Ok((conversions, total))
    }

    /// Moves a conversion forward in the workflow and stamps the
    /// matching timestamp. Re-applying the current status is a no-op
    /// that returns the row unchanged; moving backwards is rejected.
    pub async fn advance_conversion_status(
        &self,
        id: i64,
        next: ConversionStatus,
    ) -> Result<Conversion> {
        let now = Utc::now();

        let predecessors: &[ConversionStatus] = match next {
            ConversionStatus::Pending => &[],
            ConversionStatus::Contacted => &[ConversionStatus::Pending],
            ConversionStatus::Settled => {
                &[ConversionStatus::Pending, ConversionStatus::Contacted]
            }
        };

        let rows_affected = if predecessors.is_empty() {
            0
        } else {
            let mut update = conversion::Entity::update_many()
                .col_expr(conversion::Column::Status, Expr::value(next.to_string()))
                .col_expr(conversion::Column::UpdatedAt, Expr::value(now))
                .filter(conversion::Column::Id.eq(id))
                .filter(
                    conversion::Column::Status
                        .is_in(predecessors.iter().map(|s| s.to_string())),
                );
            update = match next {
                ConversionStatus::Contacted => {
                    update.col_expr(conversion::Column::ContactedAt, Expr::value(Some(now)))
                }
                ConversionStatus::Settled => {
                    update.col_expr(conversion::Column::SettledAt, Expr::value(Some(now)))
                }
                ConversionStatus::Pending => update,
            };

            update
                .exec(&self.db)
                .await
                .map_err(|e| {
                    ReftrackerError::database_operation(format!(
                        "failed to update conversion status: {}",
                        e
                    ))
                })?
                .rows_affected
        };

        let current = self
            .get_conversion(id)
            .await?
            .ok_or_else(|| ReftrackerError::not_found(format!("conversion not found: {}", id)))?;

        if rows_affected == 0 {
            if current.status == next {
                return Ok(current);
            }
            return Err(ReftrackerError::invalid_argument(format!(
                "cannot move conversion {} from {} to {}",
                id, current.status, next
            )));
        }

        info!("Conversion {} moved to {}", id, next);
        Ok(current)
    }

    /// Settles every `contacted` conversion created inside the window.
    /// Returns how many rows were settled; running it again against the
    /// same window settles nothing more.
    pub async fn settle_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64> {
        let now = Utc::now();

        let result = conversion::Entity::update_many()
            .col_expr(
                conversion::Column::Status,
                Expr::value(ConversionStatus::Settled.to_string()),
            )
            .col_expr(conversion::Column::SettledAt, Expr::value(Some(now)))
            .col_expr(conversion::Column::UpdatedAt, Expr::value(now))
            .filter(conversion::Column::Status.eq(ConversionStatus::Contacted.to_string()))
            .filter(conversion::Column::CreatedAt.gte(start))
            .filter(conversion::Column::CreatedAt.lt(end))
            .exec(&self.db)
            .await
            .map_err(|e| {
                ReftrackerError::database_operation(format!("failed to settle window: {}", e))
            })?;

        info!(
            "Settled {} conversions in window {} .. {}",
            result.rows_affected, start, end
        );
        Ok(result.rows_affected)
    }

    /// Per-agent commission totals for conversions created inside the
    /// window, grouped by agent.
    pub async fn settlement_totals(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SettlementTotals>> {
        conversion::Entity::find()
            .select_only()
            .column(conversion::Column::AgentId)
            .column_as(conversion::Column::Id.count(), "conversions")
            .column_as(status_case_count(ConversionStatus::Pending), "pending_count")
            .column_as(
                status_case_count(ConversionStatus::Contacted),
                "contacted_count",
            )
            .column_as(status_case_count(ConversionStatus::Settled), "settled_count")
            .column_as(status_case_sum(ConversionStatus::Contacted), "payable_amount")
            .column_as(status_case_sum(ConversionStatus::Settled), "settled_amount")
            .filter(conversion::Column::CreatedAt.gte(start))
            .filter(conversion::Column::CreatedAt.lt(end))
            .group_by(conversion::Column::AgentId)
            .into_model::<SettlementTotals>()
            .all(&self.db)
            .await
            .map_err(|e| {
                ReftrackerError::database_operation(format!(
                    "failed to aggregate settlement totals: {}",
                    e
                ))
            })
    }
}
