//! Reporting queries for SeaOrmStorage
//!
//! Raw SQL-side aggregates for the reporting service. Grouping by date
//! is done with a backend-specific expression supplied by the caller;
//! merging with the agent roster happens in the service layer.

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, QueryFilter, QueryOrder, QuerySelect,
    sea_query::Expr,
};

use migration::entities::{click, conversion};

/// Per-agent click totals over a range.
#[derive(Debug, FromQueryResult)]
pub struct AgentClickRow {
    pub agent_id: i64,
    pub clicks: i64,
    pub sessions: Option<i64>,
}

/// Per-agent conversion totals over a range.
#[derive(Debug, FromQueryResult)]
pub struct AgentConversionRow {
    pub agent_id: i64,
    pub conversions: i64,
    pub estimated_sum: Option<i64>,
    pub commission_sum: Option<i64>,
}

/// One date bucket of click counts.
#[derive(Debug, FromQueryResult)]
pub struct TimelineRow {
    pub label: String,
    pub count: i64,
}

/// One date bucket of conversion counts and sums.
#[derive(Debug, FromQueryResult)]
pub struct ConversionTimelineRow {
    pub label: String,
    pub count: i64,
    pub estimated_sum: Option<i64>,
    pub commission_sum: Option<i64>,
}

impl super::SeaOrmStorage {
    /// Click and distinct-session counts per agent.
    pub async fn clicks_by_agent(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<AgentClickRow>> {
        click::Entity::find()
            .select_only()
            .column(click::Column::AgentId)
            .column_as(click::Column::Id.count(), "clicks")
            .column_as(Expr::cust("COUNT(DISTINCT session_code)"), "sessions")
            .filter(click::Column::CreatedAt.gte(start))
            .filter(click::Column::CreatedAt.lt(end))
            .group_by(click::Column::AgentId)
            .into_model::<AgentClickRow>()
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// Conversion counts and money sums per agent.
    pub async fn conversions_by_agent(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<AgentConversionRow>> {
        conversion::Entity::find()
            .select_only()
            .column(conversion::Column::AgentId)
            .column_as(conversion::Column::Id.count(), "conversions")
            .column_as(conversion::Column::EstimatedValue.sum(), "estimated_sum")
            .column_as(conversion::Column::CommissionAmount.sum(), "commission_sum")
            .filter(conversion::Column::CreatedAt.gte(start))
            .filter(conversion::Column::CreatedAt.lt(end))
            .group_by(conversion::Column::AgentId)
            .into_model::<AgentConversionRow>()
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// Click counts bucketed by the given date expression.
    pub async fn clicks_timeline(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        date_expr: Expr,
    ) -> anyhow::Result<Vec<TimelineRow>> {
        click::Entity::find()
            .select_only()
            .column_as(date_expr.clone(), "label")
            .column_as(click::Column::Id.count(), "count")
            .filter(click::Column::CreatedAt.gte(start))
            .filter(click::Column::CreatedAt.lt(end))
            .group_by(date_expr)
            .order_by_asc(Expr::cust("label"))
            .into_model::<TimelineRow>()
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// Conversion counts and sums bucketed by the given date expression.
    pub async fn conversions_timeline(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        date_expr: Expr,
    ) -> anyhow::Result<Vec<ConversionTimelineRow>> {
        conversion::Entity::find()
            .select_only()
            .column_as(date_expr.clone(), "label")
            .column_as(conversion::Column::Id.count(), "count")
            .column_as(conversion::Column::EstimatedValue.sum(), "estimated_sum")
            .column_as(conversion::Column::CommissionAmount.sum(), "commission_sum")
            .filter(conversion::Column::CreatedAt.gte(start))
            .filter(conversion::Column::CreatedAt.lt(end))
            .group_by(date_expr)
            .order_by_asc(Expr::cust("label"))
            .into_model::<ConversionTimelineRow>()
            .all(&self.db)
            .await
            .map_err(Into::into)
    }
}
