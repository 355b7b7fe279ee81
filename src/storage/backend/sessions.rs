//! Session upsert and lookup for SeaOrmStorage
//!
//! A session row is keyed by the caller-supplied session code. Under
//! concurrent clicks the unique index on that code is what guarantees
//! exactly one row per session; everything here is written to survive
//! losing either side of that race.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, ExprTrait, QueryFilter};
use tracing::debug;

use super::converters::model_to_session;
use super::{SeaOrmStorage, retry};
use crate::errors::{ReftrackerError, Result};
use crate::storage::models::Session;
use crate::utils::ua::UaProfile;

use migration::entities::session;

async fn fetch_session(
    db: &DatabaseConnection,
    session_code: &str,
) -> std::result::Result<session::Model, DbErr> {
    session::Entity::find()
        .filter(session::Column::SessionCode.eq(session_code))
        .one(db)
        .await?
        .ok_or_else(|| {
            DbErr::RecordNotFound(format!("session row missing after upsert: {}", session_code))
        })
}

async fn count_page_view(
    db: &DatabaseConnection,
    session_code: &str,
    now: DateTime<Utc>,
) -> std::result::Result<u64, DbErr> {
    let result = session::Entity::update_many()
        .col_expr(
            session::Column::PageViews,
            Expr::col(session::Column::PageViews).add(1),
        )
        .col_expr(session::Column::LastSeenAt, Expr::value(now))
        .filter(session::Column::SessionCode.eq(session_code))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// One attempt at the touch-or-create flow. Returns the row and
/// whether this call created it.
async fn upsert_session_once(
    db: &DatabaseConnection,
    agent_id: i64,
    session_code: &str,
    profile: &UaProfile,
    now: DateTime<Utc>,
) -> std::result::Result<(session::Model, bool), DbErr> {
    use sea_orm::ActiveValue::*;

    // Fast path: the session already exists, count the view in place.
    if count_page_view(db, session_code, now).await? == 1 {
        return Ok((fetch_session(db, session_code).await?, false));
    }

    let active_model = session::ActiveModel {
        id: NotSet,
        session_code: Set(session_code.to_string()),
        agent_id: Set(agent_id),
        device_type: Set(profile.device_type.to_string()),
        browser: Set(profile.browser.to_string()),
        os: Set(profile.os.to_string()),
        page_views: Set(1),
        converted: Set(false),
        started_at: Set(now),
        last_seen_at: Set(now),
        ended_at: Set(None),
    };

    let inserted = session::Entity::insert(active_model)
        .on_conflict(
            OnConflict::column(session::Column::SessionCode)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    if inserted == 0 {
        // Lost the insert race to a concurrent click. The row exists
        // now, so this view still has to be counted there.
        count_page_view(db, session_code, now).await?;
        return Ok((fetch_session(db, session_code).await?, false));
    }

    Ok((fetch_session(db, session_code).await?, true))
}

impl SeaOrmStorage {
    /// Touches a session for an incoming click: increments its page
    /// views if it exists, creates it with the classified device
    /// profile otherwise. Returns the row and whether it was created.
    ///
    /// The agent id and profile are only consulted when the row is
    /// created; an existing session keeps its original binding even if
    /// the caller passes a different agent.
    pub async fn touch_session(
        &self,
        agent_id: i64,
        session_code: &str,
        profile: &UaProfile,
    ) -> Result<(Session, bool)> {
        let db = &self.db;
        let now = Utc::now();

        let (model, created) = retry::with_retry(
            &format!("touch_session({})", session_code),
            self.retry_config,
            || async { upsert_session_once(db, agent_id, session_code, profile, now).await },
        )
        .await
        .map_err(|e| {
            ReftrackerError::database_operation(format!("failed to upsert session: {}", e))
        })?;

        Ok((model_to_session(model), created))
    }

    pub async fn get_session_by_code(&self, session_code: &str) -> Result<Option<Session>> {
        let model = session::Entity::find()
            .filter(session::Column::SessionCode.eq(session_code))
            .one(&self.db)
            .await
            .map_err(|e| {
                ReftrackerError::database_operation(format!("failed to load session: {}", e))
            })?;

        Ok(model.map(model_to_session))
    }

    /// Marks a session as converted and closes it out. A session-less
    /// conversion (form submitted without any tracked click) simply
    /// matches no row, which is fine.
    pub async fn mark_session_converted(&self, session_code: &str) -> Result<()> {
        let now = Utc::now();

        let result = session::Entity::update_many()
            .col_expr(session::Column::Converted, Expr::value(true))
            .col_expr(session::Column::EndedAt, Expr::value(Some(now)))
            .col_expr(session::Column::LastSeenAt, Expr::value(now))
            .filter(session::Column::SessionCode.eq(session_code))
            .exec(&self.db)
            .await
            .map_err(|e| {
                ReftrackerError::database_operation(format!(
                    "failed to mark session converted: {}",
                    e
                ))
            })?;

        if result.rows_affected == 0 {
            debug!("no session row for converted session code {}", session_code);
        }

        Ok(())
    }
}
