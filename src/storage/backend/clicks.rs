//! Click log operations for SeaOrmStorage

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use super::converters::{model_to_click, new_click_active_model};
use super::{SeaOrmStorage, retry};
use crate::errors::{ReftrackerError, Result};
use crate::storage::models::{Click, NewClick};

use migration::entities::click;

impl SeaOrmStorage {
    /// Appends a click row and returns it with its assigned id.
    pub async fn insert_click(&self, new_click: &NewClick) -> Result<Click> {
        let db = &self.db;
        let active_model = new_click_active_model(new_click, Utc::now());

        let model = retry::with_retry(
            &format!("insert_click({})", new_click.session_code),
            self.retry_config,
            || async { active_model.clone().insert(db).await },
        )
        .await
        .map_err(|e| {
            ReftrackerError::database_operation(format!("failed to insert click: {}", e))
        })?;

        Ok(model_to_click(model))
    }

    /// Returns the most recent click an agent earned in a session, if
    /// any. This is the click a conversion gets attributed to.
    pub async fn latest_click_for(
        &self,
        agent_id: i64,
        session_code: &str,
    ) -> Result<Option<Click>> {
        let db = &self.db;
        let code_owned = session_code.to_string();

        let model = retry::with_retry(
            &format!("latest_click_for({})", session_code),
            self.retry_config,
            || async {
                click::Entity::find()
                    .filter(click::Column::AgentId.eq(agent_id))
                    .filter(click::Column::SessionCode.eq(&code_owned))
                    .order_by_desc(click::Column::Id)
                    .one(db)
                    .await
            },
        )
        .await
        .map_err(|e| {
            ReftrackerError::database_operation(format!("failed to load latest click: {}", e))
        })?;

        Ok(model.map(model_to_click))
    }
}
