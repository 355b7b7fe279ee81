//! SeaORM storage backend
//!
//! This module provides database storage using SeaORM,
//! supporting SQLite, MySQL/MariaDB, and PostgreSQL.

mod agents;
mod clicks;
mod connection;
mod conversions;
mod converters;
mod reports;
pub mod retry;
mod sessions;

use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::sync::Cache;
use sea_orm::DatabaseConnection;
use tracing::warn;

use crate::errors::{ReftrackerError, Result};
use crate::storage::models::{Agent, ConversionStatus};

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use conversions::SettlementTotals;
pub use reports::{AgentClickRow, AgentConversionRow, ConversionTimelineRow, TimelineRow};

/// Infers the database backend from the connection URL.
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite://")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(ReftrackerError::database_config(format!(
            "cannot infer database backend from URL: {}. Supported schemes: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// Normalizes backend aliases to the canonical name.
pub fn normalize_backend_name(backend: &str) -> String {
    match backend {
        "mariadb" => "mysql".to_string(),
        other => other.to_string(),
    }
}

/// Partial update for an agent. `None` fields keep their stored value.
#[derive(Default, Clone, Debug)]
pub struct AgentUpdate {
    pub name: Option<String>,
    pub memo: Option<String>,
    pub contact: Option<String>,
    pub plan: Option<crate::commission::CommissionPlan>,
    pub active: Option<bool>,
}

/// Filter for conversion listings.
#[derive(Default, Clone, Debug)]
pub struct ConversionFilter {
    /// Restrict to a single agent
    pub agent_id: Option<i64>,
    /// Restrict to a workflow status
    pub status: Option<ConversionStatus>,
    /// created_at >= created_after
    pub created_after: Option<DateTime<Utc>>,
    /// created_at < created_before
    pub created_before: Option<DateTime<Utc>>,
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    /// Agent lookup cache keyed by tracking code. Only found rows are
    /// cached, never misses, so a freshly created agent is visible on
    /// its first lookup.
    agent_cache: Cache<String, Agent>,
    /// Retry policy
    retry_config: retry::RetryConfig,
}

impl SeaOrmStorage {
    pub async fn new(database_url: &str, backend_name: &str) -> Result<Self> {
        if database_url.is_empty() {
            return Err(ReftrackerError::database_config(
                "DATABASE_URL is not set".to_string(),
            ));
        }

        let config = crate::config::get_config();
        let retry_config = retry::RetryConfig {
            max_retries: config.database.retry_count,
            base_delay_ms: config.database.retry_base_delay_ms,
            max_delay_ms: config.database.retry_max_delay_ms,
        };

        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(database_url, backend_name).await?
        };

        let storage = SeaOrmStorage {
            db,
            backend_name: backend_name.to_string(),
            agent_cache: Cache::builder()
                .time_to_live(Duration::from_secs(config.tracking.agent_cache_ttl_secs))
                .max_capacity(config.tracking.agent_cache_capacity)
                .build(),
            retry_config,
        };

        run_migrations(&storage.db).await?;

        warn!(
            "{} Storage initialized.",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    pub fn get_backend_name(&self) -> &str {
        &self.backend_name
    }

    /// Returns the raw database connection for callers that need direct
    /// access, such as integration tests.
    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Drops the cached lookup for one tracking code. Called on every
    /// agent mutation so staleness never outlives the write.
    pub fn invalidate_agent_cache(&self, code: &str) {
        self.agent_cache.invalidate(code);
    }
}
