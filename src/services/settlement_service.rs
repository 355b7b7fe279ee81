//! Settlement service
//!
//! Monthly commission closing. A settlement run stamps every verified
//! (`contacted`) conversion of the month as settled; the preview shows
//! what such a run would pay out per agent. Only `contacted` rows are
//! ever settled, unverified `pending` rows stay out of the payout.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Months, NaiveDate, NaiveTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::{ReftrackerError, Result};
use crate::storage::SeaOrmStorage;
use crate::system::event::{Event, EventBus, EventType};

// ============ Public types ============

/// Per-agent line of a settlement preview.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementRow {
    pub agent_code: String,
    pub agent_name: String,
    pub conversions: i64,
    pub pending: i64,
    pub contacted: i64,
    pub settled: i64,
    /// Commission still owed for this month (`contacted` rows).
    pub payable_amount: i64,
    /// Commission already settled for this month.
    pub settled_amount: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettlementPreview {
    pub month: String,
    pub rows: Vec<SettlementRow>,
    pub total_payable: i64,
    pub total_settled: i64,
}

/// Outcome of a settlement run, with the state after the run.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementOutcome {
    pub month: String,
    pub settled_count: u64,
    pub preview: SettlementPreview,
}

// ============ SettlementService ============

pub struct SettlementService {
    storage: Arc<SeaOrmStorage>,
    events: Arc<EventBus>,
}

impl SettlementService {
    pub fn new(storage: Arc<SeaOrmStorage>, events: Arc<EventBus>) -> Self {
        Self { storage, events }
    }

    /// Parses a `YYYY-MM` month into its UTC window, end exclusive.
    pub fn parse_month(month: &str) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let first_day = NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d")
            .map_err(|_| {
                ReftrackerError::invalid_argument(format!(
                    "invalid month '{}': expected YYYY-MM",
                    month
                ))
            })?;
        let next_month = first_day
            .checked_add_months(Months::new(1))
            .ok_or_else(|| {
                ReftrackerError::invalid_argument(format!("month out of range: {}", month))
            })?;

        Ok((
            first_day.and_time(NaiveTime::MIN).and_utc(),
            next_month.and_time(NaiveTime::MIN).and_utc(),
        ))
    }

    /// Per-agent commission totals for the month, without changing
    /// anything.
    pub async fn preview(&self, month: &str) -> Result<SettlementPreview> {
        let (start, end) = Self::parse_month(month)?;

        let totals = self.storage.settlement_totals(start, end).await?;
        let roster: HashMap<i64, _> = self
            .storage
            .list_agents(true)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        let mut rows: Vec<SettlementRow> = totals
            .into_iter()
            .map(|t| {
                let (agent_code, agent_name) = match roster.get(&t.agent_id) {
                    Some(agent) => (agent.code.clone(), agent.name.clone()),
                    None => {
                        warn!("settlement totals reference unknown agent id {}", t.agent_id);
                        (format!("#{}", t.agent_id), "(unknown)".to_string())
                    }
                };
                SettlementRow {
                    agent_code,
                    agent_name,
                    conversions: t.conversions,
                    pending: t.pending_count.unwrap_or(0),
                    contacted: t.contacted_count.unwrap_or(0),
                    settled: t.settled_count.unwrap_or(0),
                    payable_amount: t.payable_amount.unwrap_or(0),
                    settled_amount: t.settled_amount.unwrap_or(0),
                }
            })
            .collect();
        rows.sort_by(|a, b| a.agent_code.cmp(&b.agent_code));

        let total_payable = rows.iter().map(|r| r.payable_amount).sum();
        let total_settled = rows.iter().map(|r| r.settled_amount).sum();

        Ok(SettlementPreview {
            month: month.to_string(),
            rows,
            total_payable,
            total_settled,
        })
    }

    /// Runs the settlement for a month and returns the state after.
    /// Re-running a settled month finds nothing left to stamp, so the
    /// operation cannot pay the same conversion twice.
    pub async fn settle(&self, month: &str) -> Result<SettlementOutcome> {
        let (start, end) = Self::parse_month(month)?;

        let settled_count = self.storage.settle_window(start, end).await?;
        let preview = self.preview(month).await?;

        info!(
            "SettlementService: settled {} conversions for {}, paid out {}",
            settled_count, month, preview.total_settled
        );
        self.events
            .publish(Event::system_event(
                EventType::Custom("settlement_completed".to_string()),
                &format!("settled {} conversions for {}", settled_count, month),
                "settlement_service",
            ))
            .await;

        Ok(SettlementOutcome {
            month: month.to_string(),
            settled_count,
            preview,
        })
    }

    /// Renders a settlement preview as CSV for handing to payroll.
    pub async fn export_csv(&self, month: &str) -> Result<String> {
        let preview = self.preview(month).await?;

        let mut writer = WriterBuilder::new().from_writer(Vec::new());
        for row in &preview.rows {
            writer.serialize(row).map_err(|e| {
                ReftrackerError::serialization(format!("failed to write CSV row: {}", e))
            })?;
        }

        let bytes = writer.into_inner().map_err(|e| {
            ReftrackerError::serialization(format!("failed to finish CSV: {}", e))
        })?;
        String::from_utf8(bytes).map_err(|e| {
            ReftrackerError::serialization(format!("CSV is not valid UTF-8: {}", e))
        })
    }
}
