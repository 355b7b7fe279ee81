use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::commission::CommissionPlan;
use crate::utils::ua::DeviceType;

/// A marketing agent. The numeric id stays internal; the six character
/// `code` is the public identity carried in links and the wire protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub memo: Option<String>,
    pub contact: Option<String>,
    pub plan: CommissionPlan,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One visitor browsing session, bound to the first agent that touched it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub session_code: String,
    pub agent_id: i64,
    pub device_type: DeviceType,
    pub browser: String,
    pub os: String,
    pub page_views: i64,
    pub converted: bool,
    pub started_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Append-only click record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Click {
    pub id: i64,
    pub agent_id: i64,
    pub session_code: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub landing_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Workflow state of a conversion. Moves forward only.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ConversionStatus {
    #[default]
    Pending,
    Contacted,
    Settled,
}

impl ConversionStatus {
    fn rank(self) -> u8 {
        match self {
            ConversionStatus::Pending => 0,
            ConversionStatus::Contacted => 1,
            ConversionStatus::Settled => 2,
        }
    }

    /// Whether moving to `next` is a legal forward step. Same-state is
    /// not a transition; callers treat it as an idempotent no-op.
    pub fn can_advance_to(self, next: ConversionStatus) -> bool {
        next.rank() > self.rank()
    }
}

/// A recorded conversion. Append-only apart from the status workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversion {
    pub id: i64,
    pub agent_id: i64,
    pub session_code: String,
    pub click_id: Option<i64>,
    pub form_data: serde_json::Value,
    pub estimated_value: i64,
    pub commission_amount: i64,
    pub status: ConversionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub contacted_at: Option<DateTime<Utc>>,
    pub settled_at: Option<DateTime<Utc>>,
}

/// Input for appending a click.
#[derive(Debug, Clone, Default)]
pub struct NewClick {
    pub agent_id: i64,
    pub session_code: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub landing_url: Option<String>,
}

/// Input for appending a conversion.
#[derive(Debug, Clone)]
pub struct NewConversion {
    pub agent_id: i64,
    pub session_code: String,
    pub click_id: Option<i64>,
    pub form_data: serde_json::Value,
    pub estimated_value: i64,
    pub commission_amount: i64,
}
