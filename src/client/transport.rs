//! Event delivery from the client agent to the tracking endpoints
//!
//! Delivery is fire-and-forget: the host page must never block or fail
//! because the tracking backend is slow or down.

use std::sync::OnceLock;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::warn;
use ureq::Agent;

/// HTTP request timeout for event posts.
const HTTP_TIMEOUT_SECS: u64 = 2;

static HTTP_AGENT: OnceLock<Agent> = OnceLock::new();

fn get_agent() -> &'static Agent {
    HTTP_AGENT.get_or_init(|| {
        Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(HTTP_TIMEOUT_SECS)))
            .build()
            .into()
    })
}

/// A click event in the exact wire shape of `POST /track/click`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    pub agent_id: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landing_page: Option<String>,
}

/// A conversion event in the exact wire shape of `POST /track/conversion`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionEvent {
    pub agent_id: String,
    pub session_id: String,
    pub form_data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_value: Option<i64>,
}

pub trait EventTransport: Send + Sync {
    fn send_click(&self, event: ClickEvent);
    fn send_conversion(&self, event: ConversionEvent);
}

/// Posts events to a running tracking server.
pub struct HttpTransport {
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn post_json<T: Serialize + Send + 'static>(&self, path: &str, event: T) {
        let url = format!("{}{}", self.base_url, path);
        // Detached thread so a slow backend cannot stall the page.
        std::thread::spawn(move || {
            if let Err(e) = get_agent().post(&url).send_json(&event) {
                warn!("event delivery to \"{}\" failed: {}", url, e);
            }
        });
    }
}

impl EventTransport for HttpTransport {
    fn send_click(&self, event: ClickEvent) {
        self.post_json("/track/click", event);
    }

    fn send_conversion(&self, event: ConversionEvent) {
        self.post_json("/track/conversion", event);
    }
}

/// Captures events instead of delivering them. Backs the agent tests
/// and dry-run embeddings.
#[derive(Default)]
pub struct RecordingTransport {
    clicks: Mutex<Vec<ClickEvent>>,
    conversions: Mutex<Vec<ConversionEvent>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clicks(&self) -> Vec<ClickEvent> {
        self.clicks.lock().clone()
    }

    pub fn conversions(&self) -> Vec<ConversionEvent> {
        self.conversions.lock().clone()
    }
}

impl EventTransport for RecordingTransport {
    fn send_click(&self, event: ClickEvent) {
        self.clicks.lock().push(event);
    }

    fn send_conversion(&self, event: ConversionEvent) {
        self.conversions.lock().push(event);
    }
}
