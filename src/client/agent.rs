//! The embeddable tracking agent
//!
//! Runs on the visitor's side of an integration. It recognizes agent
//! links, remembers who referred the visitor, and reports clicks and
//! lead form submissions to the tracking server. It holds no business
//! logic and never raises an error into the host application.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use super::forms::{
    FormSubmission, collect_form_data, extract_estimated_value, looks_like_conversion_form,
};
use super::store::{ATTRIBUTION_SLOT, ClientStore, SESSION_SLOT};
use super::transport::{ClickEvent, ConversionEvent, EventTransport};
use crate::utils::{generate_tracking_code, is_valid_code};

/// Attribution records outlive the browser session by a month.
pub const ATTRIBUTION_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);
/// Session ids roll over daily.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// What the agent knows about the page it was initialized on.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub url: String,
    pub referrer: Option<String>,
}

/// The stored memory of which agent referred this visitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionRecord {
    pub agent_code: String,
    pub landing_time: DateTime<Utc>,
    pub landing_url: String,
    pub referrer: Option<String>,
}

pub struct TrackingAgent {
    store: Arc<dyn ClientStore>,
    transport: Arc<dyn EventTransport>,
    attribution_ttl: Duration,
    session_ttl: Duration,
}

impl TrackingAgent {
    pub fn new(store: Arc<dyn ClientStore>, transport: Arc<dyn EventTransport>) -> Self {
        Self {
            store,
            transport,
            attribution_ttl: ATTRIBUTION_TTL,
            session_ttl: SESSION_TTL,
        }
    }

    /// Overrides the storage TTLs, mainly for tests.
    pub fn with_ttls(mut self, attribution_ttl: Duration, session_ttl: Duration) -> Self {
        self.attribution_ttl = attribution_ttl;
        self.session_ttl = session_ttl;
        self
    }

    /// Call once per page load.
    ///
    /// A `ref` query parameter on the landing URL overwrites any stored
    /// attribution: on the client side the last followed link wins,
    /// unlike the server's session binding which keeps the first agent.
    /// When an attribution record exists afterwards, a click event is
    /// emitted for it.
    pub fn initialize(&self, page: &PageContext) {
        if let Some(agent_code) = referral_code_in_url(&page.url) {
            self.write_attribution(&AttributionRecord {
                agent_code,
                landing_time: Utc::now(),
                landing_url: page.url.clone(),
                referrer: page.referrer.clone(),
            });
        }

        let session_id = self.ensure_session();

        if let Some(record) = self.read_attribution() {
            self.transport.send_click(ClickEvent {
                agent_id: record.agent_code,
                session_id,
                referrer: page.referrer.clone(),
                landing_page: Some(page.url.clone()),
            });
        }
    }

    /// Call for every form submission the host observes. Submissions
    /// that do not look like lead forms, and visitors without an
    /// attribution record, are skipped silently.
    pub fn handle_form_submission(&self, form: &FormSubmission) {
        if !looks_like_conversion_form(form) {
            debug!("form at {} skipped, not a lead form", form.action);
            return;
        }

        let Some(record) = self.read_attribution() else {
            debug!("untracked visitor, submission not reported");
            return;
        };

        let session_id = self.ensure_session();
        self.transport.send_conversion(ConversionEvent {
            agent_id: record.agent_code,
            session_id,
            form_data: collect_form_data(form),
            estimated_value: extract_estimated_value(form),
        });
    }

    fn read_attribution(&self) -> Option<AttributionRecord> {
        let raw = self.store.get(ATTRIBUTION_SLOT)?;
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("dropping unreadable attribution record: {}", e);
                self.store.remove(ATTRIBUTION_SLOT);
                None
            }
        }
    }

    fn write_attribution(&self, record: &AttributionRecord) {
        match serde_json::to_string(record) {
            Ok(json) => self.store.put(ATTRIBUTION_SLOT, json, self.attribution_ttl),
            Err(e) => warn!("could not serialize attribution record: {}", e),
        }
    }

    /// Reads the session id, creating one when absent. Every call
    /// pushes the expiry out by the session TTL.
    fn ensure_session(&self) -> String {
        let session_id = self
            .store
            .get(SESSION_SLOT)
            .unwrap_or_else(generate_tracking_code);
        self.store.put(SESSION_SLOT, session_id.clone(), self.session_ttl);
        session_id
    }
}

/// Extracts a plausible agent code from the URL's `ref` parameter.
/// With several `ref` parameters the last one counts.
fn referral_code_in_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let mut code = None;
    for (key, value) in parsed.query_pairs() {
        if key == "ref" {
            code = Some(value.into_owned());
        }
    }
    code.filter(|c| is_valid_code(c))
}
