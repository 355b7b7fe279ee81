//! Visitor-side tracking agent
//!
//! Embeddable counterpart to the tracking server: link recognition,
//! attribution memory, and fire-and-forget event delivery.

mod agent;
mod forms;
mod store;
mod transport;

pub use agent::{ATTRIBUTION_TTL, AttributionRecord, PageContext, SESSION_TTL, TrackingAgent};
pub use forms::{
    FormSubmission, collect_form_data, extract_estimated_value, looks_like_conversion_form,
};
pub use store::{ATTRIBUTION_SLOT, ClientStore, MemoryStore, SESSION_SLOT};
pub use transport::{
    ClickEvent, ConversionEvent, EventTransport, HttpTransport, RecordingTransport,
};
