//! Client-side persistence
//!
//! The tracking agent keeps exactly two pieces of state: the
//! attribution record and the session id. Both go through the
//! `ClientStore` trait so embedders can back them with whatever their
//! platform offers (cookies, local storage, a file).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Slot holding the serialized attribution record.
pub const ATTRIBUTION_SLOT: &str = "reftracker_attribution";
/// Slot holding the visitor's session id.
pub const SESSION_SLOT: &str = "reftracker_session";

/// Key-value storage with per-entry expiry.
pub trait ClientStore: Send + Sync {
    /// Returns the value if present and not expired.
    fn get(&self, slot: &str) -> Option<String>;
    fn put(&self, slot: &str, value: String, ttl: Duration);
    fn remove(&self, slot: &str);
}

/// In-memory store for tests and embedded single-process use.
#[derive(Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientStore for MemoryStore {
    fn get(&self, slot: &str) -> Option<String> {
        let mut slots = self.slots.lock();
        match slots.get(slot) {
            Some((value, deadline)) if Instant::now() < *deadline => Some(value.clone()),
            Some(_) => {
                slots.remove(slot);
                None
            }
            None => None,
        }
    }

    fn put(&self, slot: &str, value: String, ttl: Duration) {
        let deadline = Instant::now() + ttl;
        self.slots.lock().insert(slot.to_string(), (value, deadline));
    }

    fn remove(&self, slot: &str) {
        self.slots.lock().remove(slot);
    }
}
