use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Kinds of events flowing through the bus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    ConversionRecorded,
    AgentCreated,
    AgentDeactivated,
    SystemStartup,
    SystemShutdown,
    Custom(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
    /// Component that emitted the event, e.g. "tracking_service".
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    Conversion {
        agent_code: String,
        estimated_value: i64,
        commission_amount: i64,
    },
    Agent {
        code: String,
        name: Option<String>,
    },
    System {
        message: String,
    },
    Custom(HashMap<String, String>),
}

/// Receives events the handler declared interest in.
#[async_trait::async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &Event) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    fn name(&self) -> &str;

    fn interested_events(&self) -> Vec<EventType>;
}

/// In-process publish/subscribe bus with a bounded history.
///
/// Constructed once at startup and injected where needed; publishing is
/// best-effort, a conversion write must never fail because a
/// notification could not be delivered.
pub struct EventBus {
    handlers: Arc<Mutex<HashMap<EventType, Vec<Arc<dyn EventHandler>>>>>,
    sender: broadcast::Sender<Event>,
    history: Arc<Mutex<Vec<Event>>>,
    max_history: usize,
}

impl EventBus {
    pub fn new(max_history: usize) -> Self {
        let (sender, _) = broadcast::channel(1000);

        Self {
            handlers: Arc::new(Mutex::new(HashMap::new())),
            sender,
            history: Arc::new(Mutex::new(Vec::new())),
            max_history,
        }
    }

    pub fn register_handler(&self, handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.lock();

        for event_type in handler.interested_events() {
            handlers.entry(event_type).or_default().push(handler.clone());
        }
    }

    /// Publish an event to history, broadcast subscribers and handlers.
    ///
    /// Handler failures are logged and swallowed; a broken handler must
    /// not take the write path down with it.
    pub async fn publish(&self, event: Event) {
        {
            let mut history = self.history.lock();
            history.push(event.clone());

            if history.len() > self.max_history {
                history.remove(0);
            }
        }

        // A send error only means nobody is subscribed right now.
        if let Err(e) = self.sender.send(event.clone()) {
            warn!("No live subscribers for event broadcast: {}", e);
        }

        let interested: Vec<Arc<dyn EventHandler>> = {
            let handlers = self.handlers.lock();
            handlers
                .get(&event.event_type)
                .map(|hs| hs.to_vec())
                .unwrap_or_default()
        };

        for handler in interested {
            if let Err(e) = handler.handle(&event).await {
                error!("Event handler '{}' failed: {}", handler.name(), e);
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn get_history(&self) -> Vec<Event> {
        self.history.lock().clone()
    }

    /// Most recent events across all types, newest first.
    pub fn recent(&self, limit: usize) -> Vec<Event> {
        self.history
            .lock()
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Most recent events of one type, newest first, capped at `limit`.
    pub fn recent_by_type(&self, event_type: &EventType, limit: usize) -> Vec<Event> {
        self.history
            .lock()
            .iter()
            .rev()
            .filter(|event| &event.event_type == event_type)
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }
}

pub struct EventBuilder {
    event_type: EventType,
    source: String,
    payload: Option<EventPayload>,
}

impl EventBuilder {
    pub fn new(event_type: EventType, source: &str) -> Self {
        Self {
            event_type,
            source: source.to_string(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: EventPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn build(self) -> Event {
        Event {
            id: uuid::Uuid::new_v4().to_string(),
            event_type: self.event_type,
            timestamp: Utc::now(),
            payload: self.payload.unwrap_or(EventPayload::Custom(HashMap::new())),
            source: self.source,
        }
    }
}

impl Event {
    pub fn conversion_recorded(
        agent_code: &str,
        estimated_value: i64,
        commission_amount: i64,
        source: &str,
    ) -> Self {
        EventBuilder::new(EventType::ConversionRecorded, source)
            .with_payload(EventPayload::Conversion {
                agent_code: agent_code.to_string(),
                estimated_value,
                commission_amount,
            })
            .build()
    }

    pub fn agent_created(code: &str, name: &str, source: &str) -> Self {
        EventBuilder::new(EventType::AgentCreated, source)
            .with_payload(EventPayload::Agent {
                code: code.to_string(),
                name: Some(name.to_string()),
            })
            .build()
    }

    pub fn agent_deactivated(code: &str, source: &str) -> Self {
        EventBuilder::new(EventType::AgentDeactivated, source)
            .with_payload(EventPayload::Agent {
                code: code.to_string(),
                name: None,
            })
            .build()
    }

    pub fn system_event(event_type: EventType, message: &str, source: &str) -> Self {
        EventBuilder::new(event_type, source)
            .with_payload(EventPayload::System {
                message: message.to_string(),
            })
            .build()
    }
}

/// Default handler: writes every conversion notification to the log so a
/// bare install still surfaces new leads somewhere visible.
pub struct LogNotificationHandler;

#[async_trait::async_trait]
impl EventHandler for LogNotificationHandler {
    async fn handle(&self, event: &Event) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let EventPayload::Conversion {
            agent_code,
            estimated_value,
            commission_amount,
        } = &event.payload
        {
            info!(
                agent = %agent_code,
                estimated_value,
                commission_amount,
                "New conversion recorded"
            );
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "log_notification"
    }

    fn interested_events(&self) -> Vec<EventType> {
        vec![EventType::ConversionRecorded]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct TestHandler {
        name: String,
        counter: Arc<AtomicUsize>,
        interested_events: Vec<EventType>,
    }

    impl TestHandler {
        fn new(name: &str, interested_events: Vec<EventType>) -> Self {
            Self {
                name: name.to_string(),
                counter: Arc::new(AtomicUsize::new(0)),
                interested_events,
            }
        }

        fn get_count(&self) -> usize {
            self.counter.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl EventHandler for TestHandler {
        async fn handle(
            &self,
            _event: &Event,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &str {
            &self.name
        }

        fn interested_events(&self) -> Vec<EventType> {
            self.interested_events.clone()
        }
    }

    #[tokio::test]
    async fn test_event_bus_dispatch_and_history() {
        let event_bus = EventBus::new(100);

        let handler = Arc::new(TestHandler::new(
            "test_handler",
            vec![EventType::ConversionRecorded],
        ));

        event_bus.register_handler(handler.clone());

        let event = Event::conversion_recorded("Ab3kM9", 5_600_000, 10_000, "test");
        event_bus.publish(event).await;

        assert_eq!(handler.get_count(), 1);

        let history = event_bus.get_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].event_type, EventType::ConversionRecorded);
    }

    #[tokio::test]
    async fn test_handler_only_sees_interested_types() {
        let event_bus = EventBus::new(100);
        let handler = Arc::new(TestHandler::new(
            "conversions_only",
            vec![EventType::ConversionRecorded],
        ));
        event_bus.register_handler(handler.clone());

        event_bus
            .publish(Event::agent_created("Xy7nP2", "North Region", "test"))
            .await;
        assert_eq!(handler.get_count(), 0);

        event_bus
            .publish(Event::conversion_recorded("Xy7nP2", 100, 12, "test"))
            .await;
        assert_eq!(handler.get_count(), 1);
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let event_bus = EventBus::new(3);
        for i in 0..5 {
            event_bus
                .publish(Event::conversion_recorded("Ab3kM9", i, 0, "test"))
                .await;
        }
        assert_eq!(event_bus.get_history().len(), 3);
    }

    #[tokio::test]
    async fn test_recent_by_type_newest_first() {
        let event_bus = EventBus::new(100);
        event_bus
            .publish(Event::conversion_recorded("Ab3kM9", 1, 0, "test"))
            .await;
        event_bus
            .publish(Event::agent_created("Xy7nP2", "x", "test"))
            .await;
        event_bus
            .publish(Event::conversion_recorded("Ab3kM9", 2, 0, "test"))
            .await;

        let recent = event_bus.recent_by_type(&EventType::ConversionRecorded, 10);
        assert_eq!(recent.len(), 2);
        match &recent[0].payload {
            EventPayload::Conversion {
                estimated_value, ..
            } => assert_eq!(*estimated_value, 2),
            other => panic!("unexpected payload: {:?}", other),
        }
    }
}
