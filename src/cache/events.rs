//! Content-mutation events and explicit subscription.
//!
//! Handlers register against a small, fixed set of [`EventName`]s at startup;
//! the host publishes [`EventKind`]s as content changes and the bus delivers
//! each one to the handlers subscribed to its name.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::types::{ScopeId, WidgetInstanceId};

use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::events";

/// Names an event handler can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    ContentEdited,
    ContentDeleted,
    CommentCountChanged,
    SettingsUpdated,
}

impl EventName {
    pub const ALL: [EventName; 4] = [
        EventName::ContentEdited,
        EventName::ContentDeleted,
        EventName::CommentCountChanged,
        EventName::SettingsUpdated,
    ];
}

/// A content mutation reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// A post was created or edited.
    PostUpserted { post_id: Uuid },
    /// A post was deleted.
    PostDeleted { post_id: Uuid },
    /// The number of comments on a post changed.
    CommentCountChanged { post_id: Uuid, count: u64 },
    /// A widget instance's settings were saved.
    WidgetSettingsUpdated { instance: WidgetInstanceId },
}

impl EventKind {
    pub fn name(&self) -> EventName {
        match self {
            EventKind::PostUpserted { .. } => EventName::ContentEdited,
            EventKind::PostDeleted { .. } => EventName::ContentDeleted,
            EventKind::CommentCountChanged { .. } => EventName::CommentCountChanged,
            EventKind::WidgetSettingsUpdated { .. } => EventName::SettingsUpdated,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheEvent {
    /// Unique identifier (UUIDv4).
    pub id: Uuid,
    /// Position of the event on its bus.
    pub sequence: u64,
    pub scope: ScopeId,
    pub kind: EventKind,
    pub timestamp: OffsetDateTime,
}

impl CacheEvent {
    pub fn new(scope: ScopeId, kind: EventKind, sequence: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence,
            scope,
            kind,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &CacheEvent);
}

/// Synchronous fan-out of content events to subscribed handlers.
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<HashMap<EventName, Vec<Arc<dyn EventHandler>>>>,
    sequence: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, name: EventName, handler: Arc<dyn EventHandler>) {
        rw_write(&self.handlers, SOURCE, "subscribe")
            .entry(name)
            .or_default()
            .push(handler);
        debug!(event_name = ?name, "Event handler subscribed");
    }

    pub fn subscriber_count(&self, name: EventName) -> usize {
        rw_read(&self.handlers, SOURCE, "subscriber_count")
            .get(&name)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Deliver an event to every handler subscribed to its name, in subscription order.
    pub async fn publish(&self, scope: ScopeId, kind: EventKind) -> CacheEvent {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let event = CacheEvent::new(scope, kind, sequence);

        let handlers: Vec<Arc<dyn EventHandler>> = rw_read(&self.handlers, SOURCE, "publish")
            .get(&event.kind.name())
            .cloned()
            .unwrap_or_default();

        info!(
            event_id = %event.id,
            event_sequence = event.sequence,
            event_kind = ?event.kind,
            scope = %event.scope,
            handlers = handlers.len(),
            "Content event published"
        );

        for handler in handlers {
            handler.handle(&event).await;
        }

        event
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(String, EventName)>>,
        label: String,
    }

    impl Recorder {
        fn labelled(label: &str) -> Self {
            Self {
                label: label.to_string(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl EventHandler for Recorder {
        async fn handle(&self, event: &CacheEvent) {
            self.seen
                .lock()
                .expect("recorder lock")
                .push((self.label.clone(), event.kind.name()));
        }
    }

    #[test]
    fn kinds_map_to_names() {
        let id = Uuid::nil();
        assert_eq!(EventKind::PostUpserted { post_id: id }.name(), EventName::ContentEdited);
        assert_eq!(EventKind::PostDeleted { post_id: id }.name(), EventName::ContentDeleted);
        assert_eq!(
            EventKind::CommentCountChanged { post_id: id, count: 3 }.name(),
            EventName::CommentCountChanged
        );
        assert_eq!(
            EventKind::WidgetSettingsUpdated {
                instance: WidgetInstanceId::new("w-1")
            }
            .name(),
            EventName::SettingsUpdated
        );
    }

    #[test]
    fn event_kind_json_shape() {
        let kind: EventKind = serde_json::from_str(
            r#"{"kind":"comment_count_changed","post_id":"00000000-0000-0000-0000-000000000000","count":4}"#,
        )
        .expect("tagged json");
        assert_eq!(
            kind,
            EventKind::CommentCountChanged {
                post_id: Uuid::nil(),
                count: 4
            }
        );

        let kind: EventKind =
            serde_json::from_str(r#"{"kind":"widget_settings_updated","instance":"w-9"}"#)
                .expect("tagged json");
        assert_eq!(kind.name(), EventName::SettingsUpdated);
    }

    #[tokio::test]
    async fn delivers_only_to_matching_subscriptions() {
        let bus = EventBus::new();
        let edits = Arc::new(Recorder::labelled("edits"));
        let deletes = Arc::new(Recorder::labelled("deletes"));
        bus.subscribe(EventName::ContentEdited, edits.clone());
        bus.subscribe(EventName::ContentDeleted, deletes.clone());

        bus.publish(ScopeId::new("blog"), EventKind::PostUpserted { post_id: Uuid::nil() })
            .await;

        assert_eq!(edits.seen.lock().expect("lock").len(), 1);
        assert!(deletes.seen.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn sequence_is_monotonic() {
        let bus = EventBus::new();
        let first = bus
            .publish(ScopeId::new("blog"), EventKind::PostDeleted { post_id: Uuid::nil() })
            .await;
        let second = bus
            .publish(ScopeId::new("blog"), EventKind::PostDeleted { post_id: Uuid::nil() })
            .await;
        assert!(first.sequence < second.sequence);
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_harmless() {
        let bus = EventBus::new();
        let event = bus
            .publish(
                ScopeId::new("blog"),
                EventKind::WidgetSettingsUpdated {
                    instance: WidgetInstanceId::new("w-1"),
                },
            )
            .await;
        assert_eq!(event.scope, ScopeId::new("blog"));
        assert_eq!(bus.subscriber_count(EventName::SettingsUpdated), 0);
    }
}
