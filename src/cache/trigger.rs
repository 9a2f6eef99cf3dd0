//! Cache trigger service.
//!
//! Write paths call these after a successful mutation so the render cache
//! learns about it.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::domain::types::{ScopeId, WidgetInstanceId};

use super::config::CacheConfig;
use super::events::{CacheEvent, EventBus, EventKind};

/// Publishes content events onto the bus.
///
/// # Usage
///
/// ```ignore
/// // After a successful post update:
/// trigger.post_upserted(&scope, post.id).await;
/// ```
pub struct CacheTrigger {
    config: CacheConfig,
    bus: Arc<EventBus>,
}

impl CacheTrigger {
    pub fn new(config: CacheConfig, bus: Arc<EventBus>) -> Self {
        Self { config, bus }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Publish an event unless caching is disabled, in which case there is
    /// nothing to invalidate.
    pub async fn trigger(&self, scope: &ScopeId, kind: EventKind) -> Option<CacheEvent> {
        if !self.config.is_enabled() {
            debug!(scope = %scope, event_kind = ?kind, "Cache trigger skipped: cache disabled");
            return None;
        }

        Some(self.bus.publish(scope.clone(), kind).await)
    }

    /// Trigger a post upsert event (create or update).
    pub async fn post_upserted(&self, scope: &ScopeId, post_id: Uuid) -> Option<CacheEvent> {
        self.trigger(scope, EventKind::PostUpserted { post_id }).await
    }

    pub async fn post_deleted(&self, scope: &ScopeId, post_id: Uuid) -> Option<CacheEvent> {
        self.trigger(scope, EventKind::PostDeleted { post_id }).await
    }

    pub async fn comment_count_changed(
        &self,
        scope: &ScopeId,
        post_id: Uuid,
        count: u64,
    ) -> Option<CacheEvent> {
        self.trigger(scope, EventKind::CommentCountChanged { post_id, count })
            .await
    }

    pub async fn widget_settings_updated(
        &self,
        scope: &ScopeId,
        instance: &WidgetInstanceId,
    ) -> Option<CacheEvent> {
        self.trigger(
            scope,
            EventKind::WidgetSettingsUpdated {
                instance: instance.clone(),
            },
        )
        .await
    }
}
