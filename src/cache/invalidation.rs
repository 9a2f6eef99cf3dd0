//! Maps content events onto render cache invalidation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::events::{CacheEvent, EventHandler, EventKind};
use super::render::RenderCache;

/// Event handler that keeps a [`RenderCache`] consistent with content changes.
///
/// Content events (edits, deletions, comment counts) retire the whole scope
/// because listings are not tracked per post. A settings update only affects
/// the instance that was reconfigured.
pub struct CacheInvalidator {
    cache: Arc<RenderCache>,
}

impl CacheInvalidator {
    pub fn new(cache: Arc<RenderCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl EventHandler for CacheInvalidator {
    async fn handle(&self, event: &CacheEvent) {
        debug!(event_id = %event.id, event_kind = ?event.kind, "Applying cache invalidation");
        match &event.kind {
            EventKind::PostUpserted { .. }
            | EventKind::PostDeleted { .. }
            | EventKind::CommentCountChanged { .. } => {
                self.cache.invalidate_scope(&event.scope).await;
            }
            EventKind::WidgetSettingsUpdated { instance } => {
                self.cache.invalidate_instance(&event.scope, instance).await;
            }
        }
    }
}
