//! The render cache in front of widget rendering.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use crate::domain::types::{ScopeId, WidgetInstanceId};

use super::config::CacheConfig;
use super::events::{EventBus, EventName};
use super::invalidation::CacheInvalidator;
use super::keys::{Epoch, EpochRegistry, KeyScope};
use super::store::CacheStore;

const METRIC_HIT: &str = "catposts_render_cache_hit_total";
const METRIC_MISS: &str = "catposts_render_cache_miss_total";
const METRIC_STORE_ERROR: &str = "catposts_render_cache_store_error_total";
const METRIC_COMPUTE_MS: &str = "catposts_render_compute_ms";

/// Short-lived cache of rendered widget HTML.
///
/// Store failures never reach callers: a failing read is a miss and a failing
/// write or delete is logged and dropped.
pub struct RenderCache {
    config: CacheConfig,
    store: Arc<dyn CacheStore>,
    epochs: EpochRegistry,
}

impl RenderCache {
    pub fn new(config: CacheConfig, store: Arc<dyn CacheStore>) -> Self {
        let epochs = EpochRegistry::new(config.max_entries_non_zero());
        Self {
            config,
            store,
            epochs,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Derive the key for `scope` in the current epoch.
    pub fn derive_key(&self, scope: &KeyScope) -> String {
        self.epochs.derive(&self.config.namespace, scope)
    }

    pub fn current_epoch(&self, scope: &ScopeId) -> Epoch {
        self.epochs.current_epoch(scope)
    }

    /// Keys remembered for `scope` so its invalidation can delete them.
    pub fn tracked_keys(&self, scope: &ScopeId) -> usize {
        self.epochs.issued_count(scope)
    }

    /// Look up a live entry. Always misses while caching is disabled.
    pub async fn get(&self, key: &str) -> Option<String> {
        if !self.config.use_cache {
            return None;
        }

        let bytes = match self.store.read(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(err) => {
                counter!(METRIC_STORE_ERROR, "op" => "read").increment(1);
                warn!(cache_key = key, error = %err, "Render cache read failed; treating as miss");
                return None;
            }
        };

        match String::from_utf8(bytes.to_vec()) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(cache_key = key, error = %err, "Discarding non UTF-8 render cache entry");
                None
            }
        }
    }

    /// Store `value` for `ttl`. A no-op while saving is disabled or `ttl` is zero.
    pub async fn set(&self, key: &str, value: &str, ttl: Duration) {
        if !self.config.should_save() || ttl.is_zero() {
            return;
        }

        if let Err(err) = self
            .store
            .write(key, Bytes::copy_from_slice(value.as_bytes()), ttl)
            .await
        {
            counter!(METRIC_STORE_ERROR, "op" => "write").increment(1);
            warn!(cache_key = key, error = %err, "Render cache write failed");
        }
    }

    /// Delete the entry for `key`, if any.
    pub async fn invalidate(&self, key: &str) {
        if let Err(err) = self.store.delete(key).await {
            counter!(METRIC_STORE_ERROR, "op" => "delete").increment(1);
            warn!(cache_key = key, error = %err, "Render cache delete failed");
        }
    }

    /// Start a new epoch for `scope` and delete everything rendered in the old one.
    pub async fn invalidate_scope(&self, scope: &ScopeId) -> Epoch {
        let (epoch, retired) = self.epochs.rotate(scope);
        for key in &retired {
            self.invalidate(key).await;
        }
        info!(
            scope = %scope,
            epoch,
            retired = retired.len(),
            "Render cache scope invalidated"
        );
        epoch
    }

    /// Delete every entry rendered for one widget instance in the current epoch.
    pub async fn invalidate_instance(&self, scope: &ScopeId, instance: &WidgetInstanceId) {
        let retired = self.epochs.take_instance(scope, instance);
        for key in &retired {
            self.invalidate(key).await;
        }
        info!(
            scope = %scope,
            instance = %instance,
            retired = retired.len(),
            "Render cache instance invalidated"
        );
    }

    /// Serve the cached render for `scope`, or compute, store and return it.
    ///
    /// `compute` does not run on a hit. Its errors are returned unchanged and
    /// nothing is stored for a failed compute.
    pub async fn fetch_or_compute<F, Fut, E>(&self, scope: &KeyScope, compute: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        if !self.config.use_cache {
            return timed_compute(compute).await;
        }

        let key = self.derive_key(scope);
        if let Some(hit) = self.get(&key).await {
            counter!(METRIC_HIT).increment(1);
            debug!(cache_key = %key, scope = %scope.scope, "Render cache hit");
            return Ok(hit);
        }

        counter!(METRIC_MISS).increment(1);
        debug!(cache_key = %key, scope = %scope.scope, "Render cache miss");

        let value = timed_compute(compute).await?;
        self.set(&key, &value, self.config.ttl).await;
        Ok(value)
    }

    /// Subscribe this cache's invalidation handler to every content event.
    pub fn subscribe(self: &Arc<Self>, bus: &EventBus) {
        let invalidator = Arc::new(CacheInvalidator::new(Arc::clone(self)));
        for name in EventName::ALL {
            bus.subscribe(name, invalidator.clone());
        }
    }
}

async fn timed_compute<F, Fut, E>(compute: F) -> Result<String, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<String, E>>,
{
    let started_at = Instant::now();
    let result = compute().await;
    histogram!(METRIC_COMPUTE_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);
    result
}
