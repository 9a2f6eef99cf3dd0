//! Wires repositories, the render cache, and services into one site.

use std::sync::Arc;

use tracing::info;

use crate::application::admin::WidgetAdminService;
use crate::application::content::ContentService;
use crate::application::options::WidgetOptions;
use crate::application::permalinks::Permalinks;
use crate::application::render::WidgetRenderService;
use crate::application::thumbnails::ThumbnailRegistry;
use crate::application::widget::{CategoryPostsWidget, HostCapabilities, Widget};
use crate::cache::{CacheConfig, CacheStore, CacheTrigger, EventBus, MemoryStore, RenderCache};
use crate::config::SiteSettings;
use crate::domain::types::ScopeId;

use super::error::InfraError;
use super::http::HttpState;
use super::memory::{MemoryHost, SiteFixture};

/// A fully wired site.
#[derive(Clone)]
pub struct Runtime {
    pub scope: ScopeId,
    pub host: MemoryHost,
    pub cache: Arc<RenderCache>,
    pub bus: Arc<EventBus>,
    pub trigger: Arc<CacheTrigger>,
    pub render: Arc<WidgetRenderService>,
    pub admin: Arc<WidgetAdminService>,
    pub content: Arc<ContentService>,
    pub thumbnails: ThumbnailRegistry,
}

impl Runtime {
    /// Wire `host` behind an in-process store sized from `cache`.
    pub fn new(cache: CacheConfig, site: &SiteSettings, host: MemoryHost) -> Self {
        let store = Arc::new(MemoryStore::from_config(&cache));
        Self::with_store(cache, store, site, host)
    }

    pub fn with_store(
        cache: CacheConfig,
        store: Arc<dyn CacheStore>,
        site: &SiteSettings,
        host: MemoryHost,
    ) -> Self {
        let bus = Arc::new(EventBus::new());
        let render_cache = Arc::new(RenderCache::new(cache.clone(), store));
        render_cache.subscribe(&bus);
        let trigger = Arc::new(CacheTrigger::new(cache, bus.clone()));

        let capabilities = HostCapabilities {
            supports_thumbnails: site.supports_thumbnails,
        };
        let widget: Arc<dyn Widget> = Arc::new(CategoryPostsWidget::new(
            host.content.clone(),
            host.content.clone(),
            Permalinks::new(site.base_url.clone()),
        ));
        let options = WidgetOptions::new(host.settings.clone());
        let thumbnails = ThumbnailRegistry::new(options.clone());

        let render = Arc::new(WidgetRenderService::new(
            widget.clone(),
            options.clone(),
            render_cache.clone(),
            capabilities,
        ));
        let admin = Arc::new(WidgetAdminService::new(
            widget,
            options,
            host.content.clone(),
            trigger.clone(),
            capabilities,
        ));
        let content = Arc::new(ContentService::new(host.content.clone(), trigger.clone()));

        Self {
            scope: site.scope.clone(),
            host,
            cache: render_cache,
            bus,
            trigger,
            render,
            admin,
            content,
            thumbnails,
        }
    }

    pub fn http_state(&self) -> HttpState {
        HttpState {
            scope: self.scope.clone(),
            render: self.render.clone(),
            admin: self.admin.clone(),
            trigger: self.trigger.clone(),
        }
    }
}

/// Seed the configured fixture, or start from an empty site.
pub async fn load_host(site: &SiteSettings) -> Result<MemoryHost, InfraError> {
    match &site.fixture {
        Some(path) => {
            info!(fixture = %path.display(), "Loading site fixture");
            MemoryHost::seed(SiteFixture::load(path).await?).await
        }
        None => Ok(MemoryHost::empty()),
    }
}
