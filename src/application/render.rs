//! Serves widget HTML through the render cache.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::application::error::AppError;
use crate::application::options::WidgetOptions;
use crate::application::widget::{HostCapabilities, RenderContext, Widget};
use crate::cache::{KeyScope, RenderCache};
use crate::domain::error::DomainError;
use crate::domain::types::{ScopeId, WidgetInstanceId};
use crate::domain::widget::WidgetInstanceSettings;
use crate::presentation::views::WidgetChrome;

/// Everything besides the content that changes a widget's output.
#[derive(Serialize)]
struct RenderFingerprint<'a> {
    settings: &'a WidgetInstanceSettings,
    chrome: &'a WidgetChrome,
    supports_thumbnails: bool,
}

#[derive(Clone)]
pub struct WidgetRenderService {
    widget: Arc<dyn Widget>,
    options: WidgetOptions,
    cache: Arc<RenderCache>,
    host: HostCapabilities,
}

impl WidgetRenderService {
    pub fn new(
        widget: Arc<dyn Widget>,
        options: WidgetOptions,
        cache: Arc<RenderCache>,
        host: HostCapabilities,
    ) -> Self {
        Self {
            widget,
            options,
            cache,
            host,
        }
    }

    pub fn cache(&self) -> &Arc<RenderCache> {
        &self.cache
    }

    /// Render the saved instance, serving a cached copy when one is live.
    pub async fn render(
        &self,
        scope: &ScopeId,
        instance: &WidgetInstanceId,
        chrome: WidgetChrome,
    ) -> Result<String, AppError> {
        let settings = self
            .options
            .load_instance(instance)
            .await?
            .ok_or(DomainError::not_found("widget instance"))?;
        let chrome = chrome.sanitized();

        let fingerprint = serde_json::to_vec(&RenderFingerprint {
            settings: &settings,
            chrome: &chrome,
            supports_thumbnails: self.host.supports_thumbnails,
        })
        .map_err(|err| AppError::unexpected(format!("render fingerprint: {err}")))?;

        let key_scope = KeyScope::new(scope.clone())
            .with_instance(instance.clone())
            .with_fingerprint(fingerprint);

        let ctx = RenderContext {
            instance: instance.clone(),
            chrome,
            host: self.host,
        };

        debug!(scope = %scope, instance = %instance, "Rendering widget");
        let html = self
            .cache
            .fetch_or_compute(&key_scope, || self.widget.render(&ctx, &settings))
            .await?;
        Ok(html)
    }
}
