//! Saving widget settings and describing the settings form.

use std::sync::Arc;

use tracing::info;

use crate::application::error::AppError;
use crate::application::options::WidgetOptions;
use crate::application::repos::CategoriesRepo;
use crate::application::widget::{FormSchema, HostCapabilities, Widget};
use crate::cache::CacheTrigger;
use crate::domain::types::{ScopeId, WidgetInstanceId};
use crate::domain::widget::{RawSettings, WidgetInstanceSettings};

#[derive(Clone)]
pub struct WidgetAdminService {
    widget: Arc<dyn Widget>,
    options: WidgetOptions,
    categories: Arc<dyn CategoriesRepo>,
    trigger: Arc<CacheTrigger>,
    host: HostCapabilities,
}

impl WidgetAdminService {
    pub fn new(
        widget: Arc<dyn Widget>,
        options: WidgetOptions,
        categories: Arc<dyn CategoriesRepo>,
        trigger: Arc<CacheTrigger>,
        host: HostCapabilities,
    ) -> Self {
        Self {
            widget,
            options,
            categories,
            trigger,
            host,
        }
    }

    /// Validate and persist submitted settings, then invalidate the instance's renders.
    pub async fn update_settings(
        &self,
        scope: &ScopeId,
        instance: &WidgetInstanceId,
        raw: &RawSettings,
    ) -> Result<WidgetInstanceSettings, AppError> {
        let settings = self.widget.apply_settings(raw)?;

        self.options.save_instance(instance, &settings).await?;
        if self.host.supports_thumbnails {
            self.options
                .save_thumbnail_size(instance, settings.thumbnail)
                .await?;
        }

        self.trigger.widget_settings_updated(scope, instance).await;

        info!(
            scope = %scope,
            instance = %instance,
            sort_by = settings.sort_by.as_str(),
            count = settings.count.get(),
            "Widget settings updated"
        );
        Ok(settings)
    }

    /// Form for the instance's saved settings, or for the defaults if it has none yet.
    pub async fn form(&self, instance: &WidgetInstanceId) -> Result<FormSchema, AppError> {
        let settings = self
            .options
            .load_instance(instance)
            .await?
            .unwrap_or_default();
        let categories = self.categories.list_categories().await?;

        Ok(self
            .widget
            .describe_form(&settings, &self.host)
            .with_categories(&categories))
    }
}
