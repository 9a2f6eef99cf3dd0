//! Widget capability and its host-facing context.

mod category_posts;
pub mod form;

use async_trait::async_trait;
use thiserror::Error;

use crate::application::repos::RepoError;
use crate::domain::error::DomainError;
use crate::domain::types::WidgetInstanceId;
use crate::domain::widget::{RawSettings, WidgetInstanceSettings};
use crate::presentation::views::{TemplateRenderError, WidgetChrome};

pub use category_posts::CategoryPostsWidget;
pub use form::{FieldKind, FormField, FormSchema, SelectOption};

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error(transparent)]
    Settings(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Template(#[from] TemplateRenderError),
}

/// What the host theme offers to widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HostCapabilities {
    pub supports_thumbnails: bool,
}

/// Everything a render call needs besides the instance settings.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub instance: WidgetInstanceId,
    pub chrome: WidgetChrome,
    pub host: HostCapabilities,
}

#[async_trait]
pub trait Widget: Send + Sync {
    /// Render one instance to HTML.
    async fn render(
        &self,
        ctx: &RenderContext,
        settings: &WidgetInstanceSettings,
    ) -> Result<String, WidgetError>;

    /// Validate and normalize submitted form values.
    fn apply_settings(&self, raw: &RawSettings) -> Result<WidgetInstanceSettings, WidgetError>;

    fn describe_form(
        &self,
        settings: &WidgetInstanceSettings,
        host: &HostCapabilities,
    ) -> FormSchema;
}
