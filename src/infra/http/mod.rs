//! HTTP surface for rendering and administering widgets.

mod middleware;
mod widgets;

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::application::{admin::WidgetAdminService, render::WidgetRenderService};
use crate::cache::CacheTrigger;
use crate::domain::types::ScopeId;

#[derive(Clone)]
pub struct HttpState {
    /// Scope requests render and invalidate in unless they name another.
    pub scope: ScopeId,
    pub render: Arc<WidgetRenderService>,
    pub admin: Arc<WidgetAdminService>,
    pub trigger: Arc<CacheTrigger>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/widgets/{instance}", get(widgets::render_widget))
        .route("/widgets/{instance}/form", get(widgets::widget_form))
        .route("/widgets/{instance}/settings", post(widgets::update_settings))
        .route("/events", post(widgets::publish_event))
        .route("/_health", get(widgets::health))
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}
