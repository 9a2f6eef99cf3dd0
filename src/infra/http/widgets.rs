use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::error::{AppError, HttpError};
use crate::application::widget::FormSchema;
use crate::cache::EventKind;
use crate::domain::types::{ScopeId, WidgetInstanceId};
use crate::domain::widget::RawSettings;
use crate::presentation::views::WidgetChrome;

use super::HttpState;

const SOURCE: &str = "infra::http::widgets";

/// Chrome overrides; when none are given the sidebar wrapper is used.
///
/// Overrides are untrusted and get sanitized before they reach the page.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct ChromeQuery {
    before_widget: Option<String>,
    after_widget: Option<String>,
    before_title: Option<String>,
    after_title: Option<String>,
}

impl ChromeQuery {
    fn into_chrome(self, instance: &WidgetInstanceId) -> WidgetChrome {
        let ChromeQuery {
            before_widget,
            after_widget,
            before_title,
            after_title,
        } = self;

        if before_widget.is_none()
            && after_widget.is_none()
            && before_title.is_none()
            && after_title.is_none()
        {
            return WidgetChrome::sidebar(instance.as_str());
        }

        WidgetChrome {
            before_widget: before_widget.unwrap_or_default(),
            after_widget: after_widget.unwrap_or_default(),
            before_title: before_title.unwrap_or_default(),
            after_title: after_title.unwrap_or_default(),
        }
    }
}

pub(super) async fn render_widget(
    State(state): State<HttpState>,
    Path(instance): Path<String>,
    Query(query): Query<ChromeQuery>,
) -> Result<Html<String>, AppError> {
    let instance = WidgetInstanceId::new(instance);
    let chrome = query.into_chrome(&instance);
    let html = state.render.render(&state.scope, &instance, chrome).await?;
    Ok(Html(html))
}

pub(super) async fn widget_form(
    State(state): State<HttpState>,
    Path(instance): Path<String>,
) -> Result<Json<FormSchema>, AppError> {
    let form = state.admin.form(&WidgetInstanceId::new(instance)).await?;
    Ok(Json(form))
}

pub(super) async fn update_settings(
    State(state): State<HttpState>,
    Path(instance): Path<String>,
    Form(raw): Form<RawSettings>,
) -> Result<StatusCode, AppError> {
    state
        .admin
        .update_settings(&state.scope, &WidgetInstanceId::new(instance), &raw)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub(super) struct EventRequest {
    #[serde(default)]
    scope: Option<ScopeId>,
    #[serde(flatten)]
    kind: EventKind,
}

#[derive(Debug, Serialize)]
struct EventAccepted {
    published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_id: Option<Uuid>,
}

pub(super) async fn publish_event(
    State(state): State<HttpState>,
    Json(request): Json<EventRequest>,
) -> Response {
    let scope = request.scope.unwrap_or_else(|| state.scope.clone());
    if scope.as_str().trim().is_empty() {
        return invalid_event("event scope must not be empty");
    }
    if scope != state.scope {
        return invalid_event("event scope does not belong to this site");
    }

    let event = state.trigger.trigger(&scope, request.kind).await;
    let body = EventAccepted {
        published: event.is_some(),
        event_id: event.map(|event| event.id),
    };
    (StatusCode::ACCEPTED, Json(body)).into_response()
}

fn invalid_event(detail: &'static str) -> Response {
    HttpError::new(SOURCE, StatusCode::BAD_REQUEST, "Invalid event", detail).into_response()
}

pub(super) async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}
