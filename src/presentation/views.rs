use std::collections::HashSet;
use std::sync::LazyLock;

use ammonia::Builder as AmmoniaBuilder;
use askama::{Error as AskamaError, Template};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::error::HttpError;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_fragment<T: Template>(template: T) -> Result<String, TemplateRenderError> {
    template.render().map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_fragment",
            "Template rendering failed",
            err,
        )
    })
}

// Stands in for the wrapped content while an open/close pair is cleaned as one fragment.
const CHROME_SLOT: &str = "catpostschromeslot";

static CHROME_SANITIZER: LazyLock<AmmoniaBuilder<'static>> = LazyLock::new(|| {
    let mut builder = AmmoniaBuilder::default();
    builder.tags(HashSet::from([
        "a", "abbr", "article", "aside", "b", "div", "em", "footer", "h1", "h2", "h3", "h4",
        "h5", "h6", "header", "i", "li", "nav", "p", "section", "small", "span", "strong", "ul",
    ]));
    builder.generic_attributes(HashSet::from(["class", "id", "title", "role", "aria-label", "lang"]));
    builder
});

/// Markup the host wraps around a widget and its title.
///
/// Rendered without escaping, so anything not built in code goes through
/// [`WidgetChrome::sanitized`] first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetChrome {
    pub before_widget: String,
    pub after_widget: String,
    pub before_title: String,
    pub after_title: String,
}

impl WidgetChrome {
    /// The wrapper most themes register for sidebar widgets.
    ///
    /// Characters outside `[A-Za-z0-9_-]` are dropped from the element id.
    pub fn sidebar(widget_id: &str) -> Self {
        let id: String = widget_id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
            .collect();
        Self {
            before_widget: format!(r#"<section id="{id}" class="widget widget_category_posts">"#),
            after_widget: "</section>".to_string(),
            before_title: r#"<h2 class="widget-title">"#.to_string(),
            after_title: "</h2>".to_string(),
        }
    }

    /// Run both wrapper pairs through the post-content allowlist.
    ///
    /// Each opening fragment is cleaned together with its closing fragment so
    /// that an element opened in one and closed in the other survives. A pair
    /// that cannot be split back apart is dropped.
    pub fn sanitized(&self) -> Self {
        let (before_widget, after_widget) = clean_pair(&self.before_widget, &self.after_widget);
        let (before_title, after_title) = clean_pair(&self.before_title, &self.after_title);
        Self {
            before_widget,
            after_widget,
            before_title,
            after_title,
        }
    }
}

fn clean_pair(open: &str, close: &str) -> (String, String) {
    if open.contains(CHROME_SLOT) || close.contains(CHROME_SLOT) {
        return (String::new(), String::new());
    }

    let cleaned = CHROME_SANITIZER
        .clean(&format!("{open}{CHROME_SLOT}{close}"))
        .to_string();
    match cleaned.split_once(CHROME_SLOT) {
        Some((open, close)) if !close.contains(CHROME_SLOT) => (open.to_string(), close.to_string()),
        _ => (String::new(), String::new()),
    }
}

#[derive(Debug, Clone)]
pub struct ThumbnailView {
    pub url: String,
    pub alt: String,
    pub width: u32,
    pub height: u32,
    pub size_name: String,
}

#[derive(Debug, Clone)]
pub struct PostItemView {
    pub permalink: String,
    pub title: String,
    pub thumbnail: Option<ThumbnailView>,
    pub date: Option<String>,
    /// Already stripped of markup and escaped.
    pub excerpt: Option<String>,
    pub comment_label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CategoryPostsView {
    pub chrome: WidgetChrome,
    pub title: String,
    pub title_href: Option<String>,
    pub items: Vec<PostItemView>,
}

#[derive(Template)]
#[template(path = "widgets/category_posts.html")]
pub struct CategoryPostsTemplate {
    pub view: CategoryPostsView,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(items: Vec<PostItemView>) -> CategoryPostsView {
        CategoryPostsView {
            chrome: WidgetChrome {
                before_widget: "<div class=\"w\">".into(),
                after_widget: "</div>".into(),
                before_title: "<h3>".into(),
                after_title: "</h3>".into(),
            },
            title: "News & Notes".into(),
            title_href: None,
            items,
        }
    }

    fn item(title: &str) -> PostItemView {
        PostItemView {
            permalink: "https://example.com/a/".into(),
            title: title.into(),
            thumbnail: None,
            date: None,
            excerpt: None,
            comment_label: None,
        }
    }

    #[test]
    fn chrome_is_verbatim_and_text_is_escaped() {
        let html = render_fragment(CategoryPostsTemplate {
            view: view(vec![item("<b>Bold</b>")]),
        })
        .expect("render");

        assert!(html.starts_with("<div class=\"w\">"));
        assert!(html.contains("<h3>News &#38; Notes</h3>"));
        assert!(html.contains("&#60;b&#62;Bold&#60;/b&#62;"));
        assert!(!html.contains("<b>Bold</b>"));
        assert!(html.trim_end().ends_with("</div>"));
    }

    #[test]
    fn optional_parts_render_only_when_present() {
        let mut full = item("Full");
        full.date = Some("5 Mar 2024".into());
        full.excerpt = Some("Short text [&hellip;]".into());
        full.comment_label = Some("2 Comments".into());
        full.thumbnail = Some(ThumbnailView {
            url: "https://example.com/t.png".into(),
            alt: "thumb".into(),
            width: 80,
            height: 60,
            size_name: "cat_post_thumb_size1".into(),
        });

        let html = render_fragment(CategoryPostsTemplate {
            view: view(vec![full, item("Bare")]),
        })
        .expect("render");

        assert_eq!(html.matches("<li class=\"cat-post-item\">").count(), 2);
        assert_eq!(html.matches("<p class=\"post-date\">5 Mar 2024</p>").count(), 1);
        assert!(html.contains("<p>Short text [&hellip;]</p>"));
        assert!(html.contains("<p class=\"comment-num\">(2 Comments)</p>"));
        assert!(html.contains("class=\"attachment-cat_post_thumb_size1\""));
        assert!(html.contains("width=\"80\""));
    }

    #[test]
    fn title_link_wraps_heading() {
        let mut linked = view(Vec::new());
        linked.title_href = Some("https://example.com/category/news/".into());
        let html = render_fragment(CategoryPostsTemplate { view: linked }).expect("render");
        assert!(html.contains("<a href=\"https://example.com/category/news/\">"));
        assert!(html.contains("<ul>"));
    }

    #[test]
    fn sidebar_chrome_sanitizes_widget_id() {
        let chrome = WidgetChrome::sidebar("category-posts-\"3");
        assert_eq!(
            chrome.before_widget,
            r#"<section id="category-posts-3" class="widget widget_category_posts">"#
        );
    }

    #[test]
    fn sanitizing_keeps_sidebar_chrome_intact() {
        let chrome = WidgetChrome::sidebar("category-posts-2");
        assert_eq!(chrome.sanitized(), chrome);
    }

    #[test]
    fn sanitizing_strips_scripts_and_handlers() {
        let chrome = WidgetChrome {
            before_widget: r#"<script>alert(1)</script><div class="box" onclick="steal()">"#.into(),
            after_widget: "</div>".into(),
            before_title: r#"<h3><img src=x onerror=alert(1)>"#.into(),
            after_title: "</h3>".into(),
        }
        .sanitized();

        assert_eq!(chrome.before_widget, r#"<div class="box">"#);
        assert_eq!(chrome.after_widget, "</div>");
        assert_eq!(chrome.before_title, "<h3>");
        assert_eq!(chrome.after_title, "</h3>");
    }

    #[test]
    fn unclosed_script_swallows_the_whole_pair() {
        let chrome = WidgetChrome {
            before_widget: "<script>".into(),
            after_widget: "</div>".into(),
            ..WidgetChrome::default()
        }
        .sanitized();
        assert_eq!(chrome.before_widget, "");
        assert_eq!(chrome.after_widget, "");
    }

    #[test]
    fn slot_marker_in_input_drops_the_pair() {
        let chrome = WidgetChrome {
            before_title: format!(r#"<h3 title="{CHROME_SLOT}">"#),
            after_title: "</h3>".into(),
            ..WidgetChrome::default()
        }
        .sanitized();
        assert_eq!(chrome.before_title, "");
        assert_eq!(chrome.after_title, "");
    }
}
