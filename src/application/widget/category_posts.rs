use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::application::permalinks::Permalinks;
use crate::application::repos::{CategoriesRepo, PostListQuery, PostsRepo};
use crate::application::thumbnails::size_name;
use crate::domain::entities::PostRecord;
use crate::domain::posts::{comment_count_label, excerpt_for, format_post_date};
use crate::domain::types::SortField;
use crate::domain::widget::{RawSettings, WidgetInstanceSettings, fields};
use crate::presentation::views::{
    CategoryPostsTemplate, CategoryPostsView, PostItemView, ThumbnailView, render_fragment,
};

use super::form::{FieldKind, FormField, FormSchema, SelectOption, category_value};
use super::{HostCapabilities, RenderContext, Widget, WidgetError};

const THUMBNAIL_GROUP: &str = "Thumbnail dimensions";

/// Lists the latest posts of one category.
#[derive(Clone)]
pub struct CategoryPostsWidget {
    posts: Arc<dyn PostsRepo>,
    categories: Arc<dyn CategoriesRepo>,
    permalinks: Permalinks,
}

impl CategoryPostsWidget {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        categories: Arc<dyn CategoriesRepo>,
        permalinks: Permalinks,
    ) -> Self {
        Self {
            posts,
            categories,
            permalinks,
        }
    }

    async fn build_view(
        &self,
        ctx: &RenderContext,
        settings: &WidgetInstanceSettings,
    ) -> Result<CategoryPostsView, WidgetError> {
        let category = match settings.category_id {
            Some(id) => self.categories.find_category(id).await?,
            None => None,
        };

        let title = if settings.title.trim().is_empty() {
            category
                .as_ref()
                .map(|category| category.name.clone())
                .unwrap_or_default()
        } else {
            settings.title.clone()
        };

        let title_href = category
            .as_ref()
            .filter(|_| settings.title_link)
            .map(|category| self.permalinks.category(category));

        let query = PostListQuery {
            category_id: settings.category_id,
            limit: settings.count,
            order: settings.sort_order(),
        };
        let posts = self.posts.list_posts(&query).await?;

        let show_thumbnails = settings.show_thumbnail && ctx.host.supports_thumbnails;
        let thumbnail_size = size_name(&ctx.instance);
        let items = posts
            .iter()
            .map(|post| self.item_view(post, settings, show_thumbnails, &thumbnail_size))
            .collect();

        Ok(CategoryPostsView {
            chrome: ctx.chrome.clone(),
            title,
            title_href,
            items,
        })
    }

    fn item_view(
        &self,
        post: &PostRecord,
        settings: &WidgetInstanceSettings,
        show_thumbnails: bool,
        thumbnail_size: &str,
    ) -> PostItemView {
        let thumbnail = post
            .thumbnail
            .as_ref()
            .filter(|_| show_thumbnails)
            .map(|image| ThumbnailView {
                url: image.url.clone(),
                alt: image.alt.clone().unwrap_or_else(|| post.title.clone()),
                width: settings.thumbnail.width.get(),
                height: settings.thumbnail.height.get(),
                size_name: thumbnail_size.to_string(),
            });

        PostItemView {
            permalink: self.permalinks.post(post),
            title: post.title.clone(),
            thumbnail,
            date: settings
                .show_date
                .then(|| format_post_date(post.published_at)),
            excerpt: settings.show_excerpt.then(|| {
                excerpt_for(
                    &post.excerpt,
                    &post.content_html,
                    settings.effective_excerpt_length(),
                )
            }),
            comment_label: settings
                .show_comment_count
                .then(|| comment_count_label(post.comment_count)),
        }
    }
}

#[async_trait]
impl Widget for CategoryPostsWidget {
    async fn render(
        &self,
        ctx: &RenderContext,
        settings: &WidgetInstanceSettings,
    ) -> Result<String, WidgetError> {
        let view = self.build_view(ctx, settings).await?;
        debug!(
            instance = %ctx.instance,
            posts = view.items.len(),
            "Rendering category posts widget"
        );
        Ok(render_fragment(CategoryPostsTemplate { view })?)
    }

    fn apply_settings(&self, raw: &RawSettings) -> Result<WidgetInstanceSettings, WidgetError> {
        Ok(WidgetInstanceSettings::from_form(raw)?)
    }

    fn describe_form(
        &self,
        settings: &WidgetInstanceSettings,
        host: &HostCapabilities,
    ) -> FormSchema {
        let sort_options = SortField::ALL
            .into_iter()
            .map(|field| SelectOption {
                value: field.as_str().to_string(),
                label: field.label().to_string(),
            })
            .collect();

        let mut form = vec![
            FormField::new(
                fields::TITLE,
                "Title:",
                FieldKind::Text,
                Value::from(settings.title.clone()),
            ),
            FormField::new(
                fields::CATEGORY,
                "Category:",
                FieldKind::CategoryDropdown {
                    options: Vec::new(),
                },
                category_value(settings.category_id),
            ),
            FormField::new(
                fields::COUNT,
                "Number of posts to show",
                FieldKind::Number { min: 1 },
                Value::from(settings.count.get()),
            ),
            FormField::new(
                fields::SORT_BY,
                "Sort by",
                FieldKind::Select {
                    options: sort_options,
                },
                Value::from(settings.sort_by.as_str()),
            ),
            checkbox(
                fields::ASCENDING,
                "Reverse sort order (ascending)",
                settings.ascending,
            ),
            checkbox(
                fields::TITLE_LINK,
                "Make widget title link",
                settings.title_link,
            ),
            checkbox(
                fields::SHOW_EXCERPT,
                "Show post excerpt",
                settings.show_excerpt,
            ),
            FormField::new(
                fields::EXCERPT_LENGTH,
                "Excerpt length (in words):",
                FieldKind::Number { min: 0 },
                Value::from(settings.excerpt_length),
            ),
            checkbox(
                fields::SHOW_COMMENT_COUNT,
                "Show number of comments",
                settings.show_comment_count,
            ),
            checkbox(fields::SHOW_DATE, "Show post date", settings.show_date),
        ];

        if host.supports_thumbnails {
            form.push(checkbox(
                fields::SHOW_THUMBNAIL,
                "Show post thumbnail",
                settings.show_thumbnail,
            ));
            form.push(
                FormField::new(
                    fields::THUMBNAIL_WIDTH,
                    "Width:",
                    FieldKind::Number { min: 1 },
                    Value::from(settings.thumbnail.width.get()),
                )
                .in_group(THUMBNAIL_GROUP),
            );
            form.push(
                FormField::new(
                    fields::THUMBNAIL_HEIGHT,
                    "Height:",
                    FieldKind::Number { min: 1 },
                    Value::from(settings.thumbnail.height.get()),
                )
                .in_group(THUMBNAIL_GROUP),
            );
        }

        FormSchema { fields: form }
    }
}

fn checkbox(name: &'static str, label: &'static str, checked: bool) -> FormField {
    FormField::new(name, label, FieldKind::Checkbox, Value::Bool(checked))
}
