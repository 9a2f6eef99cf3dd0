//! Content records supplied by the host content store.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    /// Hand-written excerpt; empty when the excerpt should be derived from content.
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content_html: String,
    #[serde(default)]
    pub category_ids: Vec<Uuid>,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    #[serde(default)]
    pub thumbnail: Option<ThumbnailImage>,
}

impl PostRecord {
    pub fn in_category(&self, category_id: Uuid) -> bool {
        self.category_ids.contains(&category_id)
    }
}

/// Featured image attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailImage {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
}
