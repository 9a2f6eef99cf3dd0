//! In-memory host adapters, optionally seeded from a TOML fixture.
//!
//! ```toml
//! [[categories]]
//! id = "0b5a1f0e-6d7c-4f4e-9a59-5d0f6f1f2a01"
//! slug = "news"
//! name = "News"
//!
//! [[posts]]
//! id = "4c1e3a52-0d1b-4d0f-8d55-0d5e0b7c9a10"
//! slug = "hello-world"
//! title = "Hello world"
//! content_html = "<p>First post.</p>"
//! category_ids = ["0b5a1f0e-6d7c-4f4e-9a59-5d0f6f1f2a01"]
//! comment_count = 3
//! published_at = "2024-03-05T09:00:00Z"
//!
//! [widgets.category-posts-1]
//! category_id = "0b5a1f0e-6d7c-4f4e-9a59-5d0f6f1f2a01"
//! show_date = true
//! ```

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

use crate::application::options::WidgetOptions;
use crate::application::repos::{
    CategoriesRepo, PostListQuery, PostsRepo, PostsWriteRepo, RepoError, SettingsRepo,
};
use crate::cache::lock::{rw_read, rw_write};
use crate::domain::entities::{CategoryRecord, PostRecord};
use crate::domain::types::{SortField, SortOrder, WidgetInstanceId};
use crate::domain::widget::WidgetInstanceSettings;

use super::error::InfraError;

const SOURCE: &str = "infra::memory";

/// Posts and categories held in process.
#[derive(Default)]
pub struct MemoryContent {
    posts: RwLock<HashMap<Uuid, PostRecord>>,
    categories: RwLock<HashMap<Uuid, CategoryRecord>>,
}

impl MemoryContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(categories: Vec<CategoryRecord>, posts: Vec<PostRecord>) -> Self {
        Self {
            posts: RwLock::new(posts.into_iter().map(|post| (post.id, post)).collect()),
            categories: RwLock::new(
                categories
                    .into_iter()
                    .map(|category| (category.id, category))
                    .collect(),
            ),
        }
    }

    pub fn insert_category(&self, category: CategoryRecord) {
        rw_write(&self.categories, SOURCE, "insert_category").insert(category.id, category);
    }

    pub fn post_count(&self) -> usize {
        rw_read(&self.posts, SOURCE, "post_count").len()
    }
}

#[async_trait]
impl PostsRepo for MemoryContent {
    async fn list_posts(&self, query: &PostListQuery) -> Result<Vec<PostRecord>, RepoError> {
        let mut posts: Vec<PostRecord> = rw_read(&self.posts, SOURCE, "list_posts")
            .values()
            .filter(|post| query.category_id.is_none_or(|id| post.in_category(id)))
            .cloned()
            .collect();

        sort_posts(&mut posts, query.order, Uuid::new_v4());
        posts.truncate(usize::try_from(query.limit.get()).unwrap_or(usize::MAX));
        Ok(posts)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        Ok(rw_read(&self.posts, SOURCE, "find_by_id").get(&id).cloned())
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryContent {
    async fn upsert_post(&self, post: PostRecord) -> Result<Uuid, RepoError> {
        if post.slug.trim().is_empty() {
            return Err(RepoError::InvalidInput {
                message: "post slug must not be empty".to_string(),
            });
        }
        let id = post.id;
        rw_write(&self.posts, SOURCE, "upsert_post").insert(id, post);
        Ok(id)
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        rw_write(&self.posts, SOURCE, "delete_post")
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    async fn set_comment_count(&self, id: Uuid, count: u64) -> Result<(), RepoError> {
        let mut posts = rw_write(&self.posts, SOURCE, "set_comment_count");
        let post = posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.comment_count = count;
        Ok(())
    }
}

#[async_trait]
impl CategoriesRepo for MemoryContent {
    async fn find_category(&self, id: Uuid) -> Result<Option<CategoryRecord>, RepoError> {
        Ok(rw_read(&self.categories, SOURCE, "find_category")
            .get(&id)
            .cloned())
    }

    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        let mut categories: Vec<CategoryRecord> =
            rw_read(&self.categories, SOURCE, "list_categories")
                .values()
                .cloned()
                .collect();
        categories.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then(a.id.cmp(&b.id))
        });
        Ok(categories)
    }
}

/// Order posts for a listing; ties fall back to the post id.
///
/// Random order ignores the direction and is a pure function of `seed`.
fn sort_posts(posts: &mut [PostRecord], order: SortOrder, seed: Uuid) {
    if order.field == SortField::Random {
        posts.sort_by_cached_key(|post| {
            let mut hasher = Sha256::new();
            hasher.update(seed.as_bytes());
            hasher.update(post.id.as_bytes());
            hasher.finalize().to_vec()
        });
        return;
    }

    posts.sort_by(|a, b| {
        let primary = match order.field {
            SortField::Date => a.published_at.cmp(&b.published_at),
            SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortField::CommentCount => a.comment_count.cmp(&b.comment_count),
            SortField::Random => Ordering::Equal,
        };
        let primary = if order.is_ascending() {
            primary
        } else {
            primary.reverse()
        };
        primary.then(a.id.cmp(&b.id))
    });
}

/// The host option store held in process.
#[derive(Default)]
pub struct MemorySettingsRepo {
    values: RwLock<HashMap<String, Value>>,
}

impl MemorySettingsRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsRepo for MemorySettingsRepo {
    async fn get(&self, key: &str) -> Result<Option<Value>, RepoError> {
        Ok(rw_read(&self.values, SOURCE, "settings_get").get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), RepoError> {
        rw_write(&self.values, SOURCE, "settings_set").insert(key.to_string(), value);
        Ok(())
    }
}

/// Site content and widget instances read from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SiteFixture {
    pub categories: Vec<CategoryRecord>,
    pub posts: Vec<PostRecord>,
    pub widgets: BTreeMap<WidgetInstanceId, WidgetInstanceSettings>,
}

impl SiteFixture {
    pub fn parse(text: &str, origin: &str) -> Result<Self, InfraError> {
        toml::from_str(text).map_err(|err| InfraError::fixture(origin, err.to_string()))
    }

    pub async fn load(path: &Path) -> Result<Self, InfraError> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::parse(&text, &path.display().to_string())
    }
}

/// In-memory repositories backing a single site.
#[derive(Clone)]
pub struct MemoryHost {
    pub content: Arc<MemoryContent>,
    pub settings: Arc<MemorySettingsRepo>,
}

impl MemoryHost {
    pub fn empty() -> Self {
        Self {
            content: Arc::new(MemoryContent::new()),
            settings: Arc::new(MemorySettingsRepo::new()),
        }
    }

    /// Build repositories holding everything in `fixture`.
    ///
    /// Widget thumbnail sizes are registered alongside their settings.
    pub async fn seed(fixture: SiteFixture) -> Result<Self, InfraError> {
        let SiteFixture {
            categories,
            posts,
            widgets,
        } = fixture;

        let host = Self {
            content: Arc::new(MemoryContent::from_records(categories, posts)),
            settings: Arc::new(MemorySettingsRepo::new()),
        };

        let options = WidgetOptions::new(host.settings.clone());
        for (instance, settings) in &widgets {
            options
                .save_instance(instance, settings)
                .await
                .map_err(|err| InfraError::fixture(instance.as_str(), err.to_string()))?;
            options
                .save_thumbnail_size(instance, settings.thumbnail)
                .await
                .map_err(|err| InfraError::fixture(instance.as_str(), err.to_string()))?;
        }

        info!(
            posts = host.content.post_count(),
            widgets = widgets.len(),
            "Seeded in-memory site"
        );
        Ok(host)
    }
}
