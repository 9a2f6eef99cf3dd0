//! Repository traits describing persistence adapters.

use std::num::NonZeroU32;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{CategoryRecord, PostRecord};
use crate::domain::types::SortOrder;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("stored value under `{key}` is corrupt: {message}")]
    Corrupt { key: String, message: String },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn corrupt(key: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Corrupt {
            key: key.into(),
            message: err.to_string(),
        }
    }
}

/// A bounded, ordered slice of published posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostListQuery {
    /// Restrict to one category; `None` lists every post.
    pub category_id: Option<Uuid>,
    pub limit: NonZeroU32,
    pub order: SortOrder,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn list_posts(&self, query: &PostListQuery) -> Result<Vec<PostRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    /// Insert or replace a post, returning its id.
    async fn upsert_post(&self, post: PostRecord) -> Result<Uuid, RepoError>;

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError>;

    async fn set_comment_count(&self, id: Uuid, count: u64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait CategoriesRepo: Send + Sync {
    async fn find_category(&self, id: Uuid) -> Result<Option<CategoryRecord>, RepoError>;

    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError>;
}

/// The host's global option store.
#[async_trait]
pub trait SettingsRepo: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, RepoError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), RepoError>;
}
