//! Content write paths that keep the render cache consistent.

use std::sync::Arc;

use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::repos::PostsWriteRepo;
use crate::cache::CacheTrigger;
use crate::domain::entities::PostRecord;
use crate::domain::types::ScopeId;

/// Applies post mutations and fires the matching cache trigger once they succeed.
#[derive(Clone)]
pub struct ContentService {
    posts: Arc<dyn PostsWriteRepo>,
    trigger: Arc<CacheTrigger>,
}

impl ContentService {
    pub fn new(posts: Arc<dyn PostsWriteRepo>, trigger: Arc<CacheTrigger>) -> Self {
        Self { posts, trigger }
    }

    pub async fn upsert_post(&self, scope: &ScopeId, post: PostRecord) -> Result<Uuid, AppError> {
        let id = self.posts.upsert_post(post).await?;
        self.trigger.post_upserted(scope, id).await;
        Ok(id)
    }

    pub async fn delete_post(&self, scope: &ScopeId, id: Uuid) -> Result<(), AppError> {
        self.posts.delete_post(id).await?;
        self.trigger.post_deleted(scope, id).await;
        Ok(())
    }

    pub async fn set_comment_count(
        &self,
        scope: &ScopeId,
        id: Uuid,
        count: u64,
    ) -> Result<(), AppError> {
        self.posts.set_comment_count(id, count).await?;
        self.trigger.comment_count_changed(scope, id, count).await;
        Ok(())
    }
}
