//! Typed access to the widget's entries in the host option store.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use crate::application::repos::{RepoError, SettingsRepo};
use crate::domain::types::WidgetInstanceId;
use crate::domain::widget::{ThumbnailSize, WidgetInstanceSettings};

/// Option holding every configured instance, keyed by instance id.
pub const INSTANCES_KEY: &str = "widget_category_posts";
/// Option holding the thumbnail size chosen by each instance.
pub const THUMBNAIL_SIZES_KEY: &str = "jlao_cat_post_thumb_sizes";

pub type InstanceMap = BTreeMap<WidgetInstanceId, WidgetInstanceSettings>;
pub type ThumbnailSizeMap = BTreeMap<WidgetInstanceId, ThumbnailSize>;

/// Both options are whole maps, so every save is a read-modify-write.
/// Clones share one lock per option, which keeps concurrent saves for
/// different instances from overwriting each other.
#[derive(Clone)]
pub struct WidgetOptions {
    repo: Arc<dyn SettingsRepo>,
    instances_lock: Arc<Mutex<()>>,
    sizes_lock: Arc<Mutex<()>>,
}

impl WidgetOptions {
    pub fn new(repo: Arc<dyn SettingsRepo>) -> Self {
        Self {
            repo,
            instances_lock: Arc::new(Mutex::new(())),
            sizes_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn load_instances(&self) -> Result<InstanceMap, RepoError> {
        self.load_map(INSTANCES_KEY).await
    }

    pub async fn load_instance(
        &self,
        instance: &WidgetInstanceId,
    ) -> Result<Option<WidgetInstanceSettings>, RepoError> {
        Ok(self.load_instances().await?.remove(instance))
    }

    pub async fn save_instance(
        &self,
        instance: &WidgetInstanceId,
        settings: &WidgetInstanceSettings,
    ) -> Result<(), RepoError> {
        let _guard = self.instances_lock.lock().await;
        let mut instances = self.load_instances().await?;
        instances.insert(instance.clone(), settings.clone());
        self.store_map(INSTANCES_KEY, &instances).await
    }

    pub async fn load_thumbnail_sizes(&self) -> Result<ThumbnailSizeMap, RepoError> {
        self.load_map(THUMBNAIL_SIZES_KEY).await
    }

    pub async fn save_thumbnail_size(
        &self,
        instance: &WidgetInstanceId,
        size: ThumbnailSize,
    ) -> Result<(), RepoError> {
        let _guard = self.sizes_lock.lock().await;
        let mut sizes = self.load_thumbnail_sizes().await?;
        sizes.insert(instance.clone(), size);
        self.store_map(THUMBNAIL_SIZES_KEY, &sizes).await
    }

    async fn load_map<T>(&self, key: &str) -> Result<BTreeMap<WidgetInstanceId, T>, RepoError>
    where
        T: DeserializeOwned,
    {
        match self.repo.get(key).await? {
            None => Ok(BTreeMap::new()),
            Some(value) => serde_json::from_value(value).map_err(|err| RepoError::corrupt(key, err)),
        }
    }

    async fn store_map<T>(&self, key: &str, map: &BTreeMap<WidgetInstanceId, T>) -> Result<(), RepoError>
    where
        T: Serialize,
    {
        let value = serde_json::to_value(map).map_err(|err| RepoError::corrupt(key, err))?;
        self.repo.set(key, value).await
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use super::*;
    use crate::infra::memory::MemorySettingsRepo;

    /// Yields to the scheduler between reading an option and writing it back.
    struct YieldingRepo(MemorySettingsRepo);

    #[async_trait]
    impl SettingsRepo for YieldingRepo {
        async fn get(&self, key: &str) -> Result<Option<Value>, RepoError> {
            let value = self.0.get(key).await;
            tokio::task::yield_now().await;
            value
        }

        async fn set(&self, key: &str, value: Value) -> Result<(), RepoError> {
            self.0.set(key, value).await
        }
    }

    fn size(width: u32, height: u32) -> ThumbnailSize {
        ThumbnailSize {
            width: NonZeroU32::new(width).expect("width"),
            height: NonZeroU32::new(height).expect("height"),
        }
    }

    #[tokio::test]
    async fn missing_options_read_as_empty() {
        let options = WidgetOptions::new(Arc::new(MemorySettingsRepo::new()));
        assert!(options.load_instances().await.expect("instances").is_empty());
        assert!(
            options
                .load_instance(&WidgetInstanceId::new("w-1"))
                .await
                .expect("instance")
                .is_none()
        );
    }

    #[tokio::test]
    async fn instances_are_stored_side_by_side() {
        let repo = Arc::new(MemorySettingsRepo::new());
        let options = WidgetOptions::new(repo.clone());
        let one = WidgetInstanceSettings {
            title: "One".into(),
            ..WidgetInstanceSettings::default()
        };
        let two = WidgetInstanceSettings {
            title: "Two".into(),
            ..WidgetInstanceSettings::default()
        };

        options
            .save_instance(&WidgetInstanceId::new("w-1"), &one)
            .await
            .expect("save one");
        options
            .save_instance(&WidgetInstanceId::new("w-2"), &two)
            .await
            .expect("save two");

        let loaded = options.load_instances().await.expect("instances");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[&WidgetInstanceId::new("w-2")].title, "Two");

        let raw = repo.get(INSTANCES_KEY).await.expect("get").expect("stored");
        assert_eq!(raw["w-1"]["title"], json!("One"));
    }

    #[tokio::test]
    async fn thumbnail_sizes_roundtrip() {
        let options = WidgetOptions::new(Arc::new(MemorySettingsRepo::new()));
        options
            .save_thumbnail_size(&WidgetInstanceId::new("w-1"), size(80, 60))
            .await
            .expect("save");

        let sizes = options.load_thumbnail_sizes().await.expect("sizes");
        assert_eq!(sizes[&WidgetInstanceId::new("w-1")], size(80, 60));
    }

    #[tokio::test]
    async fn corrupt_option_is_reported() {
        let repo = Arc::new(MemorySettingsRepo::new());
        repo.set(THUMBNAIL_SIZES_KEY, json!(["not", "a", "map"]))
            .await
            .expect("seed");

        let err = WidgetOptions::new(repo)
            .load_thumbnail_sizes()
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Corrupt { ref key, .. } if key == THUMBNAIL_SIZES_KEY));
    }

    #[tokio::test]
    async fn concurrent_saves_keep_every_instance() {
        let options = WidgetOptions::new(Arc::new(YieldingRepo(MemorySettingsRepo::new())));

        let tasks: Vec<_> = (0..8)
            .map(|n| {
                let options = options.clone();
                tokio::spawn(async move {
                    let id = WidgetInstanceId::new(format!("w-{n}"));
                    let settings = WidgetInstanceSettings {
                        title: format!("Widget {n}"),
                        ..WidgetInstanceSettings::default()
                    };
                    options.save_instance(&id, &settings).await.expect("save");
                    options
                        .save_thumbnail_size(&id, size(40 + n, 30))
                        .await
                        .expect("save size");
                })
            })
            .collect();
        for task in tasks {
            task.await.expect("task");
        }

        assert_eq!(options.load_instances().await.expect("instances").len(), 8);
        assert_eq!(options.load_thumbnail_sizes().await.expect("sizes").len(), 8);
    }

    #[test]
    fn thumbnail_sizes_use_the_legacy_option_name() {
        assert_eq!(THUMBNAIL_SIZES_KEY, "jlao_cat_post_thumb_sizes");
    }
}
