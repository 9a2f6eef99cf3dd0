//! Image sizes the widget asks the host to generate.

use serde::Serialize;

use crate::application::options::WidgetOptions;
use crate::application::repos::RepoError;
use crate::domain::types::WidgetInstanceId;

const SIZE_NAME_PREFIX: &str = "cat_post_thumb_size";

/// An image size registration, always hard-cropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredSize {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub crop: bool,
}

/// Name of the image size registered for `instance`.
pub fn size_name(instance: &WidgetInstanceId) -> String {
    format!("{SIZE_NAME_PREFIX}{instance}")
}

#[derive(Clone)]
pub struct ThumbnailRegistry {
    options: WidgetOptions,
}

impl ThumbnailRegistry {
    pub fn new(options: WidgetOptions) -> Self {
        Self { options }
    }

    /// One registration per instance that has saved a thumbnail size.
    pub async fn registered_sizes(&self) -> Result<Vec<RegisteredSize>, RepoError> {
        let sizes = self.options.load_thumbnail_sizes().await?;
        Ok(sizes
            .into_iter()
            .map(|(instance, size)| RegisteredSize {
                name: size_name(&instance),
                width: size.width.get(),
                height: size.height.get(),
                crop: true,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;
    use std::sync::Arc;

    use super::*;
    use crate::domain::widget::ThumbnailSize;
    use crate::infra::memory::MemorySettingsRepo;

    #[test]
    fn size_name_appends_instance() {
        assert_eq!(
            size_name(&WidgetInstanceId::new("3")),
            "cat_post_thumb_size3"
        );
    }

    #[tokio::test]
    async fn lists_hard_cropped_sizes() {
        let options = WidgetOptions::new(Arc::new(MemorySettingsRepo::new()));
        options
            .save_thumbnail_size(
                &WidgetInstanceId::new("2"),
                ThumbnailSize {
                    width: NonZeroU32::new(64).expect("width"),
                    height: NonZeroU32::new(48).expect("height"),
                },
            )
            .await
            .expect("save");

        let sizes = ThumbnailRegistry::new(options)
            .registered_sizes()
            .await
            .expect("sizes");
        assert_eq!(
            sizes,
            vec![RegisteredSize {
                name: "cat_post_thumb_size2".into(),
                width: 64,
                height: 48,
                crop: true,
            }]
        );
    }
}
