//! Render cache configuration.
//!
//! Mirrors the `[cache]` table of `catposts.toml`.

use std::num::NonZeroUsize;
use std::time::Duration;

pub const DEFAULT_TTL_SECONDS: u64 = 1800;
pub const DEFAULT_NAMESPACE: &str = "category-posts";
pub const DEFAULT_MAX_ENTRIES: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Serve cached renders.
    pub use_cache: bool,
    /// Store renders computed on a miss.
    pub save_cache: bool,
    /// Lifetime of a stored render.
    pub ttl: Duration,
    /// Prefix isolating these keys inside a shared store.
    pub namespace: String,
    /// Capacity of the in-process store.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            save_cache: true,
            ttl: Duration::from_secs(DEFAULT_TTL_SECONDS),
            namespace: DEFAULT_NAMESPACE.to_string(),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            use_cache: settings.use_cache,
            save_cache: settings.save_cache,
            ttl: settings.ttl,
            namespace: settings.namespace.clone(),
            max_entries: settings.max_entries.get(),
        }
    }
}

impl CacheConfig {
    /// Caching is active only when cached renders may be served.
    pub fn is_enabled(&self) -> bool {
        self.use_cache
    }

    /// Whether a computed render may be written to the store.
    pub fn should_save(&self) -> bool {
        self.use_cache && self.save_cache
    }

    pub fn max_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_entries).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.use_cache);
        assert!(config.save_cache);
        assert_eq!(config.ttl, Duration::from_secs(1800));
        assert_eq!(config.namespace, "category-posts");
        assert_eq!(config.max_entries, 200);
    }

    #[test]
    fn saving_requires_use() {
        let config = CacheConfig {
            use_cache: false,
            save_cache: true,
            ..Default::default()
        };
        assert!(!config.is_enabled());
        assert!(!config.should_save());
    }

    #[test]
    fn use_without_save() {
        let config = CacheConfig {
            save_cache: false,
            ..Default::default()
        };
        assert!(config.is_enabled());
        assert!(!config.should_save());
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = CacheConfig {
            max_entries: 0,
            ..Default::default()
        };
        assert_eq!(config.max_entries_non_zero().get(), 1);
    }
}
