//! Widget render cache.
//!
//! Rendered widget HTML is stored under keys derived from a per-scope epoch
//! token, so keys cannot be guessed from outside and change whenever content
//! in the scope changes.
//!
//! ## Configuration
//!
//! Cache behavior is controlled via `catposts.toml`:
//!
//! ```toml
//! [cache]
//! use_cache = true
//! save_cache = true
//! ttl_seconds = 1800
//! # ... see config.rs for all options
//! ```

mod config;
mod events;
mod invalidation;
mod keys;
pub(crate) mod lock;
mod render;
mod store;
mod trigger;

pub use config::{CacheConfig, DEFAULT_NAMESPACE, DEFAULT_TTL_SECONDS};
pub use events::{CacheEvent, EventBus, EventHandler, EventKind, EventName};
pub use invalidation::CacheInvalidator;
pub use keys::{Epoch, EpochRegistry, KeyScope};
pub use render::RenderCache;
pub use store::{CacheEntry, CacheStore, MemoryStore, NullStore, StoreError};
pub use trigger::CacheTrigger;
