//! Render cache key derivation.
//!
//! A key is a SHA-256 digest over the scope's current epoch token, the scope
//! itself, the widget instance and a caller-supplied fingerprint. The token is
//! a random UUID that is replaced whenever the scope is invalidated, so keys
//! cannot be predicted from outside and change with every epoch.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::RwLock;

use lru::LruCache;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::types::{ScopeId, WidgetInstanceId};

use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::keys";

/// Monotonic counter of invalidations for a scope.
pub type Epoch = u64;

/// Inputs a render cache key is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyScope {
    pub scope: ScopeId,
    pub instance: Option<WidgetInstanceId>,
    pub fingerprint: Vec<u8>,
}

impl KeyScope {
    /// A key covering the whole scope.
    pub fn new(scope: ScopeId) -> Self {
        Self {
            scope,
            instance: None,
            fingerprint: Vec::new(),
        }
    }

    pub fn with_instance(mut self, instance: WidgetInstanceId) -> Self {
        self.instance = Some(instance);
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: impl AsRef<[u8]>) -> Self {
        self.fingerprint = Sha256::digest(fingerprint.as_ref()).to_vec();
        self
    }
}

struct EpochState {
    epoch: Epoch,
    token: Uuid,
    /// Issued key to the instance it was derived for, least recently derived first out.
    issued: LruCache<String, Option<WidgetInstanceId>>,
}

impl EpochState {
    fn fresh(capacity: NonZeroUsize) -> Self {
        Self {
            epoch: 0,
            token: Uuid::new_v4(),
            issued: LruCache::new(capacity),
        }
    }

    fn drain_issued(&mut self) -> Vec<String> {
        let keys = self.issued.iter().map(|(key, _)| key.clone()).collect();
        self.issued.clear();
        keys
    }
}

/// Per-scope epoch tokens plus the keys handed out during the current epoch.
///
/// Issued keys are remembered so that invalidation can delete their entries
/// from the store in addition to retiring the token. At most `capacity` keys
/// are remembered per scope; an entry whose key has been forgotten is still
/// unreachable once the epoch turns, and ages out of the store on its own.
pub struct EpochRegistry {
    capacity: NonZeroUsize,
    scopes: RwLock<HashMap<ScopeId, EpochState>>,
}

impl EpochRegistry {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            scopes: RwLock::new(HashMap::new()),
        }
    }

    /// Derive the key for `scope` in its current epoch and record it as issued.
    pub fn derive(&self, namespace: &str, scope: &KeyScope) -> String {
        let mut scopes = rw_write(&self.scopes, SOURCE, "derive");
        let state = scopes
            .entry(scope.scope.clone())
            .or_insert_with(|| EpochState::fresh(self.capacity));

        let key = format!("{namespace}:{}", digest(&state.token, scope));
        state.issued.put(key.clone(), scope.instance.clone());
        key
    }

    /// Start a new epoch for `scope`, returning it with every key issued in the previous one.
    ///
    /// A scope that never had a key derived has nothing to retire and is left untracked.
    pub fn rotate(&self, scope: &ScopeId) -> (Epoch, Vec<String>) {
        let mut scopes = rw_write(&self.scopes, SOURCE, "rotate");
        match scopes.get_mut(scope) {
            Some(state) => {
                let retired = state.drain_issued();
                state.epoch += 1;
                state.token = Uuid::new_v4();
                (state.epoch, retired)
            }
            None => (0, Vec::new()),
        }
    }

    /// Forget and return the keys issued to one widget instance in the current epoch.
    pub fn take_instance(&self, scope: &ScopeId, instance: &WidgetInstanceId) -> Vec<String> {
        let mut scopes = rw_write(&self.scopes, SOURCE, "take_instance");
        let Some(state) = scopes.get_mut(scope) else {
            return Vec::new();
        };

        let taken: Vec<String> = state
            .issued
            .iter()
            .filter(|&(_, owner)| owner.as_ref() == Some(instance))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &taken {
            state.issued.pop(key);
        }
        taken
    }

    pub fn scope_count(&self) -> usize {
        rw_read(&self.scopes, SOURCE, "scope_count").len()
    }

    pub fn issued_count(&self, scope: &ScopeId) -> usize {
        rw_read(&self.scopes, SOURCE, "issued_count")
            .get(scope)
            .map(|state| state.issued.len())
            .unwrap_or(0)
    }

    pub fn current_epoch(&self, scope: &ScopeId) -> Epoch {
        rw_read(&self.scopes, SOURCE, "current_epoch")
            .get(scope)
            .map(|state| state.epoch)
            .unwrap_or(0)
    }
}

fn digest(token: &Uuid, scope: &KeyScope) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    update_framed(&mut hasher, scope.scope.as_str().as_bytes());
    match &scope.instance {
        Some(instance) => {
            hasher.update([1u8]);
            update_framed(&mut hasher, instance.as_str().as_bytes());
        }
        None => hasher.update([0u8]),
    }
    update_framed(&mut hasher, &scope.fingerprint);
    hex::encode(hasher.finalize())
}

// Length-prefix each part so adjacent fields cannot run into each other.
fn update_framed(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(name: &str) -> ScopeId {
        ScopeId::new(name)
    }

    fn registry() -> EpochRegistry {
        EpochRegistry::new(NonZeroUsize::new(64).expect("capacity"))
    }

    #[test]
    fn key_is_stable_within_epoch() {
        let registry = registry();
        let scope = KeyScope::new(site("blog"));

        let first = registry.derive("ns", &scope);
        let second = registry.derive("ns", &scope);
        assert_eq!(first, second);
        assert!(first.starts_with("ns:"));
        assert_eq!(first.len(), "ns:".len() + 64);
    }

    #[test]
    fn rotation_changes_key_and_returns_issued() {
        let registry = registry();
        let scope = KeyScope::new(site("blog")).with_instance(WidgetInstanceId::new("w-1"));

        let before = registry.derive("ns", &scope);
        let (epoch, retired) = registry.rotate(&site("blog"));
        let after = registry.derive("ns", &scope);

        assert_eq!(epoch, 1);
        assert_eq!(retired, vec![before.clone()]);
        assert_ne!(before, after);
        assert_eq!(registry.current_epoch(&site("blog")), 1);
    }

    #[test]
    fn rotating_unknown_scope_is_a_no_op() {
        let registry = registry();
        for n in 0..500 {
            let (epoch, retired) = registry.rotate(&site(&format!("junk-{n}")));
            assert_eq!(epoch, 0);
            assert!(retired.is_empty());
        }
        assert_eq!(registry.scope_count(), 0);
        assert_eq!(registry.current_epoch(&site("junk-1")), 0);
    }

    #[test]
    fn issued_keys_are_capped_per_scope() {
        let registry = EpochRegistry::new(NonZeroUsize::new(8).expect("capacity"));
        let blog = site("blog");
        let base = KeyScope::new(blog.clone()).with_instance(WidgetInstanceId::new("w-1"));

        let keys: Vec<String> = (0..1_000)
            .map(|n| registry.derive("ns", &base.clone().with_fingerprint(n.to_string())))
            .collect();
        assert_eq!(registry.issued_count(&blog), 8);
        assert_eq!(registry.scope_count(), 1);

        // The most recently derived keys are the ones still tracked.
        let (_, retired) = registry.rotate(&blog);
        assert_eq!(retired.len(), 8);
        assert!(retired.iter().all(|key| keys[992..].contains(key)));
        assert_eq!(registry.issued_count(&blog), 0);
    }

    #[test]
    fn scopes_instances_and_fingerprints_separate_keys() {
        let registry = registry();
        let base = KeyScope::new(site("blog")).with_instance(WidgetInstanceId::new("w-1"));

        let a = registry.derive("ns", &base);
        let b = registry.derive(
            "ns",
            &KeyScope::new(site("blog")).with_instance(WidgetInstanceId::new("w-2")),
        );
        let c = registry.derive("ns", &base.clone().with_fingerprint(b"sort=title"));
        let d = registry.derive("ns", &KeyScope::new(site("shop")).with_instance(WidgetInstanceId::new("w-1")));

        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn separate_registries_do_not_share_tokens() {
        let scope = KeyScope::new(site("blog"));
        let a = registry().derive("ns", &scope);
        let b = registry().derive("ns", &scope);
        assert_ne!(a, b);
    }

    #[test]
    fn take_instance_only_touches_that_instance() {
        let registry = registry();
        let one = KeyScope::new(site("blog")).with_instance(WidgetInstanceId::new("w-1"));
        let two = KeyScope::new(site("blog")).with_instance(WidgetInstanceId::new("w-2"));

        let key_one = registry.derive("ns", &one);
        let key_two = registry.derive("ns", &two);

        let taken = registry.take_instance(&site("blog"), &WidgetInstanceId::new("w-1"));
        assert_eq!(taken, vec![key_one.clone()]);
        assert!(registry
            .take_instance(&site("blog"), &WidgetInstanceId::new("w-1"))
            .is_empty());

        // Same epoch: the key for an untouched instance is unchanged.
        assert_eq!(registry.derive("ns", &two), key_two);
        assert_eq!(registry.derive("ns", &one), key_one);
    }
}
