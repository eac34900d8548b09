//! Rule store with atomic tree replacement and a per-snapshot decision cache
//!
//! Readers take an `Arc` to the current snapshot and resolve against it
//! without holding any lock, so one call always observes exactly one tree.
//! Replacing the rule table compiles the new tree first and then swaps a
//! single pointer.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use tracing::info;

use crate::config::{CacheConfig, StoreConfig};
use crate::error::{Error, Result};
use crate::permission::Permission;
use crate::resolver::Resolution;
use crate::tree::RuleTree;

/// Cache key: raw query path and explicit flag
type CacheKey = (String, bool);

/// Statistics about cache performance for the current snapshot
///
/// Every swap starts a fresh cache, so all counters restart at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: usize,
    /// Number of cache misses
    pub misses: usize,
    /// Entries currently cached
    pub entries: usize,
    /// Maximum entries before the least recently used one is evicted
    pub capacity: usize,
}

impl CacheStats {
    /// Calculates the cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU of resolutions for one tree
struct DecisionCache {
    entries: Mutex<LruCache<CacheKey, Resolution>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl DecisionCache {
    /// Returns `None` when caching is disabled or the capacity is zero
    fn new(config: &CacheConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let capacity = NonZeroUsize::new(config.capacity)?;

        Some(Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        })
    }

    fn get(&self, key: &CacheKey) -> Option<Resolution> {
        let hit = self.entries.lock().get(key).cloned();
        let counter = if hit.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        hit
    }

    /// Stores a resolution, evicting the least recently used one when full
    fn put(&self, key: CacheKey, resolution: Resolution) {
        self.entries.lock().put(key, resolution);
    }

    fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: entries.len(),
            capacity: entries.cap().get(),
        }
    }
}

/// One installed tree and everything derived from it
struct Snapshot {
    tree: Arc<RuleTree>,
    generation: u64,
    cache: Option<DecisionCache>,
}

impl Snapshot {
    fn new(tree: Arc<RuleTree>, generation: u64, config: &CacheConfig) -> Self {
        Self {
            tree,
            generation,
            cache: DecisionCache::new(config),
        }
    }
}

/// Holds the current rule tree and swaps it atomically
///
/// # Examples
///
/// ```
/// use permtree::{Permission, RuleStore, StoreConfig};
///
/// let store = RuleStore::new(StoreConfig::default()).unwrap();
/// assert!(!store.check("a.b", Permission::READ, false).unwrap());
///
/// let generation = store.replace([("a", Permission::READ)]).unwrap();
/// assert_eq!(generation, 1);
/// assert!(store.check("a.b", Permission::READ, false).unwrap());
/// ```
pub struct RuleStore {
    current: RwLock<Arc<Snapshot>>,
    config: StoreConfig,
}

impl RuleStore {
    /// Creates a store holding the rules listed in `config`
    pub fn new(config: StoreConfig) -> Result<Self> {
        let tree = RuleTree::compile_with(
            config.syntax.clone(),
            config.rules.iter().map(|(pattern, permission)| (pattern.as_str(), *permission)),
        )?;
        Self::with_tree(config, tree)
    }

    /// Creates a store holding `tree`; `config.rules` is not consulted
    pub fn with_tree(config: StoreConfig, tree: RuleTree) -> Result<Self> {
        config.syntax.validate()?;
        Self::ensure_syntax(&config, &tree)?;

        let snapshot = Snapshot::new(Arc::new(tree), 0, &config.cache);
        Ok(Self {
            current: RwLock::new(Arc::new(snapshot)),
            config,
        })
    }

    fn ensure_syntax(config: &StoreConfig, tree: &RuleTree) -> Result<()> {
        if tree.syntax() != &config.syntax {
            return Err(Error::InvalidSyntax(format!(
                "tree uses separator '{}' and wildcard '{}', store expects '{}' and '{}'",
                tree.syntax().separator,
                tree.syntax().wildcard,
                config.syntax.separator,
                config.syntax.wildcard
            )));
        }
        Ok(())
    }

    /// Compiles `rules` and swaps the result in, returning the new generation
    ///
    /// On error the current tree stays in place.
    pub fn replace<I, K, P>(&self, rules: I) -> Result<u64>
    where
        I: IntoIterator<Item = (K, P)>,
        K: AsRef<str>,
        P: Into<Permission>,
    {
        let tree = RuleTree::compile_with(self.config.syntax.clone(), rules)?;
        Ok(self.swap(tree))
    }

    /// Swaps in a pre-built tree, returning the new generation
    pub fn install(&self, tree: RuleTree) -> Result<u64> {
        Self::ensure_syntax(&self.config, &tree)?;
        Ok(self.swap(tree))
    }

    fn swap(&self, tree: RuleTree) -> u64 {
        let rule_count = tree.rule_count();
        let tree = Arc::new(tree);

        let generation = {
            let mut current = self.current.write();
            let generation = current.generation + 1;
            *current = Arc::new(Snapshot::new(tree, generation, &self.config.cache));
            generation
        };

        info!(
            "Installed rule tree generation {} ({} rules)",
            generation, rule_count
        );

        generation
    }

    fn current(&self) -> Arc<Snapshot> {
        self.current.read().clone()
    }

    /// Returns the tree currently installed
    pub fn snapshot(&self) -> Arc<RuleTree> {
        self.current().tree.clone()
    }

    /// Number of swaps since the store was created
    pub fn generation(&self) -> u64 {
        self.current().generation
    }

    /// Returns the store configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Resolves `path` against the current tree
    pub fn resolve(&self, path: &str, explicit: bool) -> Result<Resolution> {
        let snapshot = self.current();

        let Some(cache) = &snapshot.cache else {
            return snapshot.tree.resolve(path, explicit);
        };

        let key = (path.to_string(), explicit);
        if let Some(hit) = cache.get(&key) {
            return Ok(hit);
        }

        let resolution = snapshot.tree.resolve(path, explicit)?;
        cache.put(key, resolution.clone());

        Ok(resolution)
    }

    /// Returns the governing permission for `path`
    pub fn permissions(&self, path: &str, explicit: bool) -> Result<Permission> {
        Ok(self.resolve(path, explicit)?.permission())
    }

    /// Checks whether `path` is granted every bit of `required`
    pub fn check(&self, path: &str, required: Permission, explicit: bool) -> Result<bool> {
        Ok(self.resolve(path, explicit)?.grants(required))
    }

    /// Checks whether any path matching the expansion query `pattern` is granted
    ///
    /// Expansion results are not cached.
    pub fn check_any(&self, pattern: &str, required: Permission, explicit: bool) -> Result<bool> {
        self.current().tree.check_any(pattern, required, explicit)
    }

    /// Get cache statistics for the current snapshot
    pub fn stats(&self) -> CacheStats {
        self.current()
            .cache
            .as_ref()
            .map_or_else(CacheStats::default, DecisionCache::stats)
    }
}

impl std::fmt::Debug for RuleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.current();
        f.debug_struct("RuleStore")
            .field("generation", &snapshot.generation)
            .field("rules", &snapshot.tree.rule_count())
            .field("config", &self.config)
            .finish()
    }
}
