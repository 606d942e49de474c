//! Superdomain walk: find the most specific rule set for a hostname.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::{RuleSet, RuleSetStore};

/// Candidate keys for a hostname, most specific first.
///
/// Each step drops the leftmost label: `a.b.example.com` yields
/// `a.b.example.com`, `b.example.com`, `example.com`, `com`. The hostname is
/// not validated; the chain ends once no `.` remains.
///
/// ```
/// use sitespec::rules::hostname_chain;
///
/// assert_eq!(hostname_chain("news.example.com"), ["news.example.com", "example.com", "com"]);
/// ```
#[must_use]
pub fn hostname_chain(hostname: &str) -> Vec<&str> {
    let mut chain = Vec::new();
    let mut current = hostname;
    loop {
        chain.push(current);
        match current.split_once('.') {
            Some((_, rest)) if !rest.is_empty() => current = rest,
            _ => break,
        }
    }
    chain
}

/// Hostnames remembered by [`DomainResolver::cached`].
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Resolutions in insertion order; the oldest goes once `capacity` is reached.
struct Cache {
    entries: HashMap<String, Option<Arc<RuleSet>>>,
    order: VecDeque<String>,
    capacity: usize,
}

impl Cache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    fn insert(&mut self, hostname: &str, resolved: Option<Arc<RuleSet>>) {
        if self.capacity == 0 || self.entries.contains_key(hostname) {
            return;
        }
        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
        self.entries.insert(hostname.to_string(), resolved);
        self.order.push_back(hostname.to_string());
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

/// Resolves hostnames to rule sets through a [`RuleSetStore`].
///
/// With caching enabled, the outcome for each hostname (including "none") is
/// remembered, up to a fixed number of hostnames; past that the oldest entry
/// is evicted. Concurrent misses may both walk the store; the results are
/// identical so either insert wins.
pub struct DomainResolver {
    store: Box<dyn RuleSetStore>,
    cache: Option<RwLock<Cache>>,
}

impl DomainResolver {
    /// Resolver without a cache.
    pub fn new(store: impl RuleSetStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            cache: None,
        }
    }

    /// Resolver with a read-through cache of [`DEFAULT_CACHE_CAPACITY`] hostnames.
    pub fn cached(store: impl RuleSetStore + 'static) -> Self {
        Self::with_cache_capacity(store, DEFAULT_CACHE_CAPACITY)
    }

    /// Resolver with a read-through cache holding at most `capacity` hostnames.
    pub fn with_cache_capacity(store: impl RuleSetStore + 'static, capacity: usize) -> Self {
        Self {
            store: Box::new(store),
            cache: Some(RwLock::new(Cache::new(capacity))),
        }
    }

    /// Number of hostnames currently cached.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| cache.read().entries.len())
    }

    /// The most specific non-empty rule set for `hostname`, if any.
    pub fn resolve(&self, hostname: &str) -> Option<Arc<RuleSet>> {
        let Some(cache) = &self.cache else {
            return self.walk(hostname);
        };

        if let Some(hit) = cache.read().entries.get(hostname) {
            return hit.clone();
        }

        let resolved = self.walk(hostname);
        cache.write().insert(hostname, resolved.clone());
        resolved
    }

    /// Drop every cached resolution so edited rule files are picked up.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.write().clear();
        }
    }

    fn walk(&self, hostname: &str) -> Option<Arc<RuleSet>> {
        for candidate in hostname_chain(hostname) {
            match self.store.load(candidate) {
                Ok(rules) if !rules.is_empty() => {
                    debug!(hostname, candidate, "rule set resolved");
                    return Some(Arc::new(rules));
                }
                Ok(_) => debug!(hostname, candidate, "empty rule set skipped"),
                Err(_) => {}
            }
        }
        debug!(hostname, "no rule set at any level");
        None
    }
}

impl std::fmt::Debug for DomainResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainResolver")
            .field("cached", &self.cache.is_some())
            .field("cache_len", &self.cache_len())
            .finish_non_exhaustive()
    }
}
