//! Rule-set storage keyed by exact hostname.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::RuleSet;
use crate::error::{Error, Result};

/// Extension of rule files inside a [`DirectoryStore`].
pub const RULE_FILE_EXTENSION: &str = "txt";

/// Loads the rule set for one exact hostname key.
///
/// Implementations report every failure as [`Error::RuleSetNotFound`]; the
/// resolver treats all of them as "try the next superdomain".
pub trait RuleSetStore: Send + Sync {
    fn load(&self, hostname: &str) -> Result<RuleSet>;
}

fn not_found(hostname: &str) -> Error {
    Error::RuleSetNotFound {
        hostname: hostname.to_string(),
    }
}

/// Rule files on disk, one `<hostname>.txt` per key.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the rule file for a hostname key.
    #[must_use]
    pub fn path_for(&self, hostname: &str) -> PathBuf {
        self.root.join(format!("{hostname}.{RULE_FILE_EXTENSION}"))
    }
}

impl RuleSetStore for DirectoryStore {
    fn load(&self, hostname: &str) -> Result<RuleSet> {
        // Keys are hostnames, never paths.
        if hostname.is_empty() || hostname.contains(['/', '\\']) || hostname.starts_with('.') {
            return Err(not_found(hostname));
        }

        let path = self.path_for(hostname);
        match fs::read(&path) {
            Ok(bytes) => Ok(RuleSet::parse(&String::from_utf8_lossy(&bytes))),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "rule file not loaded");
                Err(not_found(hostname))
            }
        }
    }
}

/// Rule sets held in memory, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    rules: HashMap<String, RuleSet>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the rule set for a hostname key.
    #[must_use]
    pub fn with(mut self, hostname: &str, rules: RuleSet) -> Self {
        self.insert(hostname, rules);
        self
    }

    /// Parse directive text and store it under a hostname key.
    #[must_use]
    pub fn with_text(self, hostname: &str, text: &str) -> Self {
        self.with(hostname, RuleSet::parse(text))
    }

    pub fn insert(&mut self, hostname: &str, rules: RuleSet) {
        self.rules.insert(hostname.to_string(), rules);
    }
}

impl RuleSetStore for MemoryStore {
    fn load(&self, hostname: &str) -> Result<RuleSet> {
        self.rules
            .get(hostname)
            .cloned()
            .ok_or_else(|| not_found(hostname))
    }
}
