//! Deduplication of emitted declarations.
//!
//! Several generation requests can describe the same type (two services
//! sharing a common namespace, for instance). The [`DedupRegistry`] records
//! every qualified name emitted during one pass so each declaration reaches
//! the output at most once.
//!
//! Claims are journaled so that a request which fails after claiming can
//! hand its keys back with [`DedupRegistry::rollback`]; a later request that
//! declares the same types then emits them.

use std::collections::HashSet;

use tracing::trace;

use crate::config::EnumDedupPolicy;

/// Position in the claim journal, taken before a request starts claiming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// Set of `Namespace.Name` keys already emitted in the current pass.
#[derive(Debug, Default)]
pub struct DedupRegistry {
    keys: HashSet<String>,
    /// Fresh claims in claim order.
    journal: Vec<String>,
}

impl DedupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Registers `key` for a structural declaration.
    ///
    /// Returns `true` when the caller should emit (first writer), `false`
    /// when the key was already taken.
    ///
    /// ## Examples
    ///
    /// ```
    /// use odata_gen::registry::DedupRegistry;
    ///
    /// let mut registry = DedupRegistry::new();
    /// assert!(registry.claim("NS.Address"));
    /// assert!(!registry.claim("NS.Address"));
    /// ```
    pub fn claim(&mut self, key: &str) -> bool {
        let fresh = self.insert(key);
        trace!(key, fresh, "Registry claim");
        fresh
    }

    fn insert(&mut self, key: &str) -> bool {
        let fresh = self.keys.insert(key.to_string());
        if fresh {
            self.journal.push(key.to_string());
        }
        fresh
    }

    /// Releases `key` so that a later declaration of it is emitted.
    pub fn release(&mut self, key: &str) -> bool {
        let released = self.keys.remove(key);
        if released {
            self.journal.retain(|claimed| claimed != key);
        }
        released
    }

    /// Marks the current end of the claim journal.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.journal.len())
    }

    /// Releases every key first claimed after `checkpoint`, except those in
    /// `keep`. Returns the number of released keys.
    ///
    /// ## Examples
    ///
    /// ```
    /// use odata_gen::registry::DedupRegistry;
    ///
    /// let mut registry = DedupRegistry::new();
    /// registry.claim("NS.Color");
    /// let checkpoint = registry.checkpoint();
    /// registry.claim("NS.Address");
    /// registry.claim("NS.Point");
    ///
    /// assert_eq!(registry.rollback(checkpoint, &["NS.Point".to_string()]), 1);
    /// assert!(registry.contains("NS.Color"));
    /// assert!(!registry.contains("NS.Address"));
    /// assert!(registry.contains("NS.Point"));
    /// ```
    pub fn rollback(&mut self, checkpoint: Checkpoint, keep: &[String]) -> usize {
        let start = checkpoint.0.min(self.journal.len());
        let claimed = self.journal.split_off(start);
        let mut released = 0;
        for key in claimed {
            if keep.contains(&key) {
                self.journal.push(key);
            } else {
                self.keys.remove(&key);
                released += 1;
            }
        }
        released
    }

    /// Registers `key` for an enum declaration under `policy`.
    ///
    /// Under [`EnumDedupPolicy::Legacy`] a repeated key only blocks emission
    /// when it is longer than [`EnumDedupPolicy::LEGACY_KEY_THRESHOLD`]
    /// characters.
    pub fn claim_enum(&mut self, key: &str, policy: EnumDedupPolicy) -> bool {
        match policy {
            EnumDedupPolicy::Strict => self.claim(key),
            EnumDedupPolicy::Legacy => {
                let long = key.chars().count() > EnumDedupPolicy::LEGACY_KEY_THRESHOLD;
                if self.contains(key) && long {
                    return false;
                }
                self.insert(key);
                true
            }
        }
    }
}
