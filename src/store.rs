//! Process-wide rule snapshot
//!
//! The active rule list is an immutable `Arc<[MutationRule]>`. Requests clone
//! the `Arc` and evaluate against it without holding any lock; a reload builds
//! the new list first and swaps the pointer in one short write.

use std::sync::{Arc, RwLock};

use tracing::info;

use crate::rule::MutationRule;

/// Shared, atomically replaceable rule list
#[derive(Debug)]
pub struct RuleStore {
    rules: RwLock<Arc<[MutationRule]>>,
}

impl Default for RuleStore {
    fn default() -> Self {
        Self {
            rules: RwLock::new(Arc::from(Vec::new())),
        }
    }
}

impl RuleStore {
    /// Create a store holding `rules`
    pub fn load(rules: Vec<MutationRule>) -> Self {
        info!(rules = rules.len(), "Loaded mutation rules");
        Self {
            rules: RwLock::new(rules.into()),
        }
    }

    /// The current rule snapshot
    ///
    /// The snapshot stays valid for as long as the caller holds it, even if a
    /// reload happens in the meantime.
    pub fn snapshot(&self) -> Arc<[MutationRule]> {
        // A poisoned lock still guards a valid Arc; the swap cannot panic halfway.
        match self.rules.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    /// Replace the rule list, returning the previous snapshot
    pub fn reload(&self, rules: Vec<MutationRule>) -> Arc<[MutationRule]> {
        let next: Arc<[MutationRule]> = rules.into();
        let count = next.len();
        let previous = match self.rules.write() {
            Ok(mut guard) => std::mem::replace(&mut *guard, next),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), next),
        };
        info!(
            previous = previous.len(),
            rules = count,
            "Reloaded mutation rules"
        );
        previous
    }

    /// Whether the current snapshot has no rules
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}
