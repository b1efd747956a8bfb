//! Per-scene-kind completion predicates.
//!
//! Each mini-game encodes "finished" differently in its transient record.
//! Adding a mini-game means registering a predicate under its kind tag.

use std::collections::HashMap;
use std::fmt;

use super::records::{TransientRecord, MAX_STARS};

/// Returns true when a transient record shows the mini-game as finished.
pub type CompletionPredicate = Box<dyn Fn(&TransientRecord) -> bool + Send + Sync>;

pub const PHASE_COMPLETE: &str = "phase_complete";
pub const ALL_PHASES_COMPLETE: &str = "all_phases_complete";
pub const PLACED_ITEMS: &str = "placed_items";

/// Items a placement mini-game needs before it counts as finished.
pub const DEFAULT_PLACED_ITEMS: usize = 3;

/// Mapping from scene kind tag to completion predicate.
pub struct CompletionRegistry {
    predicates: HashMap<String, CompletionPredicate>,
}

impl CompletionRegistry {
    /// An empty registry; no scene kind is ever complete from transient data.
    pub fn empty() -> Self {
        Self {
            predicates: HashMap::new(),
        }
    }

    /// Register (or replace) the predicate for `kind`.
    pub fn register<F>(&mut self, kind: impl Into<String>, predicate: F)
    where
        F: Fn(&TransientRecord) -> bool + Send + Sync + 'static,
    {
        self.predicates.insert(kind.into(), Box::new(predicate));
    }

    pub fn with<F>(mut self, kind: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&TransientRecord) -> bool + Send + Sync + 'static,
    {
        self.register(kind, predicate);
        self
    }

    /// Evaluate the predicate for `kind`. Unknown kinds are never complete.
    pub fn is_complete(&self, kind: &str, record: &TransientRecord) -> bool {
        self.predicates
            .get(kind)
            .map(|predicate| predicate(record))
            .unwrap_or(false)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.predicates.contains_key(kind)
    }
}

impl Default for CompletionRegistry {
    fn default() -> Self {
        Self::empty()
            .with(PHASE_COMPLETE, |r| r.phase() == Some("complete"))
            .with(ALL_PHASES_COMPLETE, |r| {
                r.phase() == Some("all_complete") && r.flag("gameComplete")
            })
            .with(PLACED_ITEMS, placed_items(DEFAULT_PLACED_ITEMS))
    }
}

impl fmt::Debug for CompletionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.predicates.keys().collect();
        kinds.sort();
        f.debug_struct("CompletionRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

/// Complete once `placed` holds `required` entries or full stars were earned.
pub fn placed_items(required: usize) -> impl Fn(&TransientRecord) -> bool + Send + Sync {
    move |r| r.entry_count("placed") >= required || r.stars() >= MAX_STARS
}
