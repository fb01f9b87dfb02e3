//! Redraw requests and their coalescing.

use std::{collections::HashMap, hash::Hash};

use ontoscope_core::scheduler::Debouncer;

/// How much work a redraw request asks for.
///
/// Levels are ordered: each level implies the work of every lower level.
///
/// # Examples
///
/// ```
/// use ontoscope::rendering::RedrawLevel;
///
/// assert!(RedrawLevel::RecomputeTemplate.implies(RedrawLevel::Render));
/// assert!(!RedrawLevel::Render.implies(RedrawLevel::RedrawTemplate));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RedrawLevel {
    /// Re-render with the same template props.
    Render,
    /// Refresh the template identity without recomputing its props.
    RedrawTemplate,
    /// Recompute template props from the model.
    RecomputeTemplate,
}

impl RedrawLevel {
    pub fn implies(self, other: RedrawLevel) -> bool {
        self >= other
    }

    /// Combines two requests into one that covers both.
    pub fn merge(self, other: RedrawLevel) -> RedrawLevel {
        self.max(other)
    }
}

/// Pending redraw requests of one render layer.
///
/// Requests accumulate until the layer drains them with [`RedrawBatch::take`].
/// Any number of requests between two drains costs one flush.
#[derive(Debug)]
pub struct RedrawBatch<K> {
    requests: HashMap<K, RedrawLevel>,
    all: Option<RedrawLevel>,
    debouncer: Debouncer,
}

/// Requests drained from a [`RedrawBatch`].
#[derive(Debug)]
pub struct DrainedRequests<K> {
    pub requests: HashMap<K, RedrawLevel>,
    pub all: Option<RedrawLevel>,
}

impl<K: Eq + Hash> DrainedRequests<K> {
    /// Effective level for `key`, combining its own request and the all-request.
    pub fn level_for(&self, key: &K) -> Option<RedrawLevel> {
        match (self.requests.get(key).copied(), self.all) {
            (Some(own), Some(all)) => Some(own.merge(all)),
            (own, all) => own.or(all),
        }
    }
}

impl<K: Eq + Hash> RedrawBatch<K> {
    pub fn new(debouncer: Debouncer) -> Self {
        Self {
            requests: HashMap::new(),
            all: None,
            debouncer,
        }
    }

    /// Requests a redraw of one entity.
    ///
    /// A request already covered by the all-request is dropped.
    pub fn request(&mut self, key: K, level: RedrawLevel) {
        if self.all.is_some_and(|all| all.implies(level)) {
            return;
        }
        self.requests
            .entry(key)
            .and_modify(|existing| *existing = existing.merge(level))
            .or_insert(level);
        self.debouncer.schedule();
    }

    /// Requests a redraw of every entity.
    pub fn request_all(&mut self, level: RedrawLevel) {
        self.all = Some(self.all.map_or(level, |all| all.merge(level)));
        self.debouncer.schedule();
    }

    /// Schedules a flush without requesting anything.
    pub fn touch(&self) {
        self.debouncer.schedule();
    }

    pub fn is_scheduled(&self) -> bool {
        self.debouncer.is_scheduled()
    }

    /// Drains all requests and clears the scheduled flag.
    pub fn take(&mut self) -> DrainedRequests<K> {
        self.debouncer.take();
        DrainedRequests {
            requests: std::mem::take(&mut self.requests),
            all: self.all.take(),
        }
    }
}

/// Entities that changed in one flush of a render layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerDiff<K> {
    pub added: Vec<K>,
    pub updated: Vec<K>,
    pub removed: Vec<K>,
}

impl<K> LayerDiff<K> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.updated.len() + self.removed.len()
    }
}

impl<K> Default for LayerDiff<K> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            updated: Vec::new(),
            removed: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_merge_to_highest_level() {
        let mut batch = RedrawBatch::new(Debouncer::new());
        batch.request("a", RedrawLevel::Render);
        batch.request("a", RedrawLevel::RecomputeTemplate);
        batch.request("a", RedrawLevel::RedrawTemplate);

        let drained = batch.take();
        assert_eq!(drained.level_for(&"a"), Some(RedrawLevel::RecomputeTemplate));
        assert_eq!(drained.level_for(&"b"), None);
    }

    #[test]
    fn test_all_request_dominates() {
        let mut batch = RedrawBatch::new(Debouncer::new());
        batch.request_all(RedrawLevel::RedrawTemplate);
        batch.request("a", RedrawLevel::Render);
        batch.request("b", RedrawLevel::RecomputeTemplate);

        let drained = batch.take();
        assert!(!drained.requests.contains_key("a"));
        assert_eq!(drained.level_for(&"a"), Some(RedrawLevel::RedrawTemplate));
        assert_eq!(drained.level_for(&"b"), Some(RedrawLevel::RecomputeTemplate));
    }

    #[test]
    fn test_take_resets_state() {
        let debouncer = Debouncer::new();
        let mut batch = RedrawBatch::new(debouncer.clone());
        for _ in 0..100 {
            batch.request(1, RedrawLevel::Render);
        }
        assert!(debouncer.is_scheduled());

        let drained = batch.take();
        assert_eq!(drained.requests.len(), 1);
        assert!(!debouncer.is_scheduled());

        let empty = batch.take();
        assert!(empty.requests.is_empty());
        assert_eq!(empty.all, None);
    }
}
