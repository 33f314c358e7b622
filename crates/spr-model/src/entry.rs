//! Registration entries and entry sets
//!
//! An [`Entry`] is one line of a registry artifact. An [`EntrySet`] is the
//! mutable merge structure for one resource: an insertion-ordered map from
//! identifier to entry with O(1) upsert and removal, sorted into the entry
//! total order only when it is serialized.

use crate::id::ImplementationId;
use crate::position::Position;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// One registration of an implementation within a resource
///
/// Ordering is `(position, id)`: ranked before unranked, then identifier
/// ascending. Two entries with the same `id` occupy the same slot in an
/// [`EntrySet`] regardless of position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    id: ImplementationId,
    #[serde(default)]
    position: Position,
    #[serde(default)]
    supersedes: BTreeSet<ImplementationId>,
}

impl Entry {
    /// Create an unranked entry with no supersedes
    #[inline]
    #[must_use]
    pub fn new(id: ImplementationId) -> Self {
        Self {
            id,
            position: Position::Unranked,
            supersedes: BTreeSet::new(),
        }
    }

    /// Set position
    #[inline]
    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Set supersede list
    #[inline]
    #[must_use]
    pub fn with_supersedes(mut self, supersedes: impl IntoIterator<Item = ImplementationId>) -> Self {
        self.supersedes = supersedes.into_iter().collect();
        self
    }

    /// Add one superseded identifier
    #[inline]
    #[must_use]
    pub fn superseding(mut self, id: ImplementationId) -> Self {
        self.supersedes.insert(id);
        self
    }

    /// Implementation identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ImplementationId {
        &self.id
    }

    /// Position
    #[inline]
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Identifiers this entry removes when merged
    #[inline]
    #[must_use]
    pub fn supersedes(&self) -> &BTreeSet<ImplementationId> {
        &self.supersedes
    }

    /// Compare by the entry total order
    #[inline]
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.position
            .cmp(&other.position)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Result of merging one entry into an [`EntrySet`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Identifiers removed by the entry's supersede list
    pub superseded: Vec<ImplementationId>,

    /// Entry that previously occupied the same slot, if any
    pub replaced: Option<Entry>,
}

/// Ordered merge structure for the entries of one resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntrySet {
    entries: IndexMap<ImplementationId, Entry>,
}

impl EntrySet {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge an entry
    ///
    /// 1. Removes every entry whose identifier is in `entry.supersedes` and
    ///    present right now (no transitive closure).
    /// 2. Replaces the entry with the same identifier in place, or inserts.
    pub fn merge(&mut self, entry: Entry) -> MergeOutcome {
        let superseded = entry
            .supersedes
            .iter()
            .filter_map(|victim| self.entries.swap_remove(victim).map(|e| e.id))
            .collect();

        let replaced = self.entries.insert(entry.id.clone(), entry);

        MergeOutcome {
            superseded,
            replaced,
        }
    }

    /// Insert or replace an entry without applying its supersede list
    ///
    /// Used when rebuilding a set that was already merged, where every entry
    /// present survived its own merge.
    #[inline]
    pub fn upsert(&mut self, entry: Entry) -> Option<Entry> {
        self.entries.insert(entry.id.clone(), entry)
    }

    /// Remove an entry by identifier
    #[inline]
    pub fn remove(&mut self, id: &str) -> Option<Entry> {
        self.entries.swap_remove(id)
    }

    /// Look up an entry by identifier
    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Entry> {
        self.entries.get(id)
    }

    /// Check if an identifier is present
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in the total order
    #[must_use]
    pub fn sorted(&self) -> Vec<&Entry> {
        let mut ordered: Vec<_> = self.entries.values().collect();
        ordered.sort_by(|a, b| a.total_cmp(b));
        ordered
    }

    /// Identifiers in the total order
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<&ImplementationId> {
        self.sorted().into_iter().map(Entry::id).collect()
    }
}

impl FromIterator<Entry> for EntrySet {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        let mut set = Self::new();
        for entry in iter {
            set.merge(entry);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(s: &str) -> ImplementationId {
        ImplementationId::new(s).unwrap()
    }

    fn ranked(s: &str, rank: i32) -> Entry {
        Entry::new(id(s)).with_position(Position::Ranked(rank))
    }

    fn names(set: &EntrySet) -> Vec<&str> {
        set.sorted_ids().into_iter().map(ImplementationId::as_str).collect()
    }

    #[test]
    fn total_order_position_then_id() {
        let set: EntrySet = vec![
            ranked("b", 5),
            ranked("a", 5),
            Entry::new(id("z")),
            ranked("c", 1),
        ]
        .into_iter()
        .collect();

        assert_eq!(names(&set), vec!["c", "a", "b", "z"]);
    }

    #[test]
    fn same_id_replaces_in_place() {
        let mut set = EntrySet::new();
        set.merge(ranked("x.A", 10));
        let outcome = set.merge(ranked("x.A", 1));

        assert_eq!(set.len(), 1);
        assert_eq!(set.get("x.A").unwrap().position(), Position::Ranked(1));
        assert_eq!(outcome.replaced.unwrap().position(), Position::Ranked(10));
    }

    #[test]
    fn identical_merge_is_idempotent() {
        let mut set = EntrySet::new();
        set.merge(ranked("x.A", 3));
        set.merge(ranked("x.A", 3));
        assert_eq!(names(&set), vec!["x.A"]);
    }

    #[test]
    fn supersede_removes_present_entries() {
        let mut set = EntrySet::new();
        set.merge(Entry::new(id("x.Default")));
        let outcome = set.merge(Entry::new(id("x.Override")).superseding(id("x.Default")));

        assert_eq!(names(&set), vec!["x.Override"]);
        assert_eq!(outcome.superseded, vec![id("x.Default")]);
    }

    #[test]
    fn supersede_is_not_retroactive() {
        // The victim arrives after the superseding entry and survives.
        let mut set = EntrySet::new();
        set.merge(Entry::new(id("x.Override")).superseding(id("x.Default")));
        set.merge(Entry::new(id("x.Default")));

        assert_eq!(names(&set), vec!["x.Default", "x.Override"]);
    }

    #[test]
    fn upsert_ignores_supersede_list() {
        let mut set = EntrySet::new();
        set.upsert(Entry::new(id("x.Default")));
        set.upsert(Entry::new(id("x.Override")).superseding(id("x.Default")));
        assert_eq!(names(&set), vec!["x.Default", "x.Override"]);

        let replaced = set.upsert(ranked("x.Default", 2)).unwrap();
        assert_eq!(replaced.position(), Position::Unranked);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn supersede_is_not_transitive() {
        let mut set = EntrySet::new();
        set.merge(Entry::new(id("a")));
        set.merge(Entry::new(id("b")).superseding(id("a")));
        set.merge(Entry::new(id("c")).superseding(id("b")));
        assert_eq!(names(&set), vec!["c"]);
        assert!(!set.contains("a"));
    }

    #[test]
    fn supersede_of_absent_is_noop() {
        let mut set = EntrySet::new();
        let outcome = set.merge(Entry::new(id("a")).superseding(id("missing")));
        assert!(outcome.superseded.is_empty());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn self_supersede_keeps_entry() {
        let mut set = EntrySet::new();
        set.merge(ranked("a", 1));
        set.merge(Entry::new(id("a")).superseding(id("a")));
        assert_eq!(set.get("a").unwrap().position(), Position::Unranked);
    }

    proptest! {
        #[test]
        fn sorted_is_sorted_and_unique(ops in prop::collection::vec((0u8..8, prop::option::of(-3i32..3)), 0..40)) {
            let mut set = EntrySet::new();
            for (n, rank) in ops {
                let entry = Entry::new(id(&format!("p.E{n}"))).with_position(Position::from_rank(rank));
                set.merge(entry);
            }

            let sorted = set.sorted();
            prop_assert_eq!(sorted.len(), set.len());
            for pair in sorted.windows(2) {
                prop_assert_eq!(pair[0].total_cmp(pair[1]), Ordering::Less);
            }
        }
    }
}
