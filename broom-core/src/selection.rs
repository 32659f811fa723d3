use std::collections::BTreeSet;

use tracing::debug;

use crate::candidate::Candidate;

/// Entity ids marked for deletion.
///
/// Bulk operations are scoped to the ids the caller passes as visible, so
/// selections made under another filter survive filter changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add if absent, remove if present. Returns whether `id` is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn select_all_visible<I>(&mut self, visible_ids: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for id in visible_ids {
            self.ids.insert(id.as_ref().to_string());
        }
    }

    pub fn deselect_all_visible<I>(&mut self, visible_ids: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for id in visible_ids {
            self.ids.remove(id.as_ref());
        }
    }

    /// True iff `visible_ids` is non-empty and every id in it is selected
    pub fn is_all_visible_selected<I>(&self, visible_ids: I) -> bool
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut any = false;
        for id in visible_ids {
            if !self.ids.contains(id.as_ref()) {
                return false;
            }
            any = true;
        }
        any
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &BTreeSet<String> {
        &self.ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Selected ids that still exist in `candidates`
    pub fn deletable(&self, candidates: &[Candidate]) -> BTreeSet<String> {
        candidates
            .iter()
            .filter(|c| self.ids.contains(&c.entity_id))
            .map(|c| c.entity_id.clone())
            .collect()
    }

    /// Drop ids that are no longer part of `candidates`; returns how many
    pub fn prune_stale(&mut self, candidates: &[Candidate]) -> usize {
        let live = self.deletable(candidates);
        let stale = self.ids.len() - live.len();
        if stale > 0 {
            debug!(stale, "pruned stale selection entries");
        }
        self.ids = live;
        stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Status;
    use crate::view::{SortState, StatusFilter, derive, visible_ids};
    use proptest::prelude::*;

    fn cand(id: &str, status: &str) -> Candidate {
        Candidate::new(id, id, "demo", Status::new(status), 1)
    }

    #[test]
    fn test_toggle() {
        let mut sel = SelectionSet::new();
        assert!(sel.toggle("a"));
        assert!(sel.contains("a"));
        assert!(!sel.toggle("a"));
        assert!(sel.is_empty());
    }

    #[test]
    fn test_select_all_is_scoped_to_visible() {
        let candidates = vec![
            cand("a", "unavailable"),
            cand("b", "orphaned"),
            cand("c", "unavailable"),
        ];
        let mut sel = SelectionSet::new();
        sel.toggle("b");

        let filter = StatusFilter::Only(Status::unavailable());
        let visible = visible_ids(&derive(&candidates, &filter, SortState::default()));
        sel.select_all_visible(&visible);
        assert_eq!(sel.len(), 3);
        assert!(sel.is_all_visible_selected(&visible));

        sel.deselect_all_visible(&visible);
        assert_eq!(sel.len(), 1);
        assert!(sel.contains("b"));
    }

    #[test]
    fn test_all_visible_selected_requires_non_empty() {
        let sel = SelectionSet::new();
        let empty: Vec<String> = Vec::new();
        assert!(!sel.is_all_visible_selected(&empty));

        let mut sel = SelectionSet::new();
        sel.toggle("a");
        assert!(!sel.is_all_visible_selected(["a", "b"]));
        assert!(sel.is_all_visible_selected(["a"]));
    }

    #[test]
    fn test_deletable_excludes_stale_ids() {
        let mut sel = SelectionSet::new();
        sel.select_all_visible(["a", "gone"]);
        let candidates = vec![cand("a", "orphaned"), cand("b", "orphaned")];

        let ids = sel.deletable(&candidates);
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), ["a"]);

        assert_eq!(sel.prune_stale(&candidates), 1);
        assert_eq!(sel.len(), 1);
        assert!(!sel.contains("gone"));
    }

    #[test]
    fn test_clear() {
        let mut sel = SelectionSet::new();
        sel.select_all_visible(["a", "b"]);
        sel.clear();
        assert!(sel.is_empty());
    }

    fn arb_ids() -> impl Strategy<Value = BTreeSet<String>> {
        prop::collection::btree_set("[a-f]{1,2}", 0..12)
    }

    proptest! {
        #[test]
        fn select_then_deselect_restores(initial in arb_ids(), visible in arb_ids()) {
            let mut sel = SelectionSet::new();
            sel.select_all_visible(&initial);
            let before = sel.clone();

            // Selections made under another filter are never part of the visible scope
            let visible: Vec<String> = visible.into_iter().filter(|id| !initial.contains(id)).collect();
            sel.select_all_visible(&visible);
            sel.deselect_all_visible(&visible);
            prop_assert_eq!(&sel, &before);
        }

        #[test]
        fn bulk_ops_leave_outside_ids_untouched(initial in arb_ids(), visible in arb_ids(), select in prop::bool::ANY) {
            let mut sel = SelectionSet::new();
            sel.select_all_visible(&initial);
            if select {
                sel.select_all_visible(&visible);
            } else {
                sel.deselect_all_visible(&visible);
            }
            for id in initial.iter().filter(|id| !visible.contains(*id)) {
                prop_assert!(sel.contains(id));
            }
            for id in sel.iter() {
                prop_assert!(initial.contains(id) || visible.contains(id));
            }
        }
    }
}
