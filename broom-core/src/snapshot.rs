use std::collections::BTreeSet;

use crate::candidate::Candidate;
use crate::selection::SelectionSet;
use crate::store::CandidateStore;
use crate::view::{SortState, StatusFilter, derive};
use crate::workflow::WorkflowState;

/// Immutable picture of the panel handed to the renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelSnapshot {
    /// Filtered and sorted candidates, in display order
    pub visible: Vec<Candidate>,
    pub selection: BTreeSet<String>,
    pub sort: SortState,
    pub filter: StatusFilter,
    pub workflow: WorkflowState,
    /// Size of the unfiltered candidate set
    pub total: usize,
    pub threshold_days: u32,
    /// Drives the select-all checkbox
    pub all_visible_selected: bool,
}

impl PanelSnapshot {
    pub fn capture(
        store: &CandidateStore,
        selection: &SelectionSet,
        filter: &StatusFilter,
        sort: SortState,
        workflow: &WorkflowState,
    ) -> Self {
        let visible: Vec<Candidate> = derive(store.candidates(), filter, sort)
            .into_iter()
            .cloned()
            .collect();
        let all_visible_selected =
            selection.is_all_visible_selected(visible.iter().map(|c| c.entity_id.as_str()));

        Self {
            visible,
            selection: selection.ids().clone(),
            sort,
            filter: filter.clone(),
            workflow: workflow.clone(),
            total: store.len(),
            threshold_days: store.current_threshold(),
            all_visible_selected,
        }
    }

    pub fn is_selected(&self, entity_id: &str) -> bool {
        self.selection.contains(entity_id)
    }

    /// Selected ids hidden by the current filter
    pub fn selected_outside_view(&self) -> usize {
        let shown = self
            .visible
            .iter()
            .filter(|c| self.selection.contains(&c.entity_id))
            .count();
        self.selection.len() - shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Status;

    #[test]
    fn test_capture() {
        let mut store = CandidateStore::new(2);
        let ticket = store.begin_refresh();
        store
            .apply_refresh(
                ticket,
                Ok(vec![
                    Candidate::new("a", "A", "hue", Status::unavailable(), 5),
                    Candidate::new("b", "B", "zha", Status::orphaned(), 30),
                ]),
            )
            .unwrap();
        let mut selection = SelectionSet::new();
        selection.toggle("a");
        selection.toggle("b");

        let filter = StatusFilter::Only(Status::unavailable());
        let snap = PanelSnapshot::capture(
            &store,
            &selection,
            &filter,
            SortState::default(),
            &WorkflowState::Idle,
        );

        assert_eq!(snap.visible.len(), 1);
        assert_eq!(snap.total, 2);
        assert_eq!(snap.threshold_days, 2);
        assert!(snap.all_visible_selected);
        assert!(snap.is_selected("b"));
        assert_eq!(snap.selected_outside_view(), 1);
    }
}
