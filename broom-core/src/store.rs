use std::collections::{BTreeSet, HashSet};

use tracing::{debug, info, warn};

use crate::Result;
use crate::backend::Backend;
use crate::candidate::Candidate;

/// Proof that a refresh was requested at a given store revision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    threshold_days: u32,
    revision: u64,
}

impl RefreshTicket {
    pub fn threshold_days(&self) -> u32 {
        self.threshold_days
    }
}

/// What happened to a completed refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The stored list was replaced
    Updated { count: usize },
    /// The store changed after the refresh was issued; the result was dropped
    Discarded,
}

/// Holds the last fetched candidate set and the active threshold.
///
/// The list only changes through a full replacement on refresh or a
/// targeted local removal after a confirmed deletion.
#[derive(Debug, Default)]
pub struct CandidateStore {
    candidates: Vec<Candidate>,
    threshold_days: u32,
    /// Bumped on every mutation of `candidates`
    revision: u64,
    loaded: bool,
}

impl CandidateStore {
    pub fn new(threshold_days: u32) -> Self {
        Self {
            threshold_days,
            ..Self::default()
        }
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Whether at least one refresh has succeeded
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.candidates.iter().any(|c| c.entity_id == entity_id)
    }

    pub fn ids(&self) -> HashSet<&str> {
        self.candidates
            .iter()
            .map(|c| c.entity_id.as_str())
            .collect()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn current_threshold(&self) -> u32 {
        self.threshold_days
    }

    /// Change the threshold used by the next refresh. Does not refresh.
    ///
    /// Refreshes already issued at the old threshold are discarded on arrival.
    pub fn set_threshold(&mut self, days: u32) {
        if days != self.threshold_days {
            self.threshold_days = days;
            self.revision += 1;
        }
    }

    /// Start a refresh at the current threshold
    pub fn begin_refresh(&self) -> RefreshTicket {
        RefreshTicket {
            threshold_days: self.threshold_days,
            revision: self.revision,
        }
    }

    /// Apply the result of a refresh started with `ticket`.
    ///
    /// On failure the previous list is kept and a fetch error is returned.
    /// Results issued before a later mutation are discarded.
    pub fn apply_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<Vec<Candidate>>,
    ) -> Result<RefreshOutcome> {
        let fetched = match result {
            Ok(list) => list,
            Err(e) => {
                let err = e.into_fetch();
                warn!(threshold = ticket.threshold_days, error = %err, "candidate refresh failed");
                return Err(err);
            }
        };

        if ticket.revision != self.revision {
            debug!(
                issued = ticket.revision,
                current = self.revision,
                "discarding outdated refresh result"
            );
            return Ok(RefreshOutcome::Discarded);
        }

        let unique = dedup_by_id(fetched);
        let count = unique.len();
        self.candidates = unique;
        self.revision += 1;
        self.loaded = true;
        info!(count, threshold = ticket.threshold_days, "candidates updated");
        Ok(RefreshOutcome::Updated { count })
    }

    /// Fetch from the backend and replace the stored list
    pub fn refresh(&mut self, backend: &dyn Backend) -> Result<RefreshOutcome> {
        let ticket = self.begin_refresh();
        let result = backend.list_candidates(ticket.threshold_days);
        self.apply_refresh(ticket, result)
    }

    /// Optimistically drop deleted candidates ahead of a reconciling refresh
    pub fn remove_locally(&mut self, ids: &BTreeSet<String>) -> usize {
        let before = self.candidates.len();
        self.candidates.retain(|c| !ids.contains(&c.entity_id));
        let removed = before - self.candidates.len();
        self.revision += 1;
        debug!(removed, "removed candidates locally");
        removed
    }
}

/// Keep the first occurrence of every entity id
fn dedup_by_id(list: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::with_capacity(list.len());
    let mut result = Vec::with_capacity(list.len());
    for candidate in list {
        if seen.insert(candidate.entity_id.clone()) {
            result.push(candidate);
        } else {
            warn!(entity_id = %candidate.entity_id, "duplicate entity id in fetched set");
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BroomError;
    use crate::candidate::Status;
    use std::sync::Mutex;

    fn cand(id: &str, days: u32) -> Candidate {
        Candidate::new(id, id, "demo", Status::unavailable(), days)
    }

    struct ListBackend {
        result: Mutex<Option<Result<Vec<Candidate>>>>,
        seen_threshold: Mutex<Option<u32>>,
    }

    impl ListBackend {
        fn new(result: Result<Vec<Candidate>>) -> Self {
            Self {
                result: Mutex::new(Some(result)),
                seen_threshold: Mutex::new(None),
            }
        }
    }

    impl Backend for ListBackend {
        fn list_candidates(&self, threshold_days: u32) -> Result<Vec<Candidate>> {
            *self.seen_threshold.lock().unwrap() = Some(threshold_days);
            self.result.lock().unwrap().take().unwrap()
        }
        fn create_backup(&self) -> Result<()> {
            unreachable!()
        }
        fn delete_entities(&self, _ids: &BTreeSet<String>) -> Result<()> {
            unreachable!()
        }
    }

    #[test]
    fn test_refresh_replaces_list() {
        let mut store = CandidateStore::new(3);
        let backend = ListBackend::new(Ok(vec![cand("a", 5), cand("b", 9)]));

        let outcome = store.refresh(&backend).unwrap();

        assert_eq!(outcome, RefreshOutcome::Updated { count: 2 });
        assert_eq!(*backend.seen_threshold.lock().unwrap(), Some(3));
        assert!(store.is_loaded());
        assert!(store.contains("a"));
        assert!(store.contains("b"));
    }

    #[test]
    fn test_failed_refresh_keeps_previous_list() {
        let mut store = CandidateStore::new(0);
        let ticket = store.begin_refresh();
        store
            .apply_refresh(ticket, Ok(vec![cand("a", 1)]))
            .unwrap();
        let revision = store.revision();

        let backend = ListBackend::new(Err(BroomError::Io(std::io::Error::other("offline"))));
        let err = store.refresh(&backend).unwrap_err();

        assert!(matches!(err, BroomError::Fetch(_)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn test_set_threshold_does_not_refresh() {
        let mut store = CandidateStore::new(0);
        store.set_threshold(30);
        assert_eq!(store.current_threshold(), 30);
        assert!(!store.is_loaded());
        assert_eq!(store.begin_refresh().threshold_days(), 30);
    }

    #[test]
    fn test_threshold_change_discards_inflight_refresh() {
        let mut store = CandidateStore::new(0);
        let old = store.begin_refresh();
        store.set_threshold(7);
        let new = store.begin_refresh();

        let outcome = store.apply_refresh(old, Ok(vec![cand("a", 1)])).unwrap();
        assert_eq!(outcome, RefreshOutcome::Discarded);
        assert!(!store.is_loaded());

        store.apply_refresh(new, Ok(vec![cand("b", 9)])).unwrap();
        assert!(store.contains("b"));
    }

    #[test]
    fn test_remove_locally() {
        let mut store = CandidateStore::new(0);
        let ticket = store.begin_refresh();
        store
            .apply_refresh(ticket, Ok(vec![cand("a", 1), cand("b", 2), cand("c", 3)]))
            .unwrap();

        let ids: BTreeSet<String> = ["a".to_string(), "c".to_string(), "zz".to_string()].into();
        assert_eq!(store.remove_locally(&ids), 2);
        assert_eq!(store.len(), 1);
        assert!(store.contains("b"));
    }

    #[test]
    fn test_refresh_issued_before_removal_is_discarded() {
        let mut store = CandidateStore::new(0);
        let first = store.begin_refresh();
        store
            .apply_refresh(first, Ok(vec![cand("a", 1), cand("b", 2)]))
            .unwrap();

        let in_flight = store.begin_refresh();
        store.remove_locally(&["a".to_string()].into());

        let outcome = store
            .apply_refresh(in_flight, Ok(vec![cand("a", 1), cand("b", 2)]))
            .unwrap();
        assert_eq!(outcome, RefreshOutcome::Discarded);
        assert!(!store.contains("a"));

        let fresh = store.begin_refresh();
        let outcome = store.apply_refresh(fresh, Ok(vec![cand("b", 2)])).unwrap();
        assert_eq!(outcome, RefreshOutcome::Updated { count: 1 });
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let mut store = CandidateStore::new(0);
        let ticket = store.begin_refresh();
        store
            .apply_refresh(ticket, Ok(vec![cand("a", 1), cand("a", 99), cand("b", 2)]))
            .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.candidates()[0].days_unavailable, 1);
    }
}
