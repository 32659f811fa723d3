use std::collections::VecDeque;
use std::sync::{Arc, mpsc};

use broom_core::{
    Backend, BackupInfo, BroomError, Candidate, CandidateStore, DeletionWorkflow, Effect, Notice,
    PanelSnapshot, RefreshOutcome, RefreshTicket, Result, SelectionSet, SortField, SortState,
    StatusFilter, WorkflowPhase, WorkflowState,
};
use tracing::{debug, warn};

/// Application mode, derived from the panel state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// First candidate load still running
    Loading,
    /// Browsing the candidate table
    Browsing,
    /// Showing help overlay
    Help,
    /// Deletion workflow is asking a yes/no question
    Prompt,
    /// Waiting on a backup or delete call
    Pending,
    /// A notice is waiting to be dismissed
    Notice,
}

/// Result of a backend call made for the deletion workflow
enum WorkflowReply {
    Backup(Result<()>),
    Delete(Result<()>),
}

struct PendingRefresh {
    ticket: RefreshTicket,
    receiver: mpsc::Receiver<Result<Vec<Candidate>>>,
}

/// Application state
pub struct AppState {
    backend: Arc<dyn Backend>,
    /// Last fetched candidate set
    pub store: CandidateStore,
    /// Ids marked for deletion
    pub selection: SelectionSet,
    pub sort: SortState,
    pub filter: StatusFilter,
    pub workflow: DeletionWorkflow,
    /// Derived view handed to the widgets, rebuilt after every change
    pub snapshot: PanelSnapshot,
    /// Cursor row in the visible list
    pub selected_index: usize,
    /// Scroll offset of the table
    pub scroll_offset: usize,
    /// Visible area height (set by UI)
    pub visible_height: usize,
    pub show_help: bool,
    /// Whether app should quit
    pub should_quit: bool,
    /// Spinner frame for animation
    pub spinner_frame: usize,
    /// Messages waiting for the operator, oldest first
    pub notices: VecDeque<Notice>,
    pub backup_info: BackupInfo,
    /// Entities removed during this session
    pub deleted_total: usize,
    pending_refresh: Option<PendingRefresh>,
    workflow_receiver: Option<mpsc::Receiver<WorkflowReply>>,
    backup_info_receiver: Option<mpsc::Receiver<Result<BackupInfo>>>,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn Backend>,
        threshold_days: u32,
        sort: SortState,
        filter: StatusFilter,
    ) -> Self {
        let store = CandidateStore::new(threshold_days);
        let selection = SelectionSet::new();
        let workflow = DeletionWorkflow::new();
        let snapshot = PanelSnapshot::capture(&store, &selection, &filter, sort, workflow.state());

        Self {
            backend,
            store,
            selection,
            sort,
            filter,
            workflow,
            snapshot,
            selected_index: 0,
            scroll_offset: 0,
            visible_height: 20,
            show_help: false,
            should_quit: false,
            spinner_frame: 0,
            notices: VecDeque::new(),
            backup_info: BackupInfo::default(),
            deleted_total: 0,
            pending_refresh: None,
            workflow_receiver: None,
            backup_info_receiver: None,
        }
    }

    /// Kick off the initial load
    pub fn start(&mut self) {
        self.start_refresh();
        self.fetch_backup_info();
    }

    pub fn mode(&self) -> AppMode {
        let workflow = self.workflow.state();
        if self.show_help {
            AppMode::Help
        } else if workflow.prompt().is_some() {
            AppMode::Prompt
        } else if workflow.is_pending() {
            AppMode::Pending
        } else if !self.notices.is_empty() || workflow.is_terminal() {
            AppMode::Notice
        } else if !self.store.is_loaded() && self.pending_refresh.is_some() {
            AppMode::Loading
        } else {
            AppMode::Browsing
        }
    }

    pub fn workflow_state(&self) -> &WorkflowState {
        self.workflow.state()
    }

    pub fn is_refreshing(&self) -> bool {
        self.pending_refresh.is_some()
    }

    /// Any background call still outstanding
    pub fn is_busy(&self) -> bool {
        self.pending_refresh.is_some()
            || self.workflow_receiver.is_some()
            || self.backup_info_receiver.is_some()
    }

    /// Advance spinner animation
    pub fn tick_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % 10;
    }

    fn rebuild_snapshot(&mut self) {
        self.snapshot = PanelSnapshot::capture(
            &self.store,
            &self.selection,
            &self.filter,
            self.sort,
            self.workflow.state(),
        );
        self.clamp_cursor();
    }

    fn visible_count(&self) -> usize {
        self.snapshot.visible.len()
    }

    /// Candidate under the cursor
    pub fn current_candidate(&self) -> Option<&Candidate> {
        self.snapshot.visible.get(self.selected_index)
    }

    // --- Navigation ---

    /// Ensure the given index is visible within the scroll viewport
    fn ensure_visible_for(selected: usize, scroll: &mut usize, visible_height: usize) {
        if selected < *scroll {
            *scroll = selected;
        } else if visible_height > 0 && selected >= *scroll + visible_height {
            *scroll = selected + 1 - visible_height;
        }
    }

    fn set_cursor(&mut self, index: usize) {
        self.selected_index = index.min(self.visible_count().saturating_sub(1));
        Self::ensure_visible_for(
            self.selected_index,
            &mut self.scroll_offset,
            self.visible_height,
        );
    }

    fn clamp_cursor(&mut self) {
        let count = self.visible_count();
        if self.scroll_offset > 0 && self.scroll_offset >= count {
            self.scroll_offset = count.saturating_sub(1);
        }
        self.set_cursor(self.selected_index);
    }

    pub fn move_up(&mut self) {
        self.set_cursor(self.selected_index.saturating_sub(1));
    }

    pub fn move_down(&mut self) {
        self.set_cursor(self.selected_index + 1);
    }

    pub fn page_up(&mut self) {
        let page_size = self.visible_height.saturating_sub(2).max(1);
        self.set_cursor(self.selected_index.saturating_sub(page_size));
    }

    pub fn page_down(&mut self) {
        let page_size = self.visible_height.saturating_sub(2).max(1);
        self.set_cursor(self.selected_index + page_size);
    }

    pub fn go_to_first(&mut self) {
        self.set_cursor(0);
    }

    pub fn go_to_last(&mut self) {
        self.set_cursor(self.visible_count().saturating_sub(1));
    }

    // --- Selection, sort and filter ---

    /// Toggle the row under the cursor
    pub fn toggle_select(&mut self) {
        if let Some(id) = self.current_candidate().map(|c| c.entity_id.clone()) {
            self.selection.toggle(&id);
            self.rebuild_snapshot();
        }
    }

    /// Select all visible rows, or clear them when all are already selected
    pub fn toggle_select_all(&mut self) {
        let visible: Vec<String> = self
            .snapshot
            .visible
            .iter()
            .map(|c| c.entity_id.clone())
            .collect();
        if self.snapshot.all_visible_selected {
            self.selection.deselect_all_visible(&visible);
        } else {
            self.selection.select_all_visible(&visible);
        }
        self.rebuild_snapshot();
    }

    pub fn sort_by(&mut self, field: SortField) {
        self.sort.request(field);
        self.rebuild_snapshot();
    }

    pub fn cycle_filter(&mut self, forward: bool) {
        self.filter = self.filter.cycled(self.store.candidates(), forward);
        self.selected_index = 0;
        self.scroll_offset = 0;
        self.rebuild_snapshot();
    }

    // --- Refresh ---

    /// Change the threshold by `delta` days and reload
    pub fn adjust_threshold(&mut self, delta: i32) {
        if self.workflow.is_active() {
            debug!("threshold change ignored during deletion");
            return;
        }
        let current = self.store.current_threshold();
        let next = current.saturating_add_signed(delta);
        if next == current {
            return;
        }
        self.store.set_threshold(next);
        self.start_refresh();
        self.rebuild_snapshot();
    }

    /// Manual reload; ignored while a deletion or another refresh is underway
    pub fn request_refresh(&mut self) {
        if self.workflow.is_active() || self.pending_refresh.is_some() {
            debug!(
                phase = %self.workflow.phase(),
                in_flight = self.pending_refresh.is_some(),
                "manual refresh ignored"
            );
            return;
        }
        self.start_refresh();
        self.fetch_backup_info();
    }

    /// Fetch candidates on a worker thread, superseding any refresh in flight
    fn start_refresh(&mut self) {
        let ticket = self.store.begin_refresh();
        let (tx, rx) = mpsc::channel();
        let backend = Arc::clone(&self.backend);

        std::thread::spawn(move || {
            let _ = tx.send(backend.list_candidates(ticket.threshold_days()));
        });

        self.pending_refresh = Some(PendingRefresh {
            ticket,
            receiver: rx,
        });
    }

    fn fetch_backup_info(&mut self) {
        let (tx, rx) = mpsc::channel();
        let backend = Arc::clone(&self.backend);
        std::thread::spawn(move || {
            let _ = tx.send(backend.backup_info());
        });
        self.backup_info_receiver = Some(rx);
    }

    /// Check background calls and fold in their results
    pub fn poll(&mut self) {
        self.poll_refresh();
        self.poll_workflow();
        self.poll_backup_info();
    }

    fn poll_refresh(&mut self) {
        let Some(pending) = &self.pending_refresh else {
            return;
        };
        let result = match pending.receiver.try_recv() {
            Ok(result) => result,
            Err(mpsc::TryRecvError::Empty) => return,
            Err(mpsc::TryRecvError::Disconnected) => {
                Err(BroomError::Fetch("refresh worker stopped".to_string()))
            }
        };
        let ticket = pending.ticket;
        self.pending_refresh = None;

        match self.store.apply_refresh(ticket, result) {
            Ok(RefreshOutcome::Updated { .. }) => {
                self.selection.prune_stale(self.store.candidates());
                self.filter = self.filter.revalidated(self.store.candidates());
            }
            Ok(RefreshOutcome::Discarded) => {}
            Err(e) => self
                .notices
                .push_back(Notice::FetchFailed { reason: e.reason() }),
        }
        self.rebuild_snapshot();
    }

    fn poll_backup_info(&mut self) {
        let Some(rx) = &self.backup_info_receiver else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(info)) => self.backup_info = info,
            Ok(Err(e)) => warn!(error = %e, "could not read backup info"),
            Err(mpsc::TryRecvError::Empty) => return,
            Err(mpsc::TryRecvError::Disconnected) => {}
        }
        self.backup_info_receiver = None;
    }

    // --- Deletion workflow ---

    pub fn request_delete(&mut self) {
        let result = self.workflow.request(&self.selection, &self.store);
        self.handle_workflow_result(result);
    }

    /// Answer the open prompt
    pub fn answer(&mut self, yes: bool) {
        let result = self.workflow.answer(yes, &self.store);
        self.handle_workflow_result(result);
    }

    /// Abort at a prompt without touching the backend
    pub fn cancel_prompt(&mut self) {
        let result = self.workflow.cancel();
        self.handle_workflow_result(result);
    }

    fn handle_workflow_result(&mut self, result: Result<Vec<Effect>>) {
        match result {
            Ok(effects) => self.apply_effects(effects),
            Err(e) => debug!(error = %e, "workflow step rejected"),
        }
        self.rebuild_snapshot();
    }

    fn apply_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Notify(notice) => self.notices.push_back(notice),
                Effect::StartBackup => {
                    let backend = Arc::clone(&self.backend);
                    self.spawn_workflow_call(move || WorkflowReply::Backup(backend.create_backup()));
                }
                Effect::StartDelete(ids) => {
                    let backend = Arc::clone(&self.backend);
                    self.spawn_workflow_call(move || {
                        WorkflowReply::Delete(backend.delete_entities(&ids))
                    });
                }
                Effect::Refresh => {
                    self.start_refresh();
                    self.fetch_backup_info();
                }
            }
        }
    }

    fn spawn_workflow_call<F>(&mut self, call: F)
    where
        F: FnOnce() -> WorkflowReply + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(call());
        });
        self.workflow_receiver = Some(rx);
    }

    fn poll_workflow(&mut self) {
        let Some(rx) = &self.workflow_receiver else {
            return;
        };
        let reply = match rx.try_recv() {
            Ok(reply) => reply,
            Err(mpsc::TryRecvError::Empty) => return,
            Err(mpsc::TryRecvError::Disconnected) => {
                let reason = "worker stopped".to_string();
                match self.workflow.phase() {
                    WorkflowPhase::BackupInProgress => {
                        WorkflowReply::Backup(Err(BroomError::Backup(reason)))
                    }
                    _ => WorkflowReply::Delete(Err(BroomError::Delete(reason))),
                }
            }
        };
        self.workflow_receiver = None;

        let result = match reply {
            WorkflowReply::Backup(result) => self.workflow.backup_finished(result, &self.store),
            WorkflowReply::Delete(result) => {
                let result =
                    self.workflow
                        .delete_finished(result, &mut self.store, &mut self.selection);
                if let WorkflowState::Succeeded { deleted } = self.workflow.state() {
                    self.deleted_total += deleted;
                }
                result
            }
        };
        self.handle_workflow_result(result);
    }

    // --- Overlays ---

    /// Close the oldest notice; the last one also closes a finished deletion
    pub fn dismiss_notice(&mut self) {
        self.notices.pop_front();
        if self.notices.is_empty() {
            self.workflow.acknowledge();
        }
        self.rebuild_snapshot();
    }

    pub fn show_help(&mut self) {
        self.show_help = true;
    }

    pub fn hide_help(&mut self) {
        self.show_help = false;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broom_core::RegistryBackend;
    use broom_core::registry::{RegistryEntry, RegistryFile, load_registry, save_registry};
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    fn entry(id: &str, state: Option<&str>) -> RegistryEntry {
        RegistryEntry {
            entity_id: id.to_string(),
            name: Some(id.to_uppercase()),
            original_name: None,
            platform: "zha".to_string(),
            disabled: false,
            state: state.map(str::to_string),
            last_changed: None,
        }
    }

    fn setup() -> (TempDir, AppState) {
        let temp = TempDir::new().unwrap();
        let registry = temp.path().join("registry.json");
        save_registry(
            &registry,
            &RegistryFile {
                entities: vec![
                    entry("sensor.a", None),
                    entry("sensor.b", Some("unavailable")),
                    entry("sensor.c", None),
                    entry("light.on", Some("on")),
                ],
            },
        )
        .unwrap();
        let backend = RegistryBackend::new(registry, temp.path().join("backups"));
        let mut state = AppState::new(
            Arc::new(backend),
            0,
            SortState::by(SortField::EntityId),
            StatusFilter::All,
        );
        state.start();
        settle(&mut state);
        (temp, state)
    }

    /// Poll until every background call has reported back
    fn settle(state: &mut AppState) {
        for _ in 0..500 {
            state.poll();
            if !state.is_busy() {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("background work did not finish");
    }

    fn registry_ids(dir: &Path) -> Vec<String> {
        load_registry(&dir.join("registry.json"))
            .unwrap()
            .entities
            .into_iter()
            .map(|e| e.entity_id)
            .collect()
    }

    #[test]
    fn test_initial_load() {
        let (_temp, state) = setup();
        assert_eq!(state.mode(), AppMode::Browsing);
        assert_eq!(state.snapshot.total, 3);
        assert_eq!(state.current_candidate().unwrap().entity_id, "sensor.a");
    }

    #[test]
    fn test_navigation_clamps() {
        let (_temp, mut state) = setup();
        state.move_up();
        assert_eq!(state.selected_index, 0);
        state.go_to_last();
        assert_eq!(state.selected_index, 2);
        state.move_down();
        assert_eq!(state.selected_index, 2);
    }

    #[test]
    fn test_select_all_respects_filter() {
        let (_temp, mut state) = setup();
        state.selection.toggle("sensor.b");
        state.filter = StatusFilter::Only(broom_core::Status::orphaned());
        state.rebuild_snapshot();

        state.toggle_select_all();
        assert_eq!(state.selection.len(), 3);
        assert!(state.snapshot.all_visible_selected);

        state.toggle_select_all();
        assert_eq!(state.selection.len(), 1);
        assert_eq!(state.snapshot.selected_outside_view(), 1);
    }

    #[test]
    fn test_delete_with_backup() {
        let (temp, mut state) = setup();
        state.toggle_select();
        state.move_down();
        state.toggle_select();

        state.request_delete();
        assert_eq!(state.mode(), AppMode::Prompt);
        state.answer(true);
        assert!(matches!(
            state.mode(),
            AppMode::Pending | AppMode::Notice
        ));
        settle(&mut state);

        assert_eq!(
            state.notices.iter().cloned().collect::<Vec<_>>(),
            [Notice::BackupCreated, Notice::Deleted { count: 2 }]
        );
        assert_eq!(registry_ids(temp.path()), ["sensor.c", "light.on"]);
        assert_eq!(state.snapshot.total, 1);
        assert!(state.selection.is_empty());
        assert_eq!(state.deleted_total, 2);
        assert!(state.backup_info.last_auto.is_some());

        state.dismiss_notice();
        state.dismiss_notice();
        assert_eq!(state.mode(), AppMode::Browsing);
        assert!(state.workflow.is_idle());
    }

    #[test]
    fn test_declining_twice_cancels() {
        let (temp, mut state) = setup();
        state.toggle_select();
        state.request_delete();
        state.answer(false);
        assert_eq!(state.mode(), AppMode::Prompt);
        state.answer(false);

        assert_eq!(state.mode(), AppMode::Browsing);
        assert_eq!(registry_ids(temp.path()).len(), 4);
        assert!(state.selection.contains("sensor.a"));
    }

    #[test]
    fn test_refresh_ignored_during_prompt() {
        let (_temp, mut state) = setup();
        state.toggle_select();
        state.request_delete();
        state.request_refresh();
        assert!(!state.is_refreshing());
    }

    #[test]
    fn test_filter_cycling_keeps_selection() {
        let (_temp, mut state) = setup();
        state.toggle_select();
        state.move_down();
        state.toggle_select();
        let before = state.selection.clone();
        assert_eq!(before.len(), 2);

        // all -> orphaned -> unavailable -> all, then back again
        for forward in [true, true, true, false, false] {
            state.cycle_filter(forward);
            assert_eq!(state.selection, before);
        }
        assert_ne!(state.filter, StatusFilter::All);
        assert!(state.snapshot.selected_outside_view() > 0);
    }

    #[test]
    fn test_threshold_change_reloads() {
        let (_temp, mut state) = setup();
        state.adjust_threshold(-1);
        assert!(!state.is_refreshing());

        state.adjust_threshold(3);
        assert_eq!(state.store.current_threshold(), 3);
        assert!(state.is_refreshing());
        settle(&mut state);
        // No last_changed anywhere, so every candidate survives any threshold
        assert_eq!(state.snapshot.total, 3);
    }
}
