//! Confirm → optional backup → delete state machine.
//!
//! The machine itself performs no I/O. Every transition returns the
//! [`Effect`]s the caller must carry out: backend calls whose results are
//! fed back through [`DeletionWorkflow::backup_finished`] and
//! [`DeletionWorkflow::delete_finished`], notices for the operator, and a
//! reconciling refresh after a successful deletion. [`DeletionWorkflow::run`]
//! executes the whole sequence synchronously against a [`Backend`] and an
//! [`Operator`].

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use tracing::{debug, info, warn};

use crate::backend::{Backend, Operator};
use crate::error::{BroomError, Result};
use crate::format::pluralize_entities;
use crate::selection::SelectionSet;
use crate::store::CandidateStore;

/// Workflow state without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowPhase {
    Idle,
    Confirming,
    BackupInProgress,
    BackupFailedPending,
    Deleting,
    Succeeded,
    Failed,
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkflowPhase::Idle => "idle",
            WorkflowPhase::Confirming => "awaiting confirmation",
            WorkflowPhase::BackupInProgress => "creating a backup",
            WorkflowPhase::BackupFailedPending => "waiting for a decision after a failed backup",
            WorkflowPhase::Deleting => "deleting",
            WorkflowPhase::Succeeded => "showing a successful result",
            WorkflowPhase::Failed => "showing a failed result",
        };
        f.write_str(s)
    }
}

/// Which confirmation the operator is looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmStep {
    /// "Delete N entities? Create a backup first?"
    OfferBackup,
    /// Second, explicit confirmation for deleting without a backup
    ConfirmWithoutBackup,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    Confirming {
        step: ConfirmStep,
        count: usize,
    },
    BackupInProgress {
        count: usize,
    },
    BackupFailedPending {
        reason: String,
        count: usize,
    },
    Deleting {
        count: usize,
    },
    Succeeded {
        deleted: usize,
    },
    Failed {
        reason: String,
    },
}

impl WorkflowState {
    pub fn phase(&self) -> WorkflowPhase {
        match self {
            WorkflowState::Idle => WorkflowPhase::Idle,
            WorkflowState::Confirming { .. } => WorkflowPhase::Confirming,
            WorkflowState::BackupInProgress { .. } => WorkflowPhase::BackupInProgress,
            WorkflowState::BackupFailedPending { .. } => WorkflowPhase::BackupFailedPending,
            WorkflowState::Deleting { .. } => WorkflowPhase::Deleting,
            WorkflowState::Succeeded { .. } => WorkflowPhase::Succeeded,
            WorkflowState::Failed { .. } => WorkflowPhase::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowState::Succeeded { .. } | WorkflowState::Failed { .. }
        )
    }

    /// A deletion is underway (neither idle nor finished)
    pub fn is_active(&self) -> bool {
        !matches!(self, WorkflowState::Idle) && !self.is_terminal()
    }

    /// Waiting on a backend call
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            WorkflowState::BackupInProgress { .. } | WorkflowState::Deleting { .. }
        )
    }

    /// The yes/no question the operator must answer, if any
    pub fn prompt(&self) -> Option<Prompt> {
        match self {
            WorkflowState::Confirming {
                step: ConfirmStep::OfferBackup,
                count,
            } => Some(Prompt::OfferBackup { count: *count }),
            WorkflowState::Confirming {
                step: ConfirmStep::ConfirmWithoutBackup,
                count,
            } => Some(Prompt::ConfirmWithoutBackup { count: *count }),
            WorkflowState::BackupFailedPending { reason, count } => Some(Prompt::BackupFailed {
                reason: reason.clone(),
                count: *count,
            }),
            _ => None,
        }
    }
}

/// A yes/no question put to the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    /// Yes creates a backup first, no asks again without one
    OfferBackup { count: usize },
    /// Yes deletes without a backup, no cancels
    ConfirmWithoutBackup { count: usize },
    /// Yes deletes anyway, no cancels
    BackupFailed { reason: String, count: usize },
}

impl Prompt {
    pub fn title(&self) -> &'static str {
        match self {
            Prompt::OfferBackup { .. } => "Delete?",
            Prompt::ConfirmWithoutBackup { .. } => "Delete without backup?",
            Prompt::BackupFailed { .. } => "Backup failed",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Prompt::OfferBackup { count } => format!(
                "Delete {}? Create a backup first? (recommended)",
                pluralize_entities(*count)
            ),
            Prompt::ConfirmWithoutBackup { count } => format!(
                "Really delete {} WITHOUT a backup?",
                pluralize_entities(*count)
            ),
            Prompt::BackupFailed { reason, count } => format!(
                "Backup failed: {}. Delete {} anyway?",
                reason,
                pluralize_entities(*count)
            ),
        }
    }
}

/// One-way message for the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    BackupCreated,
    Deleted { count: usize },
    DeleteFailed { reason: String },
    FetchFailed { reason: String },
    /// Every selected entity disappeared before the deletion started
    NothingToDelete,
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::BackupCreated => "Backup created. Deleting now...".to_string(),
            Notice::Deleted { count } => format!("Deleted {}.", pluralize_entities(*count)),
            Notice::DeleteFailed { reason } => format!("Delete failed: {}", reason),
            Notice::FetchFailed { reason } => format!("Failed to load candidates: {}", reason),
            Notice::NothingToDelete => {
                "None of the selected entities exist anymore. Nothing was deleted.".to_string()
            }
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Notice::DeleteFailed { .. } | Notice::FetchFailed { .. }
        )
    }
}

/// Work the caller must perform after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Notify(Notice),
    /// Call `Backend::create_backup`, then report through `backup_finished`
    StartBackup,
    /// Call `Backend::delete_entities`, then report through `delete_finished`
    StartDelete(BTreeSet<String>),
    /// Refresh the candidate store to reconcile with the backend
    Refresh,
}

/// Orchestrates one bulk deletion at a time
#[derive(Debug, Default)]
pub struct DeletionWorkflow {
    state: WorkflowState,
    /// Ids captured when the deletion was requested
    requested: BTreeSet<String>,
    /// Ids handed to the backend delete call
    in_flight: BTreeSet<String>,
}

impl DeletionWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.state.phase()
    }

    pub fn is_idle(&self) -> bool {
        self.state == WorkflowState::Idle
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    fn transition(&mut self, next: WorkflowState) {
        info!(from = %self.state.phase(), to = %next.phase(), "deletion workflow transition");
        self.state = next;
    }

    fn invalid(&self, action: &'static str) -> BroomError {
        BroomError::InvalidTransition {
            from: self.state.phase(),
            action,
        }
    }

    /// Start a deletion of the selected entities that still exist.
    ///
    /// Stays idle when nothing is selected. Rejected while another
    /// deletion is underway or its outcome has not been acknowledged.
    pub fn request(
        &mut self,
        selection: &SelectionSet,
        store: &CandidateStore,
    ) -> Result<Vec<Effect>> {
        if self.state.is_active() {
            debug!(phase = %self.state.phase(), "rejecting overlapping deletion request");
            return Err(BroomError::WorkflowBusy);
        }
        if self.state.is_terminal() {
            return Err(self.invalid("start a deletion"));
        }
        if selection.is_empty() {
            return Ok(Vec::new());
        }

        let ids = selection.deletable(store.candidates());
        if ids.is_empty() {
            debug!(selected = selection.len(), "selection holds only stale ids");
            return Ok(vec![Effect::Notify(Notice::NothingToDelete)]);
        }

        let count = ids.len();
        self.requested = ids;
        self.transition(WorkflowState::Confirming {
            step: ConfirmStep::OfferBackup,
            count,
        });
        Ok(Vec::new())
    }

    /// Operator chose to create a backup first
    pub fn accept_backup(&mut self) -> Result<Vec<Effect>> {
        match self.state {
            WorkflowState::Confirming {
                step: ConfirmStep::OfferBackup,
                count,
            } => {
                self.transition(WorkflowState::BackupInProgress { count });
                Ok(vec![Effect::StartBackup])
            }
            _ => Err(self.invalid("accept the backup")),
        }
    }

    /// Operator declined the backup; a second confirmation follows
    pub fn decline_backup(&mut self) -> Result<Vec<Effect>> {
        match self.state {
            WorkflowState::Confirming {
                step: ConfirmStep::OfferBackup,
                count,
            } => {
                self.transition(WorkflowState::Confirming {
                    step: ConfirmStep::ConfirmWithoutBackup,
                    count,
                });
                Ok(Vec::new())
            }
            _ => Err(self.invalid("decline the backup")),
        }
    }

    /// Operator reconfirmed deleting without a backup
    pub fn confirm_without_backup(&mut self, store: &CandidateStore) -> Result<Vec<Effect>> {
        match self.state {
            WorkflowState::Confirming {
                step: ConfirmStep::ConfirmWithoutBackup,
                ..
            } => Ok(self.enter_deleting(store)),
            _ => Err(self.invalid("delete without a backup")),
        }
    }

    /// Operator chose to delete even though the backup failed
    pub fn proceed_without_backup(&mut self, store: &CandidateStore) -> Result<Vec<Effect>> {
        match self.state {
            WorkflowState::BackupFailedPending { .. } => Ok(self.enter_deleting(store)),
            _ => Err(self.invalid("proceed without a backup")),
        }
    }

    /// Operator backed out at a confirmation step. No backend call happens.
    pub fn cancel(&mut self) -> Result<Vec<Effect>> {
        match self.state {
            WorkflowState::Confirming { .. } | WorkflowState::BackupFailedPending { .. } => {
                self.requested.clear();
                self.transition(WorkflowState::Idle);
                Ok(Vec::new())
            }
            _ => Err(self.invalid("cancel")),
        }
    }

    /// Answer the current prompt with yes or no
    pub fn answer(&mut self, yes: bool, store: &CandidateStore) -> Result<Vec<Effect>> {
        let step = match self.state {
            WorkflowState::Confirming { step, .. } => Some(step),
            _ => None,
        };

        match (self.phase(), step, yes) {
            (_, Some(ConfirmStep::OfferBackup), true) => self.accept_backup(),
            (_, Some(ConfirmStep::OfferBackup), false) => self.decline_backup(),
            (_, Some(ConfirmStep::ConfirmWithoutBackup), true) => {
                self.confirm_without_backup(store)
            }
            (WorkflowPhase::BackupFailedPending, _, true) => self.proceed_without_backup(store),
            (WorkflowPhase::Confirming | WorkflowPhase::BackupFailedPending, _, false) => {
                self.cancel()
            }
            _ => Err(self.invalid("answer a prompt")),
        }
    }

    /// Report the result of the backup call
    pub fn backup_finished(
        &mut self,
        result: Result<()>,
        store: &CandidateStore,
    ) -> Result<Vec<Effect>> {
        let count = match self.state {
            WorkflowState::BackupInProgress { count } => count,
            _ => return Err(self.invalid("finish a backup")),
        };

        match result {
            Ok(()) => {
                let mut effects = vec![Effect::Notify(Notice::BackupCreated)];
                effects.extend(self.enter_deleting(store));
                Ok(effects)
            }
            Err(e) => {
                let reason = e.into_backup().reason();
                warn!(%reason, "backup failed, waiting for operator decision");
                self.transition(WorkflowState::BackupFailedPending { reason, count });
                Ok(Vec::new())
            }
        }
    }

    /// Report the result of the delete call.
    ///
    /// Success removes the deleted candidates locally, clears the selection
    /// and asks for a refresh. Failure leaves both untouched.
    pub fn delete_finished(
        &mut self,
        result: Result<()>,
        store: &mut CandidateStore,
        selection: &mut SelectionSet,
    ) -> Result<Vec<Effect>> {
        if !matches!(self.state, WorkflowState::Deleting { .. }) {
            return Err(self.invalid("finish a deletion"));
        }

        let ids = std::mem::take(&mut self.in_flight);
        self.requested.clear();

        match result {
            Ok(()) => {
                let deleted = ids.len();
                store.remove_locally(&ids);
                selection.clear();
                self.transition(WorkflowState::Succeeded { deleted });
                Ok(vec![
                    Effect::Notify(Notice::Deleted { count: deleted }),
                    Effect::Refresh,
                ])
            }
            Err(e) => {
                let reason = e.into_delete().reason();
                warn!(%reason, count = ids.len(), "deletion failed");
                self.transition(WorkflowState::Failed {
                    reason: reason.clone(),
                });
                Ok(vec![Effect::Notify(Notice::DeleteFailed { reason })])
            }
        }
    }

    /// Return to idle after the outcome has been shown
    pub fn acknowledge(&mut self) {
        if self.state.is_terminal() {
            self.transition(WorkflowState::Idle);
        }
    }

    /// Fix the ids to delete: the requested ones still present in the store
    fn enter_deleting(&mut self, store: &CandidateStore) -> Vec<Effect> {
        let live = store.ids();
        let ids: BTreeSet<String> = self
            .requested
            .iter()
            .filter(|id| live.contains(id.as_str()))
            .cloned()
            .collect();

        if ids.is_empty() {
            self.requested.clear();
            self.transition(WorkflowState::Idle);
            return vec![Effect::Notify(Notice::NothingToDelete)];
        }

        self.in_flight = ids.clone();
        self.transition(WorkflowState::Deleting { count: ids.len() });
        vec![Effect::StartDelete(ids)]
    }

    /// Drive a complete deletion synchronously.
    ///
    /// Prompts go to `operator`, backend calls run one after another. The
    /// workflow is back in `Idle` when this returns; the returned phase is
    /// the outcome (`Idle` when nothing was deleted or the operator
    /// cancelled).
    pub fn run(
        &mut self,
        backend: &dyn Backend,
        operator: &mut dyn Operator,
        store: &mut CandidateStore,
        selection: &mut SelectionSet,
    ) -> Result<WorkflowPhase> {
        let mut queue: VecDeque<Effect> = self.request(selection, store)?.into();

        loop {
            while let Some(effect) = queue.pop_front() {
                match effect {
                    Effect::Notify(notice) => operator.notify(&notice),
                    Effect::StartBackup => {
                        let result = backend.create_backup();
                        queue.extend(self.backup_finished(result, store)?);
                    }
                    Effect::StartDelete(ids) => {
                        let result = backend.delete_entities(&ids);
                        queue.extend(self.delete_finished(result, store, selection)?);
                    }
                    Effect::Refresh => match store.refresh(backend) {
                        Ok(_) => {
                            selection.prune_stale(store.candidates());
                        }
                        Err(e) => operator.notify(&Notice::FetchFailed { reason: e.reason() }),
                    },
                }
            }

            match self.state.prompt() {
                Some(prompt) => {
                    let yes = operator.confirm(&prompt);
                    queue.extend(self.answer(yes, store)?);
                }
                None => break,
            }
        }

        let outcome = self.phase();
        self.acknowledge();
        Ok(outcome)
    }
}
