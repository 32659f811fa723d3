pub mod backend;
pub mod candidate;
pub mod config;
pub mod error;
pub mod format;
pub mod registry;
pub mod selection;
pub mod snapshot;
pub mod store;
pub mod view;
pub mod workflow;

pub use backend::{Backend, BackupInfo, Operator};
pub use candidate::{Candidate, Status, UNKNOWN_DURATION, UNKNOWN_DURATION_THRESHOLD};
pub use config::Config;
pub use error::{BroomError, Result};
pub use format::{format_backup_time, format_count, format_days, pluralize_entities};
pub use registry::RegistryBackend;
pub use selection::SelectionSet;
pub use snapshot::PanelSnapshot;
pub use store::{CandidateStore, RefreshOutcome, RefreshTicket};
pub use view::{SortDirection, SortField, SortState, StatusFilter, derive, visible_ids};
pub use workflow::{
    ConfirmStep, DeletionWorkflow, Effect, Notice, Prompt, WorkflowPhase, WorkflowState,
};
