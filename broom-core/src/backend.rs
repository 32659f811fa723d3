use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::Result;
use crate::candidate::Candidate;
use crate::workflow::{Notice, Prompt};

/// Most recent backups known to the backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupInfo {
    /// Newest backup created by the deletion workflow
    pub last_auto: Option<DateTime<Utc>>,
    /// Newest backup created by any other means
    pub last_manual: Option<DateTime<Utc>>,
}

/// Source of candidates and executor of backups and deletions.
///
/// Every call must eventually resolve with success or failure. The
/// deletion workflow has no timeout of its own: a call that never
/// returns leaves it in its pending state.
///
/// Implementations report failures with the matching error kind:
/// `BroomError::Fetch`, `BroomError::Backup` or `BroomError::Delete`.
pub trait Backend: Send + Sync {
    /// List candidates inactive for at least `threshold_days`
    fn list_candidates(&self, threshold_days: u32) -> Result<Vec<Candidate>>;

    /// Create a full backup before a destructive operation
    fn create_backup(&self) -> Result<()>;

    /// Remove the given entities. Either all of them are removed or none.
    fn delete_entities(&self, ids: &BTreeSet<String>) -> Result<()>;

    /// Timestamps of the newest known backups
    fn backup_info(&self) -> Result<BackupInfo> {
        Ok(BackupInfo::default())
    }
}

/// The human in the loop: answers yes/no prompts and receives notices
pub trait Operator {
    fn confirm(&mut self, prompt: &Prompt) -> bool;

    fn notify(&mut self, notice: &Notice);
}
