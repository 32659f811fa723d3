use thiserror::Error;

use crate::workflow::WorkflowPhase;

#[derive(Error, Debug)]
pub enum BroomError {
    #[error("Failed to load candidates: {0}")]
    Fetch(String),

    #[error("Backup failed: {0}")]
    Backup(String),

    #[error("Delete failed: {0}")]
    Delete(String),

    #[error("A deletion is already in progress")]
    WorkflowBusy,

    #[error("Cannot {action} while {from}")]
    InvalidTransition {
        from: WorkflowPhase,
        action: &'static str,
    },

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BroomError {
    /// Re-tag an arbitrary error as a fetch failure, keeping its message
    pub fn into_fetch(self) -> Self {
        match self {
            BroomError::Fetch(_) => self,
            other => BroomError::Fetch(other.to_string()),
        }
    }

    /// Re-tag an arbitrary error as a backup failure, keeping its message
    pub fn into_backup(self) -> Self {
        match self {
            BroomError::Backup(_) => self,
            other => BroomError::Backup(other.to_string()),
        }
    }

    /// Re-tag an arbitrary error as a delete failure, keeping its message
    pub fn into_delete(self) -> Self {
        match self {
            BroomError::Delete(_) => self,
            other => BroomError::Delete(other.to_string()),
        }
    }

    /// The bare reason, without the taxonomy prefix
    pub fn reason(&self) -> String {
        match self {
            BroomError::Fetch(r) | BroomError::Backup(r) | BroomError::Delete(r) => r.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BroomError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retagging_keeps_message() {
        let io = BroomError::Io(std::io::Error::other("disk gone"));
        let err = io.into_backup();
        assert!(matches!(err, BroomError::Backup(_)));
        assert!(err.reason().contains("disk gone"));
        assert!(err.to_string().starts_with("Backup failed: "));

        let already = BroomError::Delete("nope".into()).into_delete();
        assert_eq!(already.reason(), "nope");

        let fetch = BroomError::WorkflowBusy.into_fetch();
        assert!(matches!(fetch, BroomError::Fetch(_)));
        assert_eq!(fetch.reason(), "A deletion is already in progress");
    }
}
