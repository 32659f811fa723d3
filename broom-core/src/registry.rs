//! File-backed [`Backend`] over a JSON entity registry snapshot.
//!
//! Registry format:
//! ```json
//! { "entities": [
//!     { "entity_id": "sensor.kitchen", "name": "Kitchen", "platform": "zha",
//!       "state": "unavailable", "last_changed": "2024-05-01T10:00:00Z" }
//! ] }
//! ```
//! An entry without `state` has no live state object and counts as orphaned.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::{Backend, BackupInfo};
use crate::candidate::{Candidate, Status, UNKNOWN_DURATION};
use crate::error::{BroomError, Result};

/// File name prefix of backups created by the deletion workflow
pub const AUTO_BACKUP_PREFIX: &str = "broom-auto-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    pub platform: String,
    #[serde(default)]
    pub disabled: bool,
    /// Live state; `None` when the entity has no state object at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_changed: Option<DateTime<Utc>>,
}

impl RegistryEntry {
    fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.original_name.as_deref())
            .unwrap_or(&self.entity_id)
    }

    /// Turn an entry into a candidate if it qualifies at `threshold_days`
    pub fn classify(&self, now: DateTime<Utc>, threshold_days: u32) -> Option<Candidate> {
        if self.disabled {
            return None;
        }

        let (status, days) = match self.state.as_deref() {
            None => (Status::orphaned(), UNKNOWN_DURATION),
            Some(state @ ("unavailable" | "unknown")) => match self.last_changed {
                Some(changed) => {
                    let days = (now - changed).num_days().clamp(0, u32::MAX as i64) as u32;
                    if days < threshold_days {
                        return None;
                    }
                    (Status::new(state), days)
                }
                None => (Status::new(state), UNKNOWN_DURATION),
            },
            Some(_) => return None,
        };

        Some(Candidate::new(
            self.entity_id.clone(),
            self.display_name(),
            self.platform.clone(),
            status,
            days,
        ))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryFile {
    #[serde(default)]
    pub entities: Vec<RegistryEntry>,
}

/// Read and parse a registry file
pub fn load_registry(path: &Path) -> Result<RegistryFile> {
    let data = fs::read(path)?;
    serde_json::from_slice(&data)
        .map_err(|e| BroomError::Registry(format!("{}: {}", path.display(), e)))
}

/// Write a registry file atomically (temp file, then rename)
pub fn save_registry(path: &Path, registry: &RegistryFile) -> Result<()> {
    let data = serde_json::to_vec_pretty(registry)?;
    write_atomic(path, &data)
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp_path, path)?;
    Ok(())
}

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Backend working directly on a registry snapshot file
pub struct RegistryBackend {
    path: PathBuf,
    backup_dir: PathBuf,
    clock: Clock,
    /// Serializes read-modify-write cycles across worker threads
    io_lock: Mutex<()>,
}

impl RegistryBackend {
    pub fn new(path: PathBuf, backup_dir: PathBuf) -> Self {
        Self {
            path,
            backup_dir,
            clock: Box::new(Utc::now),
            io_lock: Mutex::new(()),
        }
    }

    /// Replace the time source used for day counts and backup names
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        // A poisoned lock only means another worker panicked mid-call;
        // the file itself is always replaced atomically.
        self.io_lock.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Backend for RegistryBackend {
    fn list_candidates(&self, threshold_days: u32) -> Result<Vec<Candidate>> {
        let _guard = self.lock();
        let registry = load_registry(&self.path).map_err(BroomError::into_fetch)?;
        let now = (self.clock)();

        let mut candidates: Vec<Candidate> = registry
            .entities
            .iter()
            .filter_map(|e| e.classify(now, threshold_days))
            .collect();
        candidates.sort_by(|a, b| b.days_unavailable.cmp(&a.days_unavailable));

        debug!(
            entities = registry.entities.len(),
            candidates = candidates.len(),
            threshold_days,
            "listed candidates"
        );
        Ok(candidates)
    }

    fn create_backup(&self) -> Result<()> {
        let _guard = self.lock();
        let data = fs::read(&self.path).map_err(|e| BroomError::Backup(e.to_string()))?;
        let stamp = (self.clock)().format("%Y%m%dT%H%M%S%.3fZ");
        let target = self
            .backup_dir
            .join(format!("{}{}.json", AUTO_BACKUP_PREFIX, stamp));

        write_atomic(&target, &data).map_err(BroomError::into_backup)?;
        info!(path = %target.display(), "backup created");
        Ok(())
    }

    fn delete_entities(&self, ids: &BTreeSet<String>) -> Result<()> {
        let _guard = self.lock();
        let mut registry = load_registry(&self.path).map_err(BroomError::into_delete)?;

        let registered: BTreeSet<&str> = registry
            .entities
            .iter()
            .map(|e| e.entity_id.as_str())
            .collect();
        let missing: Vec<&str> = ids
            .iter()
            .map(String::as_str)
            .filter(|id| !registered.contains(id))
            .collect();
        if !missing.is_empty() {
            warn!(?missing, "refusing deletion of unregistered entities");
            return Err(BroomError::Delete(format!(
                "not found in registry: {}",
                missing.join(", ")
            )));
        }

        let before = registry.entities.len();
        registry.entities.retain(|e| !ids.contains(&e.entity_id));
        save_registry(&self.path, &registry).map_err(BroomError::into_delete)?;

        info!(removed = before - registry.entities.len(), "entities removed from registry");
        Ok(())
    }

    fn backup_info(&self) -> Result<BackupInfo> {
        let mut info = BackupInfo::default();
        let entries = match fs::read_dir(&self.backup_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(info),
            Err(e) => return Err(e.into()),
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
                continue;
            };
            let when = DateTime::<Utc>::from(modified);
            let is_auto = entry
                .file_name()
                .to_string_lossy()
                .starts_with(AUTO_BACKUP_PREFIX);
            let slot = if is_auto {
                &mut info.last_auto
            } else {
                &mut info.last_manual
            };
            if slot.is_none_or(|prev| when > prev) {
                *slot = Some(when);
            }
        }

        Ok(info)
    }
}
