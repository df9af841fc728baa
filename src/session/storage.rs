use super::answers::Answers;
use crate::decoder::{ModelInfo, SerialInfo};
use crate::error::StorageError;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// The fixed key a session is persisted under.
pub const SESSION_KEY: &str = "diagflow.session";

/// One step of undo history: the node that was left, the draft input in flight
/// and the routing value that was current when the node was entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub node_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Everything needed to resume a session after a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<String>,
    pub current_node_id: String,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub answers: Answers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_info: Option<ModelInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_info: Option<SerialInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_value: Option<String>,
}

/// A durable key-value slot for the active session.
///
/// Sessions call `save` after every mutation and `clear` on reset. Failures are
/// logged by the session and never block a transition.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<SessionSnapshot>, StorageError>;
    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

/// Discards everything. The default when no store is injected.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

impl SessionStore for NullStore {
    fn load(&self) -> Result<Option<SessionSnapshot>, StorageError> {
        Ok(None)
    }

    fn save(&self, _snapshot: &SessionSnapshot) -> Result<(), StorageError> {
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Keeps serialized snapshots in memory, keyed like a browser's local storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<AHashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw JSON currently stored under the session key.
    pub fn raw(&self) -> Option<String> {
        self.records
            .lock()
            .ok()
            .and_then(|records| records.get(SESSION_KEY).cloned())
    }

    fn records(&self) -> Result<std::sync::MutexGuard<'_, AHashMap<String, String>>, StorageError> {
        self.records
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Result<Option<SessionSnapshot>, StorageError> {
        match self.records()?.get(SESSION_KEY) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), StorageError> {
        let json = serde_json::to_string(snapshot)?;
        self.records()?.insert(SESSION_KEY.to_string(), json);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.records()?.remove(SESSION_KEY);
        Ok(())
    }
}

/// Persists the snapshot as `<dir>/diagflow.session.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", SESSION_KEY)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileStore {
    fn load(&self) -> Result<Option<SessionSnapshot>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Readers only ever see a complete file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(snapshot)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
