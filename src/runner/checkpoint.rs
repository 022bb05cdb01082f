//! Checkpoint stores.
//!
//! The executor writes the run state after every step so an interrupted run
//! can be resumed. Stores only promise that a state put under a run id comes
//! back from `get` with the same shape; the blob format is theirs to pick.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{PipewrightError, Result};
use crate::runner::state::RunState;

/// Keyed persistence for run state.
pub trait CheckpointStore: Send + Sync {
    /// Store the state under `run_id`, replacing any earlier checkpoint.
    fn put(&self, run_id: &str, state: &RunState) -> Result<()>;

    /// Load the state stored under `run_id`, if any.
    fn get(&self, run_id: &str) -> Result<Option<RunState>>;
}

fn encode(run_id: &str, state: &RunState) -> Result<String> {
    serde_json::to_string_pretty(state).map_err(|e| PipewrightError::CheckpointError {
        run_id: run_id.to_string(),
        message: format!("Failed to serialize state: {}", e),
    })
}

fn decode(run_id: &str, blob: &str) -> Result<RunState> {
    serde_json::from_str(blob).map_err(|e| PipewrightError::CheckpointError {
        run_id: run_id.to_string(),
        message: format!("Failed to read checkpoint: {}", e),
    })
}

/// In-process store. Checkpoints live as long as the store.
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned(run_id: &str) -> PipewrightError {
        PipewrightError::CheckpointError {
            run_id: run_id.to_string(),
            message: "checkpoint store lock poisoned".to_string(),
        }
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn put(&self, run_id: &str, state: &RunState) -> Result<()> {
        let blob = encode(run_id, state)?;
        self.blobs
            .lock()
            .map_err(|_| Self::poisoned(run_id))?
            .insert(run_id.to_string(), blob);
        Ok(())
    }

    fn get(&self, run_id: &str) -> Result<Option<RunState>> {
        let blobs = self.blobs.lock().map_err(|_| Self::poisoned(run_id))?;
        blobs.get(run_id).map(|blob| decode(run_id, blob)).transpose()
    }
}

/// One JSON file per run id in a directory.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the checkpoint file for a run id.
    pub fn path_for(&self, run_id: &str) -> Result<PathBuf> {
        let valid = !run_id.is_empty()
            && run_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(PipewrightError::CheckpointError {
                run_id: run_id.to_string(),
                message: "run id may only contain letters, digits, '_' and '-'".to_string(),
            });
        }
        Ok(self.dir.join(format!("{}.json", run_id)))
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn put(&self, run_id: &str, state: &RunState) -> Result<()> {
        let path = self.path_for(run_id)?;
        fs::create_dir_all(&self.dir)?;
        let content = encode(run_id, state)?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }

    fn get(&self, run_id: &str) -> Result<Option<RunState>> {
        let path = self.path_for(run_id)?;
        match fs::read_to_string(&path) {
            Ok(blob) => decode(run_id, &blob).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PipewrightError::Io(e)),
        }
    }
}
