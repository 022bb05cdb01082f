//! Run output artifact.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PipewrightError, Result};
use crate::runner::state::RunState;

/// Default directory for run output files, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "data";

/// File name of the artifact for a run.
pub fn output_file_name(run_id: &str) -> String {
    format!("run_output_{}.json", run_id)
}

/// Write the final run state as pretty JSON to `dir/run_output_<run_id>.json`.
///
/// The directory is created if needed. The file is written to a temporary
/// path first and renamed into place.
pub fn save_run_output(state: &RunState, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(output_file_name(&state.run_id));

    let content = serde_json::to_string_pretty(state).map_err(|e| {
        PipewrightError::Other(anyhow::anyhow!("Failed to serialize run output: {}", e))
    })?;

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, &path)?;

    tracing::info!(path = %path.display(), "Results saved");
    Ok(path)
}
