//! Loading the streaming-history export.

use std::path::{Path, PathBuf};

use cadenza_core::StreamEvent;
use walkdir::WalkDir;

use crate::error::{PipelineError, PipelineResult};

/// Parse one history file: a JSON array of stream-event records.
pub fn load_file(path: &Path) -> PipelineResult<Vec<StreamEvent>> {
    let contents = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;

    serde_json::from_str(&contents).map_err(|source| PipelineError::Format {
        path: path.to_path_buf(),
        source,
    })
}

/// History files directly inside `dir`, sorted by file name.
///
/// Hidden files are skipped, as are subdirectories.
pub fn history_files(dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            PipelineError::io(path, e.into())
        })?;

        if !entry.file_type().is_file() || is_hidden(entry.path()) {
            continue;
        }
        files.push(entry.into_path());
    }

    Ok(files)
}

/// Load every history file in `dir`, in file-name order, into one sequence.
///
/// No deduplication happens here; the same event in two files appears twice.
pub fn concatenate_all(dir: &Path) -> PipelineResult<Vec<StreamEvent>> {
    let files = history_files(dir)?;
    let mut events = Vec::new();

    for path in &files {
        let loaded = load_file(path)?;
        log::debug!("Loaded {} events from {}", loaded.len(), path.display());
        events.extend(loaded);
    }

    log::info!(
        "Loaded {} stream events from {} files in {}",
        events.len(),
        files.len(),
        dir.display()
    );
    Ok(events)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}
