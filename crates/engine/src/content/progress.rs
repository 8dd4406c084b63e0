use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use super::atomic_io::write_text_atomic;
use super::json::deserialize_json;

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("failed to read progress '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write progress '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse progress json{location}: {message}")]
    Parse { location: String, message: String },
    #[error("encode progress json: {0}")]
    Encode(#[source] serde_json::Error),
}

pub fn level_key(level: u32) -> String {
    format!("level{level}")
}

/// Flat `level<N> -> bool` map. Every update rewrites the whole file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedLevels {
    levels: BTreeMap<String, bool>,
}

impl CompletedLevels {
    pub fn from_json(raw: &str) -> Result<Self, ProgressError> {
        let levels = deserialize_json::<BTreeMap<String, bool>>(raw).map_err(|failure| {
            ProgressError::Parse {
                location: failure.location,
                message: failure.message,
            }
        })?;
        Ok(Self { levels })
    }

    pub fn to_json(&self) -> Result<String, ProgressError> {
        serde_json::to_string_pretty(&self.levels).map_err(ProgressError::Encode)
    }

    /// A missing file means nothing has been completed yet.
    pub fn load(path: &Path) -> Result<Self, ProgressError> {
        match fs::read_to_string(path) {
            Ok(raw) => Self::from_json(&raw),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "progress_file_missing");
                Ok(Self::default())
            }
            Err(source) => Err(ProgressError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ProgressError> {
        let json = self.to_json()?;
        write_text_atomic(path, &json).map_err(|source| ProgressError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn is_completed(&self, level: u32) -> bool {
        self.levels.get(&level_key(level)).copied().unwrap_or(false)
    }

    /// Returns true when the entry changed.
    pub fn mark_completed(&mut self, level: u32) -> bool {
        let previous = self.levels.insert(level_key(level), true);
        previous != Some(true)
    }

    pub fn completed_count(&self) -> usize {
        self.levels.values().filter(|done| **done).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.levels.iter().map(|(key, done)| (key.as_str(), *done))
    }
}

/// Load, mark, rewrite.
pub fn record_level_completion(path: &Path, level: u32) -> Result<CompletedLevels, ProgressError> {
    let mut progress = CompletedLevels::load(path)?;
    let changed = progress.mark_completed(level);
    progress.save(path)?;
    info!(
        path = %path.display(),
        level,
        changed,
        completed = progress.completed_count(),
        "level_completion_recorded"
    );
    Ok(progress)
}
