use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::level::LevelError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelFile {
    pub index: u32,
    pub path: PathBuf,
}

/// Parses `level<N>.json` into `N`.
pub fn level_index_from_file_name(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix("level")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

/// Lists `level<N>.json` files in `dir`, ordered by `N`. Other files are
/// skipped.
pub fn discover_levels(dir: &Path) -> Result<Vec<LevelFile>, LevelError> {
    let read_err = |source: std::io::Error| LevelError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut levels = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(index) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(level_index_from_file_name)
        else {
            debug!(path = %path.display(), "level_discovery_skipped_file");
            continue;
        };
        levels.push(LevelFile { index, path });
    }
    levels.sort_by_key(|level| level.index);
    Ok(levels)
}
