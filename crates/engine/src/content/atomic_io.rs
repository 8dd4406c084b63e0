use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Writes `text` next to `path` first and renames it into place, so a crash
/// mid-write never leaves a truncated save or progress file behind.
pub(crate) fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let staging = staging_path_for(path);
    fs::write(&staging, text.as_bytes())?;
    if let Err(error) = swap_into_place(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(error);
    }
    Ok(())
}

fn swap_into_place(staging: &Path, destination: &Path) -> io::Result<()> {
    match fs::remove_file(destination) {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => return Err(error),
    }
    fs::rename(staging, destination)
}

fn staging_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("pawsess.json");
    path.with_file_name(format!("{file_name}.tmp"))
}
