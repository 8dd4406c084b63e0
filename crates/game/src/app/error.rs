use std::io;
use std::path::PathBuf;

use engine::{deserialize_json, LevelError, ProgressError, StartupError};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum HostError {
    #[error("failed to read {what} '{path}': {source}")]
    Read {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse {what} json{location}: {message}")]
    Parse {
        what: &'static str,
        location: String,
        message: String,
    },
    #[error("invalid {what}: {message}")]
    Invalid { what: &'static str, message: String },
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Startup(#[from] StartupError),
}

pub(crate) fn read_text(what: &'static str, path: &std::path::Path) -> Result<String, HostError> {
    std::fs::read_to_string(path).map_err(|source| HostError::Read {
        what,
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn parse_json<T: DeserializeOwned>(what: &'static str, raw: &str) -> Result<T, HostError> {
    deserialize_json(raw).map_err(|failure| HostError::Parse {
        what,
        location: failure.location,
        message: failure.message,
    })
}
