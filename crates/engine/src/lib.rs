use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod content;
pub mod input;
pub mod sim;

pub use content::{
    deserialize_json, discover_levels, level_from_json, load_level, record_level_completion, save_level,
    CompletedLevels, LevelDefinition, LevelError, LevelFile, ProgressError,
};
pub use input::{
    Camera2D, GestureClassifier, GestureConfig, GestureFrame, IntentCollector, IntentSnapshot,
    KeyAction, TouchEvent, TouchPhase, Viewport,
};
pub use sim::{
    AudioSink, EntityId, Facing, FrameEvent, FrameEvents, LevelSession, LevelStatus,
    PossessionState, SilentAudio, SimConfig, SoundCue, Vec2,
};

pub const ROOT_ENV_VAR: &str = "PAWSESS_ROOT";
pub const PROGRESS_FILE_NAME: &str = "progress.json";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub levels_dir: PathBuf,
    pub saves_dir: PathBuf,
    pub progress_path: PathBuf,
}

impl AppPaths {
    /// Layout under an explicit root, without touching the filesystem.
    pub fn under(root: PathBuf) -> Self {
        let saves_dir = root.join("saves");
        Self {
            levels_dir: root.join("assets").join("levels"),
            progress_path: saves_dir.join(PROGRESS_FILE_NAME),
            saves_dir,
            root,
        }
    }

    pub fn save_path_for(&self, level: u32) -> PathBuf {
        self.saves_dir.join(format!("level{level}.save.json"))
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("failed to create saves directory at {path}: {source}")]
    CreateSavesDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "PAWSESS_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/pawsess\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let paths = AppPaths::under(resolve_root()?);

    fs::create_dir_all(&paths.saves_dir).map_err(|source| StartupError::CreateSavesDir {
        path: paths.saves_dir.clone(),
        source,
    })?;

    Ok(paths)
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            for candidate in exe_dir.ancestors() {
                if is_repo_marker(candidate) {
                    return Ok(normalize_path(candidate));
                }
            }

            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
