use std::path::{Path, PathBuf};

use engine::{
    discover_levels, load_level, record_level_completion, resolve_app_paths, save_level,
    CompletedLevels, LevelSession, LevelStatus,
};
use tracing::{info, warn};

use super::bootstrap::load_host_config;
use super::error::HostError;
use super::loop_runner::{run_session, RunOptions, RunReport};
use super::script::InputScript;

#[derive(Debug, Clone)]
pub(crate) struct RunArgs {
    pub(crate) level: PathBuf,
    pub(crate) script: Option<PathBuf>,
    pub(crate) max_ticks: u32,
    pub(crate) save: Option<PathBuf>,
    pub(crate) config: Option<PathBuf>,
    pub(crate) progress: Option<PathBuf>,
}

pub(crate) fn run_command(args: &RunArgs) -> Result<RunReport, HostError> {
    let host = load_host_config(args.config.as_deref())?;
    let definition = load_level(&args.level)?;
    let level_index = definition.level;
    let mut session = LevelSession::from_definition(definition, host.sim.clone());
    let script = args
        .script
        .as_deref()
        .map(InputScript::load)
        .transpose()?;

    let options = RunOptions {
        max_ticks: args.max_ticks,
        host,
    };
    let report = run_session(&mut session, script, &options);
    info!(
        level = level_index,
        ticks = report.ticks,
        status = ?report.status,
        state = report.state,
        moved = report.totals.moved,
        dropped_intents = report.totals.dropped_intents,
        sounds = report.sounds.len(),
        "run_finished"
    );

    if report.status == LevelStatus::Won {
        match progress_path(args.progress.as_deref()) {
            Some(path) => {
                record_level_completion(&path, level_index)?;
            }
            None => warn!(level = level_index, "progress_not_recorded"),
        }
    }
    if let Some(save) = &args.save {
        save_level(save, &session.to_definition())?;
    }
    Ok(report)
}

pub(crate) fn describe_report(report: &RunReport) -> String {
    format!(
        "{:?} after {} ticks (state {}, {} moves, {} dropped intents, {} sounds)",
        report.status,
        report.ticks,
        report.state,
        report.totals.moved,
        report.totals.dropped_intents,
        report.sounds.len()
    )
}

pub(crate) fn validate_command(level: &Path) -> Result<String, HostError> {
    let def = load_level(level)?;
    Ok(format!(
        "level{}: {} floors, {} enemies, {} doors, {} passages, {} caged animals, {} charges",
        def.level,
        def.floor,
        def.enemy.len(),
        def.door.len(),
        def.staircase_door.len(),
        def.decorations.len(),
        def.player.num_possessions
    ))
}

pub(crate) fn progress_command(
    complete: Option<u32>,
    path: Option<&Path>,
) -> Result<Vec<String>, HostError> {
    let path = required_progress_path(path)?;
    let progress = match complete {
        Some(level) => record_level_completion(&path, level)?,
        None => CompletedLevels::load(&path)?,
    };
    let mut lines: Vec<String> = progress
        .iter()
        .map(|(key, done)| format!("{key}: {}", if done { "completed" } else { "open" }))
        .collect();
    lines.push(format!("{} completed", progress.completed_count()));
    Ok(lines)
}

pub(crate) fn levels_command(
    dir: Option<&Path>,
    progress: Option<&Path>,
) -> Result<Vec<String>, HostError> {
    let (dir, progress_path) = match (dir, progress) {
        (Some(dir), Some(progress)) => (dir.to_path_buf(), progress.to_path_buf()),
        _ => {
            let paths = resolve_app_paths()?;
            (
                dir.map(Path::to_path_buf).unwrap_or(paths.levels_dir),
                progress
                    .map(Path::to_path_buf)
                    .unwrap_or(paths.progress_path),
            )
        }
    };
    let progress = CompletedLevels::load(&progress_path)?;
    let levels = discover_levels(&dir)?;
    info!(dir = %dir.display(), count = levels.len(), "levels_listed");
    Ok(levels
        .iter()
        .map(|file| {
            let mark = if progress.is_completed(file.index) {
                "x"
            } else {
                " "
            };
            format!("[{mark}] level{} {}", file.index, file.path.display())
        })
        .collect())
}

/// Explicit path, or the default under the app root. A root that cannot
/// be resolved only costs the progress entry.
fn progress_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    match resolve_app_paths() {
        Ok(paths) => Some(paths.progress_path),
        Err(err) => {
            warn!(error = %err, "app_root_unresolved");
            None
        }
    }
}

fn required_progress_path(explicit: Option<&Path>) -> Result<PathBuf, HostError> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(resolve_app_paths()?.progress_path),
    }
}
