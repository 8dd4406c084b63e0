use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub(crate) const DEFAULT_MAX_TICKS: u32 = 600;

/// Headless host for Pawsess levels.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    pub(crate) verbose: bool,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Play a level for a fixed number of ticks, optionally driven by an
    /// input script.
    Run {
        level: PathBuf,
        #[arg(long)]
        script: Option<PathBuf>,
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        ticks: u32,
        /// Write the final level state here.
        #[arg(long)]
        save: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Progress file to record a win in. Defaults to the one under the
        /// resolved app root.
        #[arg(long)]
        progress: Option<PathBuf>,
    },
    /// Parse and check a level file without running it.
    Validate { level: PathBuf },
    /// Show or update the completed-levels file.
    Progress {
        #[arg(long)]
        complete: Option<u32>,
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// List level files and whether each is completed.
    Levels {
        #[arg(long)]
        dir: Option<PathBuf>,
        #[arg(long)]
        progress: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_defaults_tick_budget() {
        let cli = Cli::try_parse_from(["pawsess", "run", "level1.json"]).expect("parse");
        match cli.command {
            Command::Run {
                level,
                ticks,
                script,
                ..
            } => {
                assert_eq!(level, PathBuf::from("level1.json"));
                assert_eq!(ticks, DEFAULT_MAX_TICKS);
                assert!(script.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(!cli.verbose);
    }

    #[test]
    fn progress_accepts_completion_and_verbose_flag() {
        let cli = Cli::try_parse_from(["pawsess", "-v", "progress", "--complete", "3"])
            .expect("parse");
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Command::Progress {
                complete: Some(3),
                path: None
            }
        ));
    }
}
