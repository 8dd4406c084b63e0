mod bootstrap;
mod cli;
mod commands;
mod error;
mod loop_runner;
mod script;

pub(crate) use bootstrap::init_tracing;
pub(crate) use cli::{Cli, Command};
pub(crate) use error::HostError;

use commands::{
    describe_report, levels_command, progress_command, run_command, validate_command, RunArgs,
};

pub(crate) fn dispatch(command: Command) -> Result<(), HostError> {
    match command {
        Command::Run {
            level,
            script,
            ticks,
            save,
            config,
            progress,
        } => {
            let report = run_command(&RunArgs {
                level,
                script,
                max_ticks: ticks,
                save,
                config,
                progress,
            })?;
            println!("{}", describe_report(&report));
        }
        Command::Validate { level } => println!("{}", validate_command(&level)?),
        Command::Progress { complete, path } => {
            for line in progress_command(complete, path.as_deref())? {
                println!("{line}");
            }
        }
        Command::Levels { dir, progress } => {
            for line in levels_command(dir.as_deref(), progress.as_deref())? {
                println!("{line}");
            }
        }
    }
    Ok(())
}
