use anyhow::Context;
use clap::ArgAction;
use clap::CommandFactory;
use clap::Parser;
use seatbox_core::AddOutcome;
use seatbox_core::DEFAULT_COMMAND;
use seatbox_core::MACOS_PATH_TO_SEATBELT_EXECUTABLE;
use seatbox_core::SeatboxHome;
use seatbox_core::add_folder;
use seatbox_core::exit_code_from_status;
use seatbox_core::find_seatbox_home;
use seatbox_core::load_folders;
use seatbox_core::normalize_path;
use seatbox_core::run_command_under_seatbelt;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Lightweight macOS Seatbelt wrapper.
///
/// Confines a command's filesystem writes to the project directory,
/// a fixed set of tool-state/cache paths, and the configured extra
/// folders. Everything else stays readable but not writable.
#[derive(Debug, Parser)]
#[clap(
    bin_name = "seatbox",
    version,
    disable_version_flag = true,
    after_help = "Examples:\n  seatbox run copilot\n  seatbox run --project ~/Projects/myapp copilot\n  seatbox add folder ~/Projects"
)]
struct SeatboxCli {
    /// Print version.
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,

    #[clap(subcommand)]
    subcommand: Option<Subcommand>,
}

#[derive(Debug, clap::Subcommand)]
enum Subcommand {
    /// Run a command confined by the compiled write policy.
    Run(RunCommand),

    /// Record an additional writable location.
    Add(AddCommand),

    /// Show configured additional writable locations.
    List(ListCommand),
}

#[derive(Debug, Parser)]
struct RunCommand {
    /// Directory granted full write access for this run. Defaults to
    /// the current working directory.
    #[arg(long = "project", value_name = "DIR")]
    project: Option<String>,

    /// Command to run under confinement. Defaults to `copilot`.
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

#[derive(Debug, Parser)]
struct AddCommand {
    #[command(subcommand)]
    target: AddTarget,
}

#[derive(Debug, clap::Subcommand)]
enum AddTarget {
    /// Allow writes under a folder in every future run. The folder
    /// must already exist.
    Folder {
        #[arg(value_name = "DIR")]
        dir: String,
    },
}

#[derive(Debug, Parser)]
struct ListCommand {
    #[command(subcommand)]
    target: ListTarget,
}

#[derive(Debug, clap::Subcommand)]
enum ListTarget {
    /// Print the extra writable folders, one per line.
    Folders,
}

fn main() -> anyhow::Result<()> {
    let cli = match SeatboxCli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version go to stdout and exit 0; everything
            // else is a usage error.
            let exit_code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            std::process::exit(exit_code);
        }
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("error"))
        .unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let Some(subcommand) = cli.subcommand else {
        let _ = SeatboxCli::command().print_help();
        return Ok(());
    };

    let home = find_seatbox_home().context("resolve seatbox config directory")?;
    match subcommand {
        Subcommand::Run(run_command) => run_main(&home, run_command),
        Subcommand::Add(add_command) => add_main(&home, add_command),
        Subcommand::List(list_command) => list_main(&home, list_command),
    }
}

fn run_main(home: &SeatboxHome, run_command: RunCommand) -> anyhow::Result<()> {
    let project_dir = resolve_project_dir(run_command.project.as_deref())
        .context("resolve project directory")?;
    let command = effective_command(run_command.command);
    let status = run_command_under_seatbelt(home, &project_dir, &command)
        .with_context(|| format!("launch {MACOS_PATH_TO_SEATBELT_EXECUTABLE}"))?;
    std::process::exit(exit_code_from_status(status));
}

fn resolve_project_dir(project: Option<&str>) -> std::io::Result<PathBuf> {
    match project {
        Some(dir) => normalize_path(dir),
        None => std::env::current_dir(),
    }
}

fn effective_command(command: Vec<String>) -> Vec<String> {
    if command.is_empty() {
        vec![DEFAULT_COMMAND.to_string()]
    } else {
        command
    }
}

fn add_main(home: &SeatboxHome, add_command: AddCommand) -> anyhow::Result<()> {
    let AddTarget::Folder { dir } = add_command.target;
    let dir = normalize_path(&dir).context("resolve folder path")?;
    if !dir.is_dir() {
        eprintln!("Folder does not exist: {}", dir.display());
        std::process::exit(1);
    }
    match add_folder(home, &dir)? {
        AddOutcome::Added => println!("Added allowed folder: {}", dir.display()),
        AddOutcome::AlreadyAllowed => println!("Already allowed: {}", dir.display()),
    }
    Ok(())
}

fn list_main(home: &SeatboxHome, list_command: ListCommand) -> anyhow::Result<()> {
    let ListTarget::Folders = list_command.target;
    let folders = load_folders(home)?;
    println!("Configured extra writable folders:");
    if folders.is_empty() {
        println!("(none)");
    } else {
        for folder in folders {
            println!("{}", folder.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_run_command_falls_back_to_default_tool() {
        assert_eq!(effective_command(Vec::new()), vec!["copilot".to_string()]);
    }

    #[test]
    fn explicit_run_command_is_forwarded_untouched() {
        let command = vec!["make".to_string(), "-j4".to_string()];
        assert_eq!(effective_command(command.clone()), command);
    }

    #[test]
    fn project_defaults_to_current_directory() {
        let resolved = resolve_project_dir(None).expect("resolve");
        assert_eq!(resolved, std::env::current_dir().expect("cwd"));
    }

    #[test]
    fn run_parses_project_flag_and_trailing_command() {
        let cli = SeatboxCli::try_parse_from([
            "seatbox", "run", "--project", "/srv/proj", "make", "check",
        ])
        .expect("parse");
        let Some(Subcommand::Run(run_command)) = cli.subcommand else {
            panic!("expected run subcommand");
        };
        assert_eq!(run_command.project.as_deref(), Some("/srv/proj"));
        assert_eq!(
            run_command.command,
            vec!["make".to_string(), "check".to_string()]
        );
    }

    #[test]
    fn add_requires_folder_target_and_dir() {
        assert!(SeatboxCli::try_parse_from(["seatbox", "add", "folder"]).is_err());
        assert!(SeatboxCli::try_parse_from(["seatbox", "add"]).is_err());
        let cli = SeatboxCli::try_parse_from(["seatbox", "add", "folder", "/srv/data"])
            .expect("parse");
        assert!(matches!(
            cli.subcommand,
            Some(Subcommand::Add(AddCommand {
                target: AddTarget::Folder { .. }
            }))
        ));
    }

    #[test]
    fn list_requires_folders_target() {
        assert!(SeatboxCli::try_parse_from(["seatbox", "list"]).is_err());
        assert!(SeatboxCli::try_parse_from(["seatbox", "list", "folders"]).is_ok());
    }

    #[test]
    fn unknown_subcommand_is_a_usage_error() {
        let err = SeatboxCli::try_parse_from(["seatbox", "frobnicate"]).expect_err("should fail");
        assert!(err.use_stderr());
    }

    #[test]
    fn short_version_flag_is_accepted() {
        let err = SeatboxCli::try_parse_from(["seatbox", "-v"]).expect_err("version exits parse");
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
        assert!(!err.use_stderr());
    }
}
