//! The command line interface for ptxsim.
use crate::input::{load_project, validate_project};
use crate::log;
use crate::output::metadata::write_metadata;
use crate::output::{create_output_directory, get_output_dir};
use crate::settings::Settings;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod example;
use example::ExampleSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for ptxsim.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The command to run. Prints help if missing.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Print the command-line reference as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Flags shared by `run` and `example run`
#[derive(Args, Default)]
pub struct RunOpts {
    /// Write results here instead of `ptxsim_results/<project name>`
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Replace the contents of the output folder if it is not empty
    #[arg(long)]
    pub overwrite: bool,
    /// Also write the commodity and component state after every step
    #[arg(long)]
    pub debug_model: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every episode of a project.
    Run {
        /// The project directory.
        project_dir: PathBuf,
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Work with the bundled demo projects.
    Example {
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Check that a project loads without running it.
    Validate {
        /// The project directory.
        project_dir: PathBuf,
    },
    /// Show or edit the program settings file.
    Settings {
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Run the command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { project_dir, opts } => handle_run_command(&project_dir, &opts, None),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Validate { project_dir } => handle_validate_command(&project_dir, None),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse the command line and run the requested command
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    match cli.command {
        Some(command) => command.execute(),
        None => {
            println!("{}", Cli::command().render_long_help());
            Ok(())
        }
    }
}

/// The given settings, or those from the settings file
fn settings_or_load(settings: Option<Settings>) -> Result<Settings> {
    settings.map_or_else(|| Settings::load().context("Failed to load settings."), Ok)
}

impl RunOpts {
    /// Command-line flags switch settings on but never off
    fn apply_to(&self, settings: &mut Settings) {
        settings.debug_model |= self.debug_model;
        settings.overwrite |= self.overwrite;
    }
}

/// Run every episode of the project at `project_path`, writing results and logs to the output
/// folder.
pub fn handle_run_command(
    project_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let mut settings = settings_or_load(settings)?;
    opts.apply_to(&mut settings);

    let output_path = match &opts.output_dir {
        Some(output_dir) => output_dir.clone(),
        None => get_output_dir(project_path)?,
    };
    let overwritten = create_output_directory(&output_path, settings.overwrite)
        .with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    log::init(Some(settings.log_level.as_str()), Some(output_path.as_path()))
        .context("Failed to initialise logging.")?;
    if overwritten {
        warn!("Output folder will be overwritten");
    }

    let project = load_project(project_path).context("Failed to load project.")?;
    info!(
        "Loaded project {} from {}",
        project.parameters.name,
        project_path.display()
    );
    info!("Output folder: {}", output_path.display());
    write_metadata(&output_path, project_path, &project).context("Failed to save metadata.")?;

    crate::simulation::run(&project, &output_path, settings.debug_model)?;
    info!("Run complete!");

    Ok(())
}

/// Load and check the project at `project_path` without running it. No log files are written.
pub fn handle_validate_command(project_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = settings_or_load(settings)?;
    log::init(Some(settings.log_level.as_str()), None).context("Failed to initialise logging.")?;

    validate_project(project_path).context("Failed to validate project.")?;
    info!("Project validation successful!");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_opts_only_switch_settings_on() {
        let mut settings = Settings {
            overwrite: true,
            ..Settings::default()
        };
        RunOpts {
            debug_model: true,
            ..RunOpts::default()
        }
        .apply_to(&mut settings);
        assert!(settings.overwrite);
        assert!(settings.debug_model);
    }

    #[test]
    fn test_settings_given_are_used() {
        let settings = Settings {
            log_level: "warn".into(),
            ..Settings::default()
        };
        assert_eq!(settings_or_load(Some(settings)).unwrap().log_level, "warn");
    }
}
