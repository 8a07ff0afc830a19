//! Code related to the demo projects and the CLI commands for interacting with them.
use super::{RunOpts, handle_run_command};
use crate::settings::Settings;
use anyhow::{Context, Result, bail, ensure};
use clap::Subcommand;
use include_dir::{Dir, DirEntry, include_dir};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// The directory containing the demo projects.
static DEMOS_DIR: Dir<'_> = include_dir!("demos");

/// The available subcommands for managing demo projects.
#[derive(Subcommand)]
pub enum ExampleSubcommands {
    /// List available demo projects.
    List,
    /// Provide information about the specified demo project.
    Info {
        /// The name of the demo project.
        name: String,
    },
    /// Extract a demo project to a new directory.
    Extract {
        /// The name of the demo project to extract.
        name: String,
        /// The destination folder for the project.
        new_path: Option<PathBuf>,
    },
    /// Run a demo project.
    Run {
        /// The name of the demo project to run.
        name: String,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
}

impl ExampleSubcommands {
    /// Execute the supplied example subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::List => handle_example_list_command(),
            Self::Info { name } => handle_example_info_command(&name)?,
            Self::Extract {
                name,
                new_path: dest,
            } => handle_example_extract_command(&name, dest.as_deref())?,
            Self::Run { name, opts } => handle_example_run_command(&name, &opts, None)?,
        }

        Ok(())
    }
}

/// The names of the demo projects
pub fn demo_names() -> impl Iterator<Item = &'static str> {
    DEMOS_DIR
        .dirs()
        .filter_map(|entry| entry.path().file_name()?.to_str())
}

/// Handle the `example list` command.
fn handle_example_list_command() {
    for name in demo_names() {
        println!("{name}");
    }
}

/// Handle the `example info` command.
fn handle_example_info_command(name: &str) -> Result<()> {
    let path: PathBuf = [name, "README.txt"].iter().collect();
    let readme = DEMOS_DIR
        .get_file(path)
        .context("Example not found.")?
        .contents_utf8()
        .context("README.txt is not UTF-8 encoded")?;

    println!("{readme}");

    Ok(())
}

/// Handle the `example extract` command
fn handle_example_extract_command(name: &str, dest: Option<&Path>) -> Result<()> {
    let dest = dest.unwrap_or(Path::new(name));
    extract_example(name, dest)
}

/// Extract the specified demo project to a new directory
fn extract_example(name: &str, new_path: &Path) -> Result<()> {
    // Find the subdirectory in DEMOS_DIR whose name matches `name`.
    let sub_dir = DEMOS_DIR.get_dir(name).context("Example not found.")?;

    ensure!(
        !new_path.exists(),
        "Destination directory {} already exists",
        new_path.display()
    );

    // Copy the contents of the subdirectory to the destination
    fs::create_dir(new_path)?;
    for entry in sub_dir.entries() {
        match entry {
            DirEntry::Dir(_) => bail!("Subdirectories in demo projects are not supported"),
            DirEntry::File(f) => {
                let file_name = f.path().file_name().context("Invalid file name")?;
                let file_path = new_path.join(file_name);
                fs::write(&file_path, f.contents())?;
            }
        }
    }

    Ok(())
}

/// Handle the `example run` command.
pub fn handle_example_run_command(
    name: &str,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let temp_dir = TempDir::new().context("Failed to create temporary directory.")?;
    let project_path = temp_dir.path().join(name);
    extract_example(name, &project_path)?;
    handle_run_command(&project_path, opts, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::validate_project;
    use tempfile::tempdir;

    #[test]
    fn test_demos_are_valid() {
        for name in demo_names() {
            let dir = tempdir().unwrap();
            let project_path = dir.path().join(name);
            extract_example(name, &project_path).unwrap();
            validate_project(&project_path).unwrap();
        }
    }

    #[test]
    fn test_extract_example() {
        let dir = tempdir().unwrap();
        assert!(extract_example("not_a_demo", &dir.path().join("x")).is_err());

        // The destination must not already exist
        let name = demo_names().next().unwrap();
        assert!(extract_example(name, dir.path()).is_err());
    }
}
