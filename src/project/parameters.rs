//! Defines the `ProjectParameters` struct, which represents the contents of `project.toml`.
use crate::input::{input_err_msg, read_toml};
use crate::units::Money;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

const PROJECT_PARAMETERS_FILE_NAME: &str = "project.toml";

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_param_default!(default_episodes, u32, 1);

/// Represents the contents of the entire project file.
#[derive(Debug, Deserialize, PartialEq)]
pub struct ProjectParameters {
    /// The name of the project
    pub name: String,
    /// The balance at the start of every episode
    pub starting_budget: Money,
    /// The number of steps in an episode.
    ///
    /// Defaults to the number of steps of weather data available, or a single step if the
    /// project has no generators.
    #[serde(default)]
    pub max_steps: Option<u32>,
    /// The number of rows of weather data to skip
    #[serde(default)]
    pub weather_offset: usize,
    /// The number of episodes to run
    #[serde(default = "default_episodes")]
    pub episodes: u32,
}

/// Check that the `starting_budget` parameter is valid
fn check_starting_budget(value: Money) -> Result<()> {
    ensure!(
        value.is_finite(),
        "starting_budget must be a finite number"
    );

    Ok(())
}

/// Check that the `max_steps` parameter is valid
fn check_max_steps(value: Option<u32>) -> Result<()> {
    ensure!(value != Some(0), "max_steps cannot be zero");

    Ok(())
}

/// Check that the `episodes` parameter is valid
fn check_episodes(value: u32) -> Result<()> {
    ensure!(value > 0, "episodes cannot be zero");

    Ok(())
}

impl ProjectParameters {
    /// Read a project file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `project_dir` - Folder containing project configuration files
    ///
    /// # Returns
    ///
    /// The project file contents as a [`ProjectParameters`] struct or an error if the file is
    /// invalid
    pub fn from_path<P: AsRef<Path>>(project_dir: P) -> Result<ProjectParameters> {
        let file_path = project_dir.as_ref().join(PROJECT_PARAMETERS_FILE_NAME);
        let project_params: ProjectParameters = read_toml(&file_path)?;

        project_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(project_params)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        ensure!(!self.name.trim().is_empty(), "name cannot be empty");
        check_starting_budget(self.starting_budget)?;
        check_max_steps(self.max_steps)?;
        check_episodes(self.episodes)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_project_params_from_path() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(PROJECT_PARAMETERS_FILE_NAME)).unwrap();
            writeln!(file, "name = \"Electrolysis\"\nstarting_budget = 1000.0").unwrap();
        }

        let project_params = ProjectParameters::from_path(dir.path()).unwrap();
        assert_eq!(
            project_params,
            ProjectParameters {
                name: "Electrolysis".into(),
                starting_budget: Money(1000.0),
                max_steps: None,
                weather_offset: 0,
                episodes: 1,
            }
        );
    }

    #[test]
    fn test_project_params_invalid() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(PROJECT_PARAMETERS_FILE_NAME)).unwrap();
            writeln!(
                file,
                "name = \"Electrolysis\"\nstarting_budget = 10.0\nepisodes = 0"
            )
            .unwrap();
        }

        let error = ProjectParameters::from_path(dir.path()).unwrap_err();
        assert_eq!(format!("{:#}", error.root_cause()), "episodes cannot be zero");
    }

    #[rstest]
    #[case(0.0, true)]
    #[case(-5.0, true)]
    #[case(1e9, true)]
    #[case(f64::INFINITY, false)]
    #[case(f64::NAN, false)]
    fn test_check_starting_budget(#[case] value: f64, #[case] expected_valid: bool) {
        assert_eq!(check_starting_budget(Money(value)).is_ok(), expected_valid);
    }

    #[rstest]
    #[case(None, true)]
    #[case(Some(1), true)]
    #[case(Some(0), false)]
    fn test_check_max_steps(#[case] value: Option<u32>, #[case] expected_valid: bool) {
        assert_eq!(check_max_steps(value).is_ok(), expected_valid);
    }
}
