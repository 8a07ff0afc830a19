//! Common routines for handling input data.
use crate::commodity::CommodityID;
use crate::component::{Component, ComponentID};
use crate::graph::warn_about_unsupplied_commodities;
use crate::project::{Project, ProjectParameters};
use crate::simulation::ActionSpace;
use crate::system::PtxSystem;
use crate::units::Dimensionless;
use crate::weather::WeatherProfile;
use anyhow::{Context, Result, ensure};
use indexmap::IndexSet;
use itertools::Itertools;
use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::rc::Rc;

mod actions;
use actions::read_action_schedule;
mod commodity;
use commodity::read_commodities;
mod conversion;
use conversion::read_conversions;
mod generator;
use generator::read_generators;
mod storage;
use storage::read_storages;
mod weather;
use weather::read_weather;

/// Read a series of type `T`s from a CSV file.
///
/// Will raise an error if the file is empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let vec = read_csv_internal(file_path)?;
    ensure!(
        !vec.is_empty(),
        "CSV file {} cannot be empty",
        file_path.display()
    );

    Ok(vec)
}

/// Read a series of type `T`s from a CSV file, returning an empty `Vec` if the file is absent
pub fn read_csv_optional<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    if !file_path.exists() {
        return Ok(Vec::new());
    }

    read_csv_internal(file_path)
}

fn read_csv_internal<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?
        .into_deserialize()
        .process_results(|iter| iter.collect_vec())
        .with_context(|| input_err_msg(file_path))
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Read a value, checking that it is between 0 and 1
pub fn deserialise_proportion<'de, D>(deserialiser: D) -> Result<Dimensionless, D::Error>
where
    D: Deserializer<'de>,
{
    let value: f64 = Deserialize::deserialize(deserialiser)?;
    if !(0.0..=1.0).contains(&value) {
        Err(serde::de::Error::custom("Value must be between 0 and 1"))?;
    }

    Ok(Dimensionless(value))
}

/// Read a value, checking that it is greater than 0 and at most 1
pub fn deserialise_proportion_nonzero<'de, D>(deserialiser: D) -> Result<Dimensionless, D::Error>
where
    D: Deserializer<'de>,
{
    let value = deserialise_proportion(deserialiser)?;
    if value == Dimensionless(0.0) {
        Err(serde::de::Error::custom("Value cannot be zero"))?;
    }

    Ok(value)
}

/// Check that a value is a finite number which is not negative
pub fn check_non_negative(name: &str, value: f64) -> Result<()> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "{name} must be a finite number which is not negative (got {value})"
    );

    Ok(())
}

/// Check that a value is a finite number greater than zero
pub fn check_positive(name: &str, value: f64) -> Result<()> {
    ensure!(
        value.is_finite() && value > 0.0,
        "{name} must be a finite number greater than zero (got {value})"
    );

    Ok(())
}

/// Check that each ID occurs only once
fn check_unique_ids<'a, I, ID>(ids: I) -> Result<()>
where
    I: IntoIterator<Item = &'a ID>,
    ID: Display + Eq + std::hash::Hash + 'a,
{
    let mut seen = IndexSet::new();
    for id in ids {
        ensure!(seen.insert(id), "Duplicate ID {id} found");
    }

    Ok(())
}

/// Work out how many steps an episode lasts
fn resolve_max_steps(parameters: &ProjectParameters, weather: &WeatherProfile) -> Result<u32> {
    let usable = weather.usable_steps();
    match (parameters.max_steps, usable) {
        (Some(max_steps), Some(usable)) => {
            ensure!(
                usize::try_from(max_steps)? <= usable,
                "max_steps ({max_steps}) exceeds the {usable} steps of weather data available \
                after the offset"
            );
            Ok(max_steps)
        }
        (Some(max_steps), None) => Ok(max_steps),
        (None, Some(usable)) => {
            ensure!(
                usable > 0,
                "No weather data is left after an offset of {}",
                parameters.weather_offset
            );
            Ok(u32::try_from(usable)?)
        }
        (None, None) => Ok(1),
    }
}

/// Read a project from the specified directory.
///
/// # Arguments
///
/// * `project_dir` - Folder containing project configuration files
///
/// # Returns
///
/// The loaded project, ready to run, or an error if any of the files are invalid.
pub fn load_project<P: AsRef<Path>>(project_dir: P) -> Result<Project> {
    let project_dir = project_dir.as_ref();
    let parameters = ProjectParameters::from_path(project_dir)?;

    let commodities = read_commodities(project_dir)?;
    let commodity_ids: IndexSet<CommodityID> = commodities
        .iter()
        .map(|commodity| commodity.id.clone())
        .collect();
    let conversions = read_conversions(project_dir, &commodity_ids)?;
    let storages = read_storages(project_dir, &commodity_ids)?;
    let generators = read_generators(project_dir, &commodity_ids)?;

    let generator_ids: IndexSet<ComponentID> = generators
        .iter()
        .map(|generator| generator.id.clone())
        .collect();
    let weather = read_weather(project_dir, &generator_ids, parameters.weather_offset)?;
    let max_steps = resolve_max_steps(&parameters, &weather)?;

    let components = conversions
        .into_iter()
        .map(Component::Conversion)
        .chain(storages.into_iter().map(Component::Storage))
        .chain(generators.into_iter().map(Component::Generation))
        .collect();
    let mut system = PtxSystem::new(&parameters.name, commodities, components, Rc::new(weather))
        .context("Invalid system")?;
    system.set_initial_balance(parameters.starting_budget);
    warn_about_unsupplied_commodities(&system);

    let action_space = ActionSpace::from_system(&system);
    let schedule = read_action_schedule(project_dir, &action_space, max_steps)?;

    Ok(Project {
        parameters,
        system,
        schedule,
        max_steps,
    })
}

/// Read a project's files without keeping the result
pub fn validate_project<P: AsRef<Path>>(project_dir: P) -> Result<()> {
    load_project(project_dir).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Money;
    use rstest::rstest;
    use serde::Deserialize;
    use serde::de::IntoDeserializer;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Record {
        id: String,
        value: u32,
    }

    /// Create an example CSV file in dir_path
    fn create_csv_file(dir_path: &Path, contents: &str) -> std::path::PathBuf {
        let file_path = dir_path.join("test.csv");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "{contents}").unwrap();
        file_path
    }

    #[test]
    fn test_read_csv() {
        let dir = tempdir().unwrap();
        let file_path = create_csv_file(dir.path(), "id,value\nhello,1\nworld,2\n");
        let records: Vec<Record> = read_csv(&file_path).unwrap();
        assert_eq!(
            records,
            &[
                Record {
                    id: "hello".to_string(),
                    value: 1,
                },
                Record {
                    id: "world".to_string(),
                    value: 2,
                }
            ]
        );

        // File with only a header is an error for required files
        let file_path = create_csv_file(dir.path(), "id,value\n");
        assert!(read_csv::<Record>(&file_path).is_err());
        assert!(read_csv_optional::<Record>(&file_path).unwrap().is_empty());

        // Missing optional files are fine
        let missing = dir.path().join("missing.csv");
        assert!(read_csv_optional::<Record>(&missing).unwrap().is_empty());
        assert!(read_csv::<Record>(&missing).is_err());
    }

    #[test]
    fn test_read_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.toml");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "id = \"hello\"\nvalue = 1").unwrap();
        }

        assert_eq!(
            read_toml::<Record>(&file_path).unwrap(),
            Record {
                id: "hello".to_string(),
                value: 1,
            }
        );

        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "bad toml syntax").unwrap();
        }
        assert!(read_toml::<Record>(&file_path).is_err());
    }

    /// Deserialise value with deserialise_proportion()
    fn deserialise_f64(value: f64) -> Result<Dimensionless, serde::de::value::Error> {
        let deserialiser: serde::de::value::F64Deserializer<serde::de::value::Error> =
            value.into_deserializer();
        deserialise_proportion(deserialiser)
    }

    #[rstest]
    #[case(0.0, true)]
    #[case(0.5, true)]
    #[case(1.0, true)]
    #[case(-1.0, false)]
    #[case(1.5, false)]
    #[case(f64::NAN, false)]
    #[case(f64::INFINITY, false)]
    fn test_deserialise_proportion(#[case] value: f64, #[case] valid: bool) {
        assert_eq!(deserialise_f64(value).is_ok(), valid);
    }

    #[test]
    fn test_check_unique_ids() {
        let ids: Vec<CommodityID> = vec!["A".into(), "B".into()];
        assert!(check_unique_ids(&ids).is_ok());
        let ids: Vec<CommodityID> = vec!["A".into(), "A".into()];
        assert_eq!(
            check_unique_ids(&ids).unwrap_err().to_string(),
            "Duplicate ID A found"
        );
    }

    fn parameters(max_steps: Option<u32>) -> ProjectParameters {
        ProjectParameters {
            name: "Test".into(),
            starting_budget: Money(0.0),
            max_steps,
            weather_offset: 0,
            episodes: 1,
        }
    }

    #[test]
    fn test_resolve_max_steps() {
        let weather = WeatherProfile::new(
            [(ComponentID::new("Wind"), vec![Dimensionless(0.5); 3])]
                .into_iter()
                .collect(),
            0,
        );
        assert_eq!(resolve_max_steps(&parameters(None), &weather).unwrap(), 3);
        assert_eq!(resolve_max_steps(&parameters(Some(2)), &weather).unwrap(), 2);
        assert!(resolve_max_steps(&parameters(Some(4)), &weather).is_err());

        let no_weather = WeatherProfile::default();
        assert_eq!(resolve_max_steps(&parameters(None), &no_weather).unwrap(), 1);
        assert_eq!(
            resolve_max_steps(&parameters(Some(7)), &no_weather).unwrap(),
            7
        );
    }
}
