//! Code for reading weather data from a CSV file.
use super::*;
use crate::component::ComponentID;
use crate::weather::WeatherProfile;
use anyhow::{Context, Result, bail, ensure};
use indexmap::IndexMap;
use std::io::Read;
use std::path::Path;

const WEATHER_FILE_NAME: &str = "weather.csv";

/// Read weather data for the given generators.
///
/// The file has one column per generator, named after it, and one row per step. Other columns
/// (e.g. timestamps) are ignored. The file may be omitted if there are no generators.
///
/// # Arguments
///
/// * `project_dir` - Folder containing project configuration files
/// * `generator_ids` - The generators which need weather data
/// * `offset` - The number of rows to skip at the start of an episode
pub fn read_weather(
    project_dir: &Path,
    generator_ids: &IndexSet<ComponentID>,
    offset: usize,
) -> Result<WeatherProfile> {
    let file_path = project_dir.join(WEATHER_FILE_NAME);
    if generator_ids.is_empty() && !file_path.exists() {
        return Ok(WeatherProfile::default());
    }

    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(&file_path)
        .with_context(|| input_err_msg(&file_path))?;
    read_weather_from_reader(reader, generator_ids, offset)
        .with_context(|| input_err_msg(&file_path))
}

fn read_weather_from_reader<R: Read>(
    mut reader: csv::Reader<R>,
    generator_ids: &IndexSet<ComponentID>,
    offset: usize,
) -> Result<WeatherProfile> {
    let headers = reader.headers()?.clone();
    let columns: Vec<(ComponentID, usize)> = generator_ids
        .iter()
        .map(|id| {
            let column = headers
                .iter()
                .position(|header| header == id.as_str())
                .with_context(|| format!("No weather data was given for generator {id}"))?;
            Ok((id.clone(), column))
        })
        .collect::<Result<_>>()?;

    let mut coefficients: IndexMap<ComponentID, Vec<Dimensionless>> = generator_ids
        .iter()
        .map(|id| (id.clone(), Vec::new()))
        .collect();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        for (id, column) in &columns {
            let raw = record.get(*column).unwrap_or_default();
            let Ok(value) = raw.parse::<f64>() else {
                bail!("Invalid weather value '{raw}' for {id} in row {}", row + 1);
            };
            ensure!(
                (0.0..=1.0).contains(&value),
                "Weather value for {id} in row {} must be between 0 and 1 (got {value})",
                row + 1
            );
            coefficients[id].push(Dimensionless(value));
        }
    }

    Ok(WeatherProfile::new(coefficients, offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use crate::weather::WeatherSource;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn reader(contents: &str) -> csv::Reader<&[u8]> {
        csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(contents.as_bytes())
    }

    fn generator_ids() -> IndexSet<ComponentID> {
        ["Wind".into()].into_iter().collect()
    }

    #[test]
    fn test_read_weather() {
        let contents = "time,Wind,Solar\n0,0.5,0.0\n1,1.0,0.3\n";
        let weather = read_weather_from_reader(reader(contents), &generator_ids(), 1).unwrap();
        assert_eq!(weather.usable_steps(), Some(1));
        assert_eq!(
            weather.coefficient_for(&"Wind".into(), 0),
            Some(Dimensionless(1.0))
        );
        // Columns for other generators are ignored
        assert_eq!(weather.coefficient_for(&"Solar".into(), 0), None);
    }

    #[test]
    fn test_read_weather_invalid() {
        assert_error!(
            read_weather_from_reader(reader("Solar\n0.5\n"), &generator_ids(), 0),
            "No weather data was given for generator Wind"
        );
        assert_error!(
            read_weather_from_reader(reader("Wind\n1.5\n"), &generator_ids(), 0),
            "Weather value for Wind in row 1 must be between 0 and 1 (got 1.5)"
        );
        assert_error!(
            read_weather_from_reader(reader("Wind\n0.5\ncalm\n"), &generator_ids(), 0),
            "Invalid weather value 'calm' for Wind in row 2"
        );
    }

    #[test]
    fn test_read_weather_file() {
        let dir = tempdir().unwrap();

        // Not needed without generators
        let weather = read_weather(dir.path(), &IndexSet::new(), 0).unwrap();
        assert_eq!(weather, WeatherProfile::default());
        assert!(read_weather(dir.path(), &generator_ids(), 0).is_err());

        {
            let mut file = File::create(dir.path().join(WEATHER_FILE_NAME)).unwrap();
            writeln!(file, "Wind\n0.2\n0.4").unwrap();
        }
        let weather = read_weather(dir.path(), &generator_ids(), 0).unwrap();
        assert_eq!(weather.usable_steps(), Some(2));
    }
}
