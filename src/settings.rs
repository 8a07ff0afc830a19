//! Program-wide settings, read from `settings.toml` in the user's config directory.
use crate::get_ptxsim_config_dir;
use crate::input::read_toml;
use crate::log::{DEFAULT_LOG_LEVEL, parse_log_level};
use anyhow::{Context, Result};
use documented::DocumentedFields;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SETTINGS_FILE_NAME: &str = "settings.toml";

const SETTINGS_TEMPLATE_HEADER: &str = "# ptxsim program settings
# Uncomment a setting to change it from its default value.
";

/// Where ptxsim looks for its settings file
pub fn get_settings_file_path() -> PathBuf {
    get_ptxsim_config_dir().join(SETTINGS_FILE_NAME)
}

/// Program settings.
///
/// Command-line options take precedence over these.
#[derive(Debug, DocumentedFields, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Log level used unless PTXSIM_LOG_LEVEL is set (off, error, warn, info, debug or trace)
    pub log_level: String,
    /// Whether to replace the contents of an existing output folder
    pub overwrite: bool,
    /// Whether to write the state of every commodity and component to CSV files after each step
    pub debug_model: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.into(),
            overwrite: false,
            debug_model: false,
        }
    }
}

impl Settings {
    /// Load the settings file, or the defaults if there isn't one
    pub fn load() -> Result<Settings> {
        Self::load_from_path(&get_settings_file_path())
    }

    fn load_from_path(file_path: &Path) -> Result<Settings> {
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        let settings: Settings = read_toml(file_path)?;
        parse_log_level(&settings.log_level)
            .with_context(|| format!("Invalid log_level in {}", file_path.display()))?;

        Ok(settings)
    }

    /// A settings file which documents every setting and leaves them all at their defaults
    pub fn default_file_contents() -> Result<String> {
        let defaults =
            toml::to_string(&Settings::default()).context("Could not convert settings to TOML")?;

        let entries = defaults
            .lines()
            .filter(|line| line.contains('='))
            .map(commented_setting)
            .collect::<Result<Vec<_>>>()?;

        Ok(format!("{SETTINGS_TEMPLATE_HEADER}{}", entries.concat()))
    }
}

/// Turn a `key = value` line into a commented-out entry preceded by the field's docs
fn commented_setting(line: &str) -> Result<String> {
    let (field, _) = line.split_once('=').unwrap_or((line, ""));
    let field = field.trim();
    let docs = Settings::get_field_docs(field)
        .with_context(|| format!("Missing doc comment for setting {field}"))?;

    let mut entry = String::from("\n");
    for doc_line in docs.lines() {
        entry.push_str(&format!("# # {}\n", doc_line.trim()));
    }
    entry.push_str(&format!("# {}\n", line.trim()));

    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_without_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);
        assert_eq!(
            Settings::load_from_path(&file_path).unwrap(),
            Settings::default()
        );
        assert_eq!(Settings::default().log_level, "info");
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&file_path, "log_level = \"warn\"\ndebug_model = true\n").unwrap();

        assert_eq!(
            Settings::load_from_path(&file_path).unwrap(),
            Settings {
                log_level: "warn".into(),
                overwrite: false,
                debug_model: true,
            }
        );
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);

        fs::write(&file_path, "log_level = \"loud\"\n").unwrap();
        let error = Settings::load_from_path(&file_path).unwrap_err();
        assert_eq!(error.root_cause().to_string(), "Unknown log level: loud");

        fs::write(&file_path, "colour = true\n").unwrap();
        assert!(Settings::load_from_path(&file_path).is_err());
    }

    #[test]
    fn test_default_file_contents() {
        let contents = Settings::default_file_contents().unwrap();
        assert!(contents.starts_with(SETTINGS_TEMPLATE_HEADER));
        assert!(contents.contains("\n# log_level = \"info\"\n"));
        assert!(contents.contains("# # Whether to replace the contents of an existing output folder"));

        // Everything is commented out, so the template loads as the defaults
        let settings: Settings = toml::from_str(&contents).unwrap();
        assert_eq!(settings, Settings::default());
    }
}
