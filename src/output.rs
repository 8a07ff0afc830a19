//! The module responsible for writing output data to disk.
use crate::calculation::Resolution;
use crate::capability::Capability;
use crate::component::ComponentKind;
use crate::simulation::{ActionRecord, StepReport};
use crate::system::PtxSystem;
use anyhow::{Context, Result, ensure};
use serde::Serialize;
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod metadata;

/// The root folder in which project-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "ptxsim_results";

/// The output file name for step summaries
const STEPS_FILE_NAME: &str = "steps.csv";

/// The output file name for the results of individual actions
const ACTION_RESULTS_FILE_NAME: &str = "action_results.csv";

/// The output file name for commodity state
const COMMODITIES_FILE_NAME: &str = "debug_commodities.csv";

/// The output file name for component state
const COMPONENTS_FILE_NAME: &str = "debug_components.csv";

/// Get the output folder for the project in the specified directory
pub fn get_output_dir(project_dir: &Path) -> Result<PathBuf> {
    // Get the project name from the dir path. This ends up being convoluted because we need to
    // check for all possible errors.
    let project_dir = project_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to project")?;

    let project_name = project_dir
        .file_name()
        .context("Project cannot be in root folder")?
        .to_str()
        .context("Invalid chars in project dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, project_name].iter().collect())
}

/// Create a new output directory, emptying an existing one if `allow_overwrite` is set.
///
/// # Returns
///
/// Whether an existing directory was overwritten
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let mut overwritten = false;
    if output_dir.is_dir() {
        let is_empty = output_dir.read_dir()?.next().is_none();
        if is_empty {
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder {} already exists and is not empty. Please delete the folder or pass \
            the --overwrite command-line option.",
            output_dir.display()
        );
        fs::remove_dir_all(output_dir)?;
        overwritten = true;
    }

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(overwritten)
}

/// Represents a row in the steps CSV file
#[derive(Serialize, Debug, PartialEq)]
struct StepRow {
    episode: u32,
    step: u32,
    balance: f64,
    reward: f64,
    success: bool,
    terminated: bool,
    truncated: bool,
}

/// Represents a row in the action results CSV file
#[derive(Serialize, Debug, PartialEq)]
struct ActionResultRow<'a> {
    episode: u32,
    step: u32,
    element: &'a str,
    capability: Capability,
    requested: f64,
    achieved: f64,
    resolution: Resolution,
    status: &'a str,
}

impl<'a> ActionResultRow<'a> {
    fn new(episode: u32, step: u32, record: &'a ActionRecord) -> Self {
        Self {
            episode,
            step,
            element: &record.element,
            capability: record.capability,
            requested: record.requested,
            achieved: record.achieved,
            resolution: record.resolution,
            status: &record.status,
        }
    }
}

/// Represents a row in the commodities CSV file
#[derive(Serialize, Debug, PartialEq)]
struct CommodityRow<'a> {
    episode: u32,
    step: u32,
    commodity_id: &'a str,
    available_quantity: f64,
    purchased_quantity: f64,
    sold_quantity: f64,
    emitted_quantity: f64,
    consumed_quantity: f64,
    produced_quantity: f64,
    generated_quantity: f64,
    charged_quantity: f64,
    discharged_quantity: f64,
}

/// Represents a row in the components CSV file
#[derive(Serialize, Debug, PartialEq)]
struct ComponentRow<'a> {
    episode: u32,
    step: u32,
    component_id: &'a str,
    kind: ComponentKind,
    operating_state: f64,
    total_variable_costs: f64,
}

/// For writing extra debug information about the system
struct DebugDataWriter {
    commodities_writer: csv::Writer<File>,
    components_writer: csv::Writer<File>,
}

impl DebugDataWriter {
    /// Open CSV files to write debug info to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    fn create(output_path: &Path) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        Ok(Self {
            commodities_writer: new_writer(COMMODITIES_FILE_NAME)?,
            components_writer: new_writer(COMPONENTS_FILE_NAME)?,
        })
    }

    /// Write the state of every element after a step
    fn write_system_state(&mut self, episode: u32, step: u32, system: &PtxSystem) -> Result<()> {
        for commodity in system.commodities().values() {
            let counters = &commodity.counters;
            self.commodities_writer.serialize(CommodityRow {
                episode,
                step,
                commodity_id: commodity.id.as_str(),
                available_quantity: commodity.available_quantity.value(),
                purchased_quantity: counters.purchased_quantity.value(),
                sold_quantity: counters.sold_quantity.value(),
                emitted_quantity: counters.emitted_quantity.value(),
                consumed_quantity: counters.consumed_quantity.value(),
                produced_quantity: counters.produced_quantity.value(),
                generated_quantity: counters.generated_quantity.value(),
                charged_quantity: counters.charged_quantity.value(),
                discharged_quantity: counters.discharged_quantity.value(),
            })?;
        }

        for component in system.components().values() {
            self.components_writer.serialize(ComponentRow {
                episode,
                step,
                component_id: component.id().as_str(),
                kind: component.kind(),
                operating_state: component.operating_state(),
                total_variable_costs: component.total_variable_costs().value(),
            })?;
        }

        Ok(())
    }

    /// Flush the underlying streams
    fn flush(&mut self) -> Result<()> {
        self.commodities_writer.flush()?;
        self.components_writer.flush()?;

        Ok(())
    }
}

/// An object for writing the results of episodes to file
pub struct DataWriter {
    steps_writer: csv::Writer<File>,
    action_results_writer: csv::Writer<File>,
    debug_writer: Option<DebugDataWriter>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    /// * `save_debug_info` - Whether to include extra CSV files for debugging the system
    pub fn create(output_path: &Path, save_debug_info: bool) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        let debug_writer = if save_debug_info {
            // Create debug CSV files
            Some(DebugDataWriter::create(output_path)?)
        } else {
            None
        };

        Ok(Self {
            steps_writer: new_writer(STEPS_FILE_NAME)?,
            action_results_writer: new_writer(ACTION_RESULTS_FILE_NAME)?,
            debug_writer,
        })
    }

    /// Write the results of a step, along with the state of the system afterwards
    pub fn write_step(
        &mut self,
        episode: u32,
        report: &StepReport,
        system: &PtxSystem,
    ) -> Result<()> {
        self.steps_writer.serialize(StepRow {
            episode,
            step: report.step,
            balance: system.balance().value(),
            reward: report.reward.value(),
            success: report.outcome.success,
            terminated: report.terminated,
            truncated: report.truncated,
        })?;

        for record in &report.outcome.records {
            self.action_results_writer
                .serialize(ActionResultRow::new(episode, report.step, record))?;
        }

        if let Some(ref mut wtr) = self.debug_writer {
            wtr.write_system_state(episode, report.step, system)?;
        }

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.steps_writer.flush()?;
        self.action_results_writer.flush()?;
        if let Some(ref mut wtr) = self.debug_writer {
            wtr.flush()?;
        }

        Ok(())
    }
}
