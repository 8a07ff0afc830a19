//! Code for reading the scheduled action vectors of a project.
use super::*;
use crate::project::ActionSchedule;
use crate::simulation::ActionSpace;
use anyhow::{Context, Result, bail, ensure};
use log::warn;
use std::io::Read;
use std::path::Path;

const ACTIONS_FILE_NAME: &str = "actions.csv";

/// Read the action vector for each step.
///
/// Columns are named with action slot labels (e.g. "Electrolyser.ramp") and there is one row per
/// step. Slots without a column and steps without a row are given zeros. If the file is absent,
/// every step uses zeros.
///
/// # Arguments
///
/// * `project_dir` - Folder containing project configuration files
/// * `action_space` - The slots of the system's action vectors
/// * `max_steps` - The number of steps in an episode
pub fn read_action_schedule(
    project_dir: &Path,
    action_space: &ActionSpace,
    max_steps: u32,
) -> Result<ActionSchedule> {
    let file_path = project_dir.join(ACTIONS_FILE_NAME);
    if !file_path.exists() {
        return Ok(ActionSchedule::zeros(action_space.len()));
    }

    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(&file_path)
        .with_context(|| input_err_msg(&file_path))?;
    read_action_schedule_from_reader(reader, action_space, max_steps)
        .with_context(|| input_err_msg(&file_path))
}

fn read_action_schedule_from_reader<R: Read>(
    mut reader: csv::Reader<R>,
    action_space: &ActionSpace,
    max_steps: u32,
) -> Result<ActionSchedule> {
    let labels = action_space.labels();
    let headers = reader.headers()?.clone();

    // The slot index for each column
    let mut slot_indexes = Vec::with_capacity(headers.len());
    for header in &headers {
        let Some(index) = labels.iter().position(|label| label == header) else {
            bail!(
                "Unknown action {header}. Valid actions are: {}",
                labels.join(", ")
            );
        };
        ensure!(
            !slot_indexes.contains(&index),
            "Duplicate column for action {header}"
        );
        slot_indexes.push(index);
    }
    for (index, label) in labels.iter().enumerate() {
        if !slot_indexes.contains(&index) {
            warn!("No values were given for action {label}; it will be zero at every step");
        }
    }

    let max_rows = usize::try_from(max_steps)?;
    let mut vectors = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        if row == max_rows {
            warn!("Actions after step {max_steps} will be ignored");
            break;
        }

        let mut vector = vec![0.0; labels.len()];
        for (raw, &index) in record.iter().zip(&slot_indexes) {
            if raw.is_empty() {
                continue;
            }
            vector[index] = raw.parse().with_context(|| {
                format!("Invalid value '{raw}' for {} in row {}", labels[index], row + 1)
            })?;
        }
        vectors.push(vector);
    }

    Ok(ActionSchedule::new(vectors, labels.len()))
}
