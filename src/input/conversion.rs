//! Code for reading conversion components from CSV files.
use super::*;
use crate::commodity::CommodityID;
use crate::component::{ComponentID, ConversionComponent, LoadLimits};
use crate::units::{Flow, MoneyPerFlow};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

mod flow;
use flow::read_conversion_flows;

const CONVERSIONS_FILE_NAME: &str = "conversions.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct ConversionRaw {
    id: ComponentID,
    variable_om: MoneyPerFlow,
    fixed_capacity: Flow,
    #[serde(deserialize_with = "deserialise_proportion")]
    min_p: Dimensionless,
    #[serde(deserialize_with = "deserialise_proportion_nonzero")]
    max_p: Dimensionless,
    #[serde(deserialize_with = "deserialise_proportion")]
    ramp_up: Dimensionless,
    #[serde(deserialize_with = "deserialise_proportion")]
    ramp_down: Dimensionless,
    initial_load: Option<Dimensionless>,
}

impl ConversionRaw {
    fn validate(&self) -> Result<()> {
        let id = &self.id;
        check_non_negative(&format!("variable_om for {id}"), self.variable_om.value())?;
        check_positive(&format!("fixed_capacity for {id}"), self.fixed_capacity.value())?;
        ensure!(
            self.min_p <= self.max_p,
            "min_p for {id} cannot be greater than max_p"
        );
        if let Some(initial_load) = self.initial_load {
            ensure!(
                (self.min_p..=self.max_p).contains(&initial_load),
                "initial_load for {id} must be between min_p and max_p (got {initial_load})"
            );
        }

        Ok(())
    }

    fn limits(&self) -> LoadLimits {
        LoadLimits {
            min_p: self.min_p,
            max_p: self.max_p,
            ramp_up: self.ramp_up,
            ramp_down: self.ramp_down,
            initial_load: self.initial_load.unwrap_or(self.min_p),
        }
    }
}

/// Read conversions and their flows from the specified project directory.
///
/// Both files may be omitted if the project has no conversions.
///
/// # Arguments
///
/// * `project_dir` - Folder containing project configuration files
/// * `commodity_ids` - All known commodity IDs
pub fn read_conversions(
    project_dir: &Path,
    commodity_ids: &IndexSet<CommodityID>,
) -> Result<Vec<ConversionComponent>> {
    let file_path = project_dir.join(CONVERSIONS_FILE_NAME);
    let conversions_csv: Vec<ConversionRaw> = read_csv_optional(&file_path)?;
    for record in &conversions_csv {
        record.validate().with_context(|| input_err_msg(&file_path))?;
    }
    check_unique_ids(conversions_csv.iter().map(|record| &record.id))
        .with_context(|| input_err_msg(&file_path))?;
    if conversions_csv.is_empty() {
        return Ok(Vec::new());
    }

    let conversion_ids = conversions_csv
        .iter()
        .map(|record| record.id.clone())
        .collect();
    let mut flows = read_conversion_flows(project_dir, &conversion_ids, commodity_ids)?;

    conversions_csv
        .into_iter()
        .map(|record| {
            // Every conversion has flows after validation
            let conversion_flows = flows
                .swap_remove(&record.id)
                .with_context(|| format!("No flows were given for conversion {}", record.id))?;
            let limits = record.limits();
            ConversionComponent::new(
                record.id,
                record.variable_om,
                record.fixed_capacity,
                limits,
                conversion_flows,
            )
        })
        .collect()
}
