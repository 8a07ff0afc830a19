//! Code for reading generation components from a CSV file.
use super::*;
use crate::commodity::CommodityID;
use crate::component::{ComponentID, GenerationComponent};
use crate::id::IDCollection;
use crate::units::{Flow, MoneyPerFlow};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

const GENERATORS_FILE_NAME: &str = "generators.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct GeneratorRaw {
    id: ComponentID,
    variable_om: MoneyPerFlow,
    fixed_capacity: Flow,
    generated_commodity: String,
    curtailment_possible: Option<bool>,
}

impl GeneratorRaw {
    fn validate(&self) -> Result<()> {
        let id = &self.id;
        check_non_negative(&format!("variable_om for {id}"), self.variable_om.value())?;
        check_positive(&format!("fixed_capacity for {id}"), self.fixed_capacity.value())?;

        Ok(())
    }
}

/// Read generators from the specified project directory.
///
/// The file may be omitted if the project has no generators. Generators can be curtailed unless
/// `curtailment_possible` is set to false.
pub fn read_generators(
    project_dir: &Path,
    commodity_ids: &IndexSet<CommodityID>,
) -> Result<Vec<GenerationComponent>> {
    let file_path = project_dir.join(GENERATORS_FILE_NAME);
    let generators_csv = read_csv_optional(&file_path)?;
    read_generators_from_iter(generators_csv.into_iter(), commodity_ids)
        .with_context(|| input_err_msg(&file_path))
}

fn read_generators_from_iter<I>(
    iter: I,
    commodity_ids: &IndexSet<CommodityID>,
) -> Result<Vec<GenerationComponent>>
where
    I: Iterator<Item = GeneratorRaw>,
{
    let mut generators = Vec::new();
    for record in iter {
        record.validate()?;
        let generated_commodity = commodity_ids
            .get_id_by_str(&record.generated_commodity)
            .with_context(|| {
                format!("{} is not a valid commodity ID", record.generated_commodity)
            })?;
        generators.push(GenerationComponent::new(
            record.id,
            record.variable_om,
            record.fixed_capacity,
            generated_commodity,
            record.curtailment_possible.unwrap_or(true),
        ));
    }
    check_unique_ids(generators.iter().map(|generator| &generator.id))?;

    Ok(generators)
}
