//! Code for reading storage components from a CSV file.
use super::*;
use crate::commodity::CommodityID;
use crate::component::{ComponentID, StorageComponent, StorageLimits};
use crate::id::IDCollection;
use crate::units::{Flow, MoneyPerFlow};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

const STORAGES_FILE_NAME: &str = "storages.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct StorageRaw {
    id: ComponentID,
    variable_om: MoneyPerFlow,
    fixed_capacity: Flow,
    stored_commodity: String,
    #[serde(deserialize_with = "deserialise_proportion")]
    min_soc: Dimensionless,
    #[serde(deserialize_with = "deserialise_proportion_nonzero")]
    max_soc: Dimensionless,
    #[serde(deserialize_with = "deserialise_proportion_nonzero")]
    charging_efficiency: Dimensionless,
    #[serde(deserialize_with = "deserialise_proportion_nonzero")]
    discharging_efficiency: Dimensionless,
    ratio_capacity_p: Dimensionless,
    initial_soc: Option<Dimensionless>,
}

impl StorageRaw {
    fn validate(&self) -> Result<()> {
        let id = &self.id;
        check_non_negative(&format!("variable_om for {id}"), self.variable_om.value())?;
        check_positive(&format!("fixed_capacity for {id}"), self.fixed_capacity.value())?;
        check_positive(
            &format!("ratio_capacity_p for {id}"),
            self.ratio_capacity_p.value(),
        )?;
        ensure!(
            self.min_soc <= self.max_soc,
            "min_soc for {id} cannot be greater than max_soc"
        );
        if let Some(initial_soc) = self.initial_soc {
            ensure!(
                (self.min_soc..=self.max_soc).contains(&initial_soc),
                "initial_soc for {id} must be between min_soc and max_soc (got {initial_soc})"
            );
        }

        Ok(())
    }

    fn into_storage(self, stored_commodity: CommodityID) -> StorageComponent {
        let limits = StorageLimits {
            min_soc: self.min_soc,
            max_soc: self.max_soc,
            charging_efficiency: self.charging_efficiency,
            discharging_efficiency: self.discharging_efficiency,
            ratio_capacity_p: self.ratio_capacity_p,
            initial_soc: self.initial_soc.unwrap_or(self.min_soc),
        };
        StorageComponent::new(
            self.id,
            self.variable_om,
            self.fixed_capacity,
            stored_commodity,
            limits,
        )
    }
}

/// Read storages from the specified project directory.
///
/// The file may be omitted if the project has no storages.
pub fn read_storages(
    project_dir: &Path,
    commodity_ids: &IndexSet<CommodityID>,
) -> Result<Vec<StorageComponent>> {
    let file_path = project_dir.join(STORAGES_FILE_NAME);
    let storages_csv = read_csv_optional(&file_path)?;
    read_storages_from_iter(storages_csv.into_iter(), commodity_ids)
        .with_context(|| input_err_msg(&file_path))
}

fn read_storages_from_iter<I>(
    iter: I,
    commodity_ids: &IndexSet<CommodityID>,
) -> Result<Vec<StorageComponent>>
where
    I: Iterator<Item = StorageRaw>,
{
    let mut storages = Vec::new();
    for record in iter {
        record.validate()?;
        let stored_commodity = commodity_ids
            .get_id_by_str(&record.stored_commodity)
            .with_context(|| format!("{} is not a valid commodity ID", record.stored_commodity))?;
        storages.push(record.into_storage(stored_commodity));
    }
    check_unique_ids(storages.iter().map(|storage| &storage.id))?;

    Ok(storages)
}
