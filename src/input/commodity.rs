//! Code for reading in commodities from a CSV file.
use super::*;
use crate::commodity::{Commodity, CommodityID};
use crate::units::{Flow, MoneyPerFlow};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

const COMMODITY_FILE_NAME: &str = "commodities.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct CommodityRaw {
    id: CommodityID,
    unit: String,
    #[serde(default)]
    purchasable: bool,
    #[serde(default)]
    saleable: bool,
    #[serde(default)]
    emittable: bool,
    #[serde(default)]
    demanded: bool,
    #[serde(default)]
    available: bool,
    #[serde(default)]
    total_demand: bool,
    #[serde(default)]
    purchase_price: MoneyPerFlow,
    #[serde(default)]
    sale_price: MoneyPerFlow,
    #[serde(default)]
    demand: Flow,
    #[serde(default)]
    available_quantity: Flow,
}

impl CommodityRaw {
    fn validate(&self) -> Result<()> {
        ensure!(
            !self.id.as_str().is_empty(),
            "Commodity IDs cannot be empty"
        );
        let id = &self.id;
        check_non_negative(&format!("purchase_price for {id}"), self.purchase_price.value())?;
        check_non_negative(&format!("sale_price for {id}"), self.sale_price.value())?;
        check_non_negative(&format!("demand for {id}"), self.demand.value())?;
        check_non_negative(
            &format!("available_quantity for {id}"),
            self.available_quantity.value(),
        )?;

        Ok(())
    }

    fn into_commodity(self) -> Commodity {
        Commodity {
            purchasable: self.purchasable,
            saleable: self.saleable,
            emittable: self.emittable,
            demanded: self.demanded,
            available: self.available,
            total_demand: self.total_demand,
            purchase_price: self.purchase_price,
            sale_price: self.sale_price,
            demand: self.demand,
            available_quantity: self.available_quantity,
            ..Commodity::new(self.id, &self.unit)
        }
    }
}

/// Read commodities from the specified project directory.
///
/// # Arguments
///
/// * `project_dir` - Folder containing project configuration files
///
/// # Returns
///
/// The commodities in the order they appear in the file, or an error.
pub fn read_commodities(project_dir: &Path) -> Result<Vec<Commodity>> {
    let file_path = project_dir.join(COMMODITY_FILE_NAME);
    let commodities_csv = read_csv(&file_path)?;
    read_commodities_from_iter(commodities_csv.into_iter())
        .with_context(|| input_err_msg(&file_path))
}

fn read_commodities_from_iter<I>(iter: I) -> Result<Vec<Commodity>>
where
    I: Iterator<Item = CommodityRaw>,
{
    let mut commodities = Vec::new();
    for record in iter {
        record.validate()?;
        commodities.push(record.into_commodity());
    }
    check_unique_ids(commodities.iter().map(|commodity| &commodity.id))?;

    Ok(commodities)
}
