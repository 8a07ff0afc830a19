//! Code for reading the commodity flows of conversions.
use super::super::*;
use crate::commodity::CommodityID;
use crate::component::{ComponentID, ConversionFlows};
use crate::id::IDCollection;
use anyhow::{Context, Result, bail, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::path::Path;

const CONVERSION_FLOWS_FILE_NAME: &str = "conversion_flows.csv";

/// Whether a commodity flows into or out of a conversion
#[derive(PartialEq, Eq, Clone, Copy, Debug, DeserializeLabeledStringEnum)]
enum FlowDirection {
    #[string = "in"]
    In,
    #[string = "out"]
    Out,
}

#[derive(PartialEq, Debug, Deserialize)]
struct ConversionFlowRaw {
    conversion_id: String,
    commodity_id: String,
    direction: FlowDirection,
    coeff: Dimensionless,
    is_main: Option<bool>,
}

impl ConversionFlowRaw {
    fn validate(&self) -> Result<()> {
        // Check that flow is not infinity, nan, 0 etc.
        ensure!(
            self.coeff.is_finite() && self.coeff > Dimensionless(0.0),
            "Invalid value for coeff ({})",
            self.coeff
        );

        Ok(())
    }
}

/// Flows of one conversion while they are being read
#[derive(Default)]
struct FlowsBuilder {
    inputs: IndexMap<CommodityID, Dimensionless>,
    outputs: IndexMap<CommodityID, Dimensionless>,
    main_input: Option<CommodityID>,
    main_output: Option<CommodityID>,
}

impl FlowsBuilder {
    fn add(
        &mut self,
        conversion_id: &ComponentID,
        commodity_id: CommodityID,
        direction: FlowDirection,
        coeff: Dimensionless,
        is_main: bool,
    ) -> Result<()> {
        let (flows, main) = match direction {
            FlowDirection::In => (&mut self.inputs, &mut self.main_input),
            FlowDirection::Out => (&mut self.outputs, &mut self.main_output),
        };
        let name = match direction {
            FlowDirection::In => "input",
            FlowDirection::Out => "output",
        };

        ensure!(
            flows.insert(commodity_id.clone(), coeff).is_none(),
            "Duplicate {name} flow of {commodity_id} for conversion {conversion_id}"
        );
        if is_main {
            if let Some(existing) = main.as_ref() {
                bail!(
                    "Conversion {conversion_id} has more than one main {name} ({existing} and \
                    {commodity_id})"
                );
            }
            *main = Some(commodity_id);
        }

        Ok(())
    }

    fn build(self, conversion_id: &ComponentID) -> Result<ConversionFlows> {
        let main_input = self
            .main_input
            .with_context(|| format!("Conversion {conversion_id} has no main input"))?;
        let main_output = self
            .main_output
            .with_context(|| format!("Conversion {conversion_id} has no main output"))?;

        Ok(ConversionFlows {
            inputs: self.inputs,
            outputs: self.outputs,
            main_input,
            main_output,
        })
    }
}

/// Read the flows of every conversion from a CSV file
pub fn read_conversion_flows(
    project_dir: &Path,
    conversion_ids: &IndexSet<ComponentID>,
    commodity_ids: &IndexSet<CommodityID>,
) -> Result<IndexMap<ComponentID, ConversionFlows>> {
    let file_path = project_dir.join(CONVERSION_FLOWS_FILE_NAME);
    let flows_csv = read_csv(&file_path)?;
    read_conversion_flows_from_iter(flows_csv.into_iter(), conversion_ids, commodity_ids)
        .with_context(|| input_err_msg(&file_path))
}

fn read_conversion_flows_from_iter<I>(
    iter: I,
    conversion_ids: &IndexSet<ComponentID>,
    commodity_ids: &IndexSet<CommodityID>,
) -> Result<IndexMap<ComponentID, ConversionFlows>>
where
    I: Iterator<Item = ConversionFlowRaw>,
{
    let mut builders: IndexMap<ComponentID, FlowsBuilder> = IndexMap::new();
    for record in iter {
        record.validate()?;

        let conversion_id = conversion_ids
            .get_id_by_str(&record.conversion_id)
            .with_context(|| format!("{} is not a conversion", record.conversion_id))?;
        let commodity_id = commodity_ids
            .get_id_by_str(&record.commodity_id)
            .with_context(|| format!("{} is not a valid commodity ID", record.commodity_id))?;

        builders.entry(conversion_id.clone()).or_default().add(
            &conversion_id,
            commodity_id,
            record.direction,
            record.coeff,
            record.is_main.unwrap_or(false),
        )?;
    }

    conversion_ids
        .iter()
        .map(|conversion_id| {
            let builder = builders
                .swap_remove(conversion_id)
                .with_context(|| format!("No flows were given for conversion {conversion_id}"))?;
            Ok((conversion_id.clone(), builder.build(conversion_id)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use rstest::{fixture, rstest};

    fn flow(
        commodity_id: &str,
        direction: FlowDirection,
        coeff: f64,
        is_main: bool,
    ) -> ConversionFlowRaw {
        ConversionFlowRaw {
            conversion_id: "Electrolyser".into(),
            commodity_id: commodity_id.into(),
            direction,
            coeff: Dimensionless(coeff),
            is_main: is_main.then_some(true),
        }
    }

    #[fixture]
    fn conversion_ids() -> IndexSet<ComponentID> {
        ["Electrolyser".into()].into_iter().collect()
    }

    #[fixture]
    fn commodity_ids() -> IndexSet<CommodityID> {
        ["Electricity", "Water", "Hydrogen"]
            .into_iter()
            .map(CommodityID::new)
            .collect()
    }

    #[rstest]
    fn test_read_flows(
        conversion_ids: IndexSet<ComponentID>,
        commodity_ids: IndexSet<CommodityID>,
    ) {
        let records = [
            flow("Electricity", FlowDirection::In, 1.0, true),
            flow("Water", FlowDirection::In, 0.5, false),
            flow("Hydrogen", FlowDirection::Out, 2.0, true),
        ];
        let flows =
            read_conversion_flows_from_iter(records.into_iter(), &conversion_ids, &commodity_ids)
                .unwrap();
        let electrolyser = &flows[&ComponentID::new("Electrolyser")];
        assert_eq!(electrolyser.main_input, "Electricity".into());
        assert_eq!(electrolyser.main_output, "Hydrogen".into());
        assert_eq!(electrolyser.inputs.len(), 2);
        assert_eq!(electrolyser.outputs.len(), 1);
    }

    #[rstest]
    #[case::two_main_inputs(
        vec![
            flow("Electricity", FlowDirection::In, 1.0, true),
            flow("Water", FlowDirection::In, 0.5, true),
            flow("Hydrogen", FlowDirection::Out, 2.0, true),
        ],
        "Conversion Electrolyser has more than one main input (Electricity and Water)"
    )]
    #[case::no_main_output(
        vec![
            flow("Electricity", FlowDirection::In, 1.0, true),
            flow("Hydrogen", FlowDirection::Out, 2.0, false),
        ],
        "Conversion Electrolyser has no main output"
    )]
    #[case::duplicate(
        vec![
            flow("Electricity", FlowDirection::In, 1.0, true),
            flow("Electricity", FlowDirection::In, 2.0, false),
        ],
        "Duplicate input flow of Electricity for conversion Electrolyser"
    )]
    #[case::zero_coeff(
        vec![flow("Electricity", FlowDirection::In, 0.0, true)],
        "Invalid value for coeff (0)"
    )]
    #[case::no_flows(vec![], "No flows were given for conversion Electrolyser")]
    fn test_read_flows_invalid(
        conversion_ids: IndexSet<ComponentID>,
        commodity_ids: IndexSet<CommodityID>,
        #[case] records: Vec<ConversionFlowRaw>,
        #[case] msg: &str,
    ) {
        assert_error!(
            read_conversion_flows_from_iter(records.into_iter(), &conversion_ids, &commodity_ids),
            msg
        );
    }

    #[rstest]
    fn test_read_conversion_flows_file(
        conversion_ids: IndexSet<ComponentID>,
        commodity_ids: IndexSet<CommodityID>,
    ) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONVERSION_FLOWS_FILE_NAME),
            "conversion_id,commodity_id,direction,coeff,is_main\n\
            Electrolyser,Electricity,in,1.0,true\n\
            Electrolyser,Water,in,0.5,\n\
            Electrolyser,Hydrogen,out,2.0,true\n",
        )
        .unwrap();

        let flows = read_conversion_flows(dir.path(), &conversion_ids, &commodity_ids).unwrap();
        let electrolyser = &flows[&ComponentID::new("Electrolyser")];
        assert_eq!(electrolyser.inputs[&CommodityID::new("Water")], Dimensionless(0.5));
        assert_eq!(electrolyser.main_output, "Hydrogen".into());

        std::fs::write(
            dir.path().join(CONVERSION_FLOWS_FILE_NAME),
            "conversion_id,commodity_id,direction,coeff,is_main\n\
            Electrolyser,Electricity,sideways,1.0,true\n",
        )
        .unwrap();
        assert!(read_conversion_flows(dir.path(), &conversion_ids, &commodity_ids).is_err());
    }

    #[rstest]
    fn test_read_flows_unknown_commodity(
        conversion_ids: IndexSet<ComponentID>,
        commodity_ids: IndexSet<CommodityID>,
    ) {
        let records = [flow("Steam", FlowDirection::In, 1.0, true)];
        assert_error!(
            read_conversion_flows_from_iter(records.into_iter(), &conversion_ids, &commodity_ids),
            "Steam is not a valid commodity ID"
        );
    }
}
