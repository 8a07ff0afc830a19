//! Components are the physical units of a PtX system: conversion units, storages and generators.
use crate::capability::{Capability, HasCapabilities};
use crate::commodity::{CommodityID, CommodityMap};
use crate::id::define_id_type;
use crate::units::{Flow, Money};
use indexmap::IndexMap;
use serde::Serialize;

pub mod conversion;
pub use conversion::{ConversionComponent, ConversionFlows, LoadLimits, RampValues};
pub mod generation;
pub use generation::{CurtailValues, GenerationComponent};
pub mod storage;
pub use storage::{StorageComponent, StorageDirection, StorageLimits, StorageValues};

define_id_type! {ComponentID}

/// A map of [`Component`]s, keyed by component ID
pub type ComponentMap = IndexMap<ComponentID, Component>;

/// The state of the system which component calculations depend on
#[derive(Debug, Clone, Copy)]
pub struct SystemView<'a> {
    /// All commodities in the system
    pub commodities: &'a CommodityMap,
    /// The current monetary balance
    pub balance: Money,
}

impl SystemView<'_> {
    /// The quantity of a commodity currently held in the system
    pub fn available(&self, commodity_id: &CommodityID) -> Flow {
        self.commodities
            .get(commodity_id)
            .map_or(Flow(0.0), |commodity| commodity.available_quantity)
    }
}

/// The kind of a [`Component`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComponentKind {
    /// A [`ConversionComponent`]
    Conversion,
    /// A [`StorageComponent`]
    Storage,
    /// A [`GenerationComponent`]
    Generation,
}

/// A physical unit in a PtX system
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    /// Turns input commodities into output commodities
    Conversion(ConversionComponent),
    /// Holds a commodity between steps
    Storage(StorageComponent),
    /// Supplies a commodity according to the weather
    Generation(GenerationComponent),
}

impl Component {
    /// The component's ID
    pub fn id(&self) -> &ComponentID {
        match self {
            Self::Conversion(c) => &c.id,
            Self::Storage(s) => &s.id,
            Self::Generation(g) => &g.id,
        }
    }

    /// The kind of component
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Conversion(_) => ComponentKind::Conversion,
            Self::Storage(_) => ComponentKind::Storage,
            Self::Generation(_) => ComponentKind::Generation,
        }
    }

    /// Operating costs accumulated so far
    pub fn total_variable_costs(&self) -> Money {
        match self {
            Self::Conversion(c) => c.total_variable_costs,
            Self::Storage(s) => s.total_variable_costs,
            Self::Generation(g) => g.total_variable_costs,
        }
    }

    /// The main operating state of the component: load for conversions, charge state for
    /// storages and curtailment for generators
    pub fn operating_state(&self) -> f64 {
        match self {
            Self::Conversion(c) => c.load.value(),
            Self::Storage(s) => s.charge_state.value(),
            Self::Generation(g) => g.curtailment.value(),
        }
    }

    /// All commodities that the component consumes, produces, stores or generates
    pub fn referenced_commodities(&self) -> Vec<&CommodityID> {
        match self {
            Self::Conversion(c) => c.inputs.keys().chain(c.outputs.keys()).collect(),
            Self::Storage(s) => vec![&s.stored_commodity],
            Self::Generation(g) => vec![&g.generated_commodity],
        }
    }
}

impl HasCapabilities for Component {
    fn supported_capabilities(&self) -> &'static [Capability] {
        match self {
            Self::Conversion(c) => c.supported_capabilities(),
            Self::Storage(s) => s.supported_capabilities(),
            Self::Generation(g) => g.supported_capabilities(),
        }
    }

    fn is_enabled(&self, capability: Capability) -> bool {
        match self {
            Self::Conversion(c) => c.is_enabled(capability),
            Self::Storage(s) => s.is_enabled(capability),
            Self::Generation(g) => g.is_enabled(capability),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{battery, electrolyser, wind_turbine};
    use rstest::rstest;

    #[rstest]
    fn test_component_capabilities(
        electrolyser: ConversionComponent,
        battery: StorageComponent,
        mut wind_turbine: GenerationComponent,
    ) {
        assert_eq!(
            Component::Conversion(electrolyser).enabled_capabilities(),
            [Capability::Ramp]
        );
        assert_eq!(
            Component::Storage(battery).enabled_capabilities(),
            [Capability::ChargeOrDischarge]
        );
        assert_eq!(
            Component::Generation(wind_turbine.clone()).enabled_capabilities(),
            [Capability::Curtail]
        );

        wind_turbine.curtailment_possible = false;
        assert!(
            Component::Generation(wind_turbine)
                .enabled_capabilities()
                .is_empty()
        );
    }

    #[rstest]
    fn test_referenced_commodities(electrolyser: ConversionComponent) {
        let component = Component::Conversion(electrolyser);
        let referenced: Vec<_> = component
            .referenced_commodities()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(referenced, ["Electricity", "Water", "Hydrogen", "Oxygen"]);
        assert_eq!(component.kind(), ComponentKind::Conversion);
    }
}
