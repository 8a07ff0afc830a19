//! The PtX system: the ledger of commodities, components and money which actions operate on.
use crate::action::{Action, ActionTarget, ActionValues};
use crate::calculation::Calculation;
use crate::capability::Capability;
use crate::commodity::{Commodity, CommodityID, CommodityMap};
use crate::component::{
    Component, ComponentID, ComponentMap, ConversionComponent, GenerationComponent,
    StorageComponent, SystemView,
};
use crate::units::{Dimensionless, Flow, Money};
use crate::weather::WeatherSource;
use anyhow::{Result, ensure};
use indexmap::IndexSet;
use itertools::Itertools;
use std::fmt::Display;
use std::rc::Rc;

/// A PtX system, holding its commodities, components and monetary balance
#[derive(Debug, Clone)]
pub struct PtxSystem {
    name: String,
    commodities: CommodityMap,
    components: ComponentMap,
    balance: Money,
    previous_balance: Money,
    starting_budget: Money,
    current_step: u32,
    weather: Rc<dyn WeatherSource>,
}

/// Commodities grouped by how they take part in the system
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommoditySets {
    /// Commodities which can be bought
    pub purchasable: IndexSet<CommodityID>,
    /// Commodities which can be sold
    pub saleable: IndexSet<CommodityID>,
    /// Commodities which can be emitted
    pub emittable: IndexSet<CommodityID>,
    /// Commodities with a demand
    pub demanded: IndexSet<CommodityID>,
    /// Commodities which are freely available
    pub available: IndexSet<CommodityID>,
    /// Commodities whose demand is a total over the episode
    pub total_demand: IndexSet<CommodityID>,
    /// Commodities used as conversion inputs
    pub consumed: IndexSet<CommodityID>,
    /// Commodities made by conversions
    pub produced: IndexSet<CommodityID>,
    /// Commodities held by storages
    pub stored: IndexSet<CommodityID>,
    /// Commodities supplied by generators
    pub generated: IndexSet<CommodityID>,
}

impl PtxSystem {
    /// Create a new system with a zero balance.
    ///
    /// Every element must have a unique name and components may only reference commodities of
    /// the system.
    pub fn new(
        name: &str,
        commodities: Vec<Commodity>,
        components: Vec<Component>,
        weather: Rc<dyn WeatherSource>,
    ) -> Result<Self> {
        let mut commodity_map = CommodityMap::new();
        for commodity in commodities {
            let id = commodity.id.clone();
            ensure!(
                commodity_map.insert(id.clone(), commodity).is_none(),
                "Duplicate commodity ID {id}"
            );
        }

        let mut component_map = ComponentMap::new();
        for component in components {
            let id = component.id().clone();
            ensure!(
                !commodity_map.contains_key(id.as_str()),
                "{id} is used as both a commodity and a component name"
            );
            for commodity_id in component.referenced_commodities() {
                ensure!(
                    commodity_map.contains_key(commodity_id),
                    "Component {id} references unknown commodity {commodity_id}"
                );
            }
            ensure!(
                component_map.insert(id.clone(), component).is_none(),
                "Duplicate component ID {id}"
            );
        }

        Ok(Self {
            name: name.to_string(),
            commodities: commodity_map,
            components: component_map,
            balance: Money(0.0),
            previous_balance: Money(0.0),
            starting_budget: Money(0.0),
            current_step: 0,
            weather,
        })
    }

    /// An independent copy of the system, sharing only its read-only weather data
    pub fn clone_template(&self) -> Self {
        self.clone()
    }

    /// Set the balance at the start of an episode
    pub fn set_initial_balance(&mut self, balance: Money) {
        self.balance = balance;
        self.previous_balance = balance;
        self.starting_budget = balance;
    }

    /// Move to the next step, returning the change of balance over the step just finished
    pub fn next_step(&mut self) -> Money {
        let change = self.balance - self.previous_balance;
        self.previous_balance = self.balance;
        self.current_step += 1;
        change
    }

    /// The name of the system
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current monetary balance
    pub fn balance(&self) -> Money {
        self.balance
    }

    /// The balance at the start of the current step
    pub fn previous_balance(&self) -> Money {
        self.previous_balance
    }

    /// The balance at the start of the episode
    pub fn starting_budget(&self) -> Money {
        self.starting_budget
    }

    /// The number of steps completed
    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    /// All commodities, in the order they were defined
    pub fn commodities(&self) -> &CommodityMap {
        &self.commodities
    }

    /// Mutable access to the commodities
    pub fn commodities_mut(&mut self) -> &mut CommodityMap {
        &mut self.commodities
    }

    /// All components, in the order they were defined
    pub fn components(&self) -> &ComponentMap {
        &self.components
    }

    /// Look up a commodity by ID
    pub fn commodity(&self, id: &CommodityID) -> Option<&Commodity> {
        self.commodities.get(id)
    }

    /// Look up a component by ID
    pub fn component(&self, id: &ComponentID) -> Option<&Component> {
        self.components.get(id)
    }

    /// Iterate over the conversion components
    pub fn iter_conversions(&self) -> impl Iterator<Item = &ConversionComponent> {
        self.components.values().filter_map(|component| match component {
            Component::Conversion(conversion) => Some(conversion),
            _ => None,
        })
    }

    /// Iterate over the storage components
    pub fn iter_storages(&self) -> impl Iterator<Item = &StorageComponent> {
        self.components.values().filter_map(|component| match component {
            Component::Storage(storage) => Some(storage),
            _ => None,
        })
    }

    /// Iterate over the generation components
    pub fn iter_generators(&self) -> impl Iterator<Item = &GenerationComponent> {
        self.components.values().filter_map(|component| match component {
            Component::Generation(generator) => Some(generator),
            _ => None,
        })
    }

    /// The state which component calculations read
    pub fn view(&self) -> SystemView<'_> {
        SystemView {
            commodities: &self.commodities,
            balance: self.balance,
        }
    }

    /// The weather coefficient of a generator for the current step
    pub fn weather_coefficient(&self, generator: &ComponentID) -> Option<Dimensionless> {
        self.weather.coefficient_for(generator, self.current_step)
    }

    /// The quantity of a commodity currently held
    pub fn available(&self, commodity_id: &CommodityID) -> Flow {
        self.view().available(commodity_id)
    }

    /// Operating costs accumulated by all components
    pub fn total_variable_costs(&self) -> Money {
        self.components
            .values()
            .map(Component::total_variable_costs)
            .sum()
    }

    /// Group the commodities by how they take part in the system
    pub fn commodity_sets(&self) -> CommoditySets {
        let mut sets = CommoditySets::default();
        for commodity in self.commodities.values() {
            let id = &commodity.id;
            let flags = [
                (commodity.purchasable, &mut sets.purchasable),
                (commodity.saleable, &mut sets.saleable),
                (commodity.emittable, &mut sets.emittable),
                (commodity.demanded, &mut sets.demanded),
                (commodity.available, &mut sets.available),
                (commodity.total_demand, &mut sets.total_demand),
            ];
            for (flag, set) in flags {
                if flag {
                    set.insert(id.clone());
                }
            }
        }

        for component in self.components.values() {
            match component {
                Component::Conversion(conversion) => {
                    sets.consumed.extend(conversion.inputs.keys().cloned());
                    sets.produced.extend(conversion.outputs.keys().cloned());
                }
                Component::Storage(storage) => {
                    sets.stored.insert(storage.stored_commodity.clone());
                }
                Component::Generation(generator) => {
                    sets.generated.insert(generator.generated_commodity.clone());
                }
            }
        }

        sets
    }

    /// Work out the feasible version of an action against the current state.
    ///
    /// This never changes the system.
    pub fn calculate(&self, action: &Action) -> Calculation<ActionValues> {
        match &action.target {
            ActionTarget::Commodity(id) => self.calculate_for_commodity(id, action),
            ActionTarget::Component(id) => self.calculate_for_component(id, action),
        }
    }

    fn calculate_for_commodity(
        &self,
        id: &CommodityID,
        action: &Action,
    ) -> Calculation<ActionValues> {
        let Some(commodity) = self.commodities.get(id) else {
            return Calculation::rejected(format!("Unknown commodity {id}"));
        };

        let quantity = Flow(action.magnitude);
        match action.capability {
            Capability::Purchase => commodity
                .calculate_purchase(quantity, self.balance)
                .map(ActionValues::Purchase),
            Capability::Sell => commodity.calculate_sale(quantity).map(ActionValues::Sale),
            Capability::Emit => commodity
                .calculate_emission(quantity)
                .map(ActionValues::Emission),
            capability => Calculation::rejected(format!("{id} does not allow {capability}")),
        }
    }

    fn calculate_for_component(
        &self,
        id: &ComponentID,
        action: &Action,
    ) -> Calculation<ActionValues> {
        let Some(component) = self.components.get(id) else {
            return Calculation::rejected(format!("Unknown component {id}"));
        };

        let view = self.view();
        match (component, action.capability) {
            (Component::Conversion(conversion), Capability::Ramp) => conversion
                .calculate_ramp(Dimensionless(action.magnitude), &view)
                .map(ActionValues::Ramp),
            (Component::Storage(storage), Capability::ChargeOrDischarge) => storage
                .calculate_charge_or_discharge(Flow(action.magnitude), &view)
                .map(ActionValues::ChargeOrDischarge),
            (Component::Generation(generator), Capability::Curtail) => generator
                .calculate_curtailment(
                    Flow(action.magnitude),
                    &view,
                    self.weather_coefficient(id),
                )
                .map(ActionValues::Curtail),
            (_, capability) => Calculation::rejected(format!("{id} does not allow {capability}")),
        }
    }

    /// Commit previously calculated values for `target`.
    ///
    /// # Panics
    ///
    /// If the values were not calculated for this kind of target.
    pub fn apply(&mut self, target: &ActionTarget, values: &ActionValues) {
        let Self {
            commodities,
            components,
            balance,
            ..
        } = self;

        match (target, values) {
            (_, ActionValues::None) => {}
            (ActionTarget::Commodity(id), ActionValues::Purchase(values)) => {
                commodities[id].apply_purchase(values, balance);
            }
            (ActionTarget::Commodity(id), ActionValues::Sale(values)) => {
                commodities[id].apply_sale(values, balance);
            }
            (ActionTarget::Commodity(id), ActionValues::Emission(values)) => {
                commodities[id].apply_emission(values);
            }
            (ActionTarget::Component(id), values) => match (&mut components[id], values) {
                (Component::Conversion(conversion), ActionValues::Ramp(values)) => {
                    conversion.apply_ramp(values, commodities, balance);
                }
                (Component::Storage(storage), ActionValues::ChargeOrDischarge(values)) => {
                    storage.apply_charge_or_discharge(values, commodities, balance);
                }
                (Component::Generation(generator), ActionValues::Curtail(values)) => {
                    generator.apply_curtailment(values, commodities, balance);
                }
                _ => panic!("Values for another kind of action cannot be applied to {id}"),
            },
            _ => panic!("Values for another kind of action cannot be applied to {target}"),
        }
    }
}

impl Display for PtxSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} at step {}: balance {:.2} (started with {:.2})",
            self.name, self.current_step, self.balance, self.starting_budget
        )?;
        let stocks = self
            .commodities
            .values()
            .map(|commodity| {
                format!(
                    "{} {:.3} {}",
                    commodity.id, commodity.available_quantity, commodity.unit
                )
            })
            .join(", ");
        writeln!(f, "Stocks: {stocks}")?;
        let states = self
            .components
            .values()
            .map(|component| {
                format!(
                    "{} ({}) {:.3}",
                    component.id(),
                    component.kind(),
                    component.operating_state()
                )
            })
            .join(", ");
        write!(f, "Components: {states}")
    }
}
