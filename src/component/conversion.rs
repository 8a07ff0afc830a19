//! Conversion components turn input commodities into output commodities (e.g. an electrolyser).
//!
//! A conversion runs at a load between `min_p` and `max_p`, expressed as a fraction of its fixed
//! capacity. Capacity is measured as throughput of the main input, and every other input and
//! output is a fixed multiple of it.
use super::{ComponentID, SystemView};
use crate::calculation::{
    Calculation, Notes, affordable_flow, cap_to_balance, check_finite, exceeds,
};
use crate::capability::{Capability, HasCapabilities};
use crate::commodity::{CommodityID, CommodityMap};
use crate::units::{Dimensionless, Flow, Money, MoneyPerFlow};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;

/// Load limits and the starting load of a conversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadLimits {
    /// Minimum load
    pub min_p: Dimensionless,
    /// Maximum load
    pub max_p: Dimensionless,
    /// Maximum increase in load per step
    pub ramp_up: Dimensionless,
    /// Maximum decrease in load per step
    pub ramp_down: Dimensionless,
    /// Load at the start of an episode
    pub initial_load: Dimensionless,
}

/// The commodities flowing in and out of a conversion
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionFlows {
    /// Input coefficients, in declaration order
    pub inputs: IndexMap<CommodityID, Dimensionless>,
    /// Output coefficients, in declaration order
    pub outputs: IndexMap<CommodityID, Dimensionless>,
    /// The input which defines the unit basis of all coefficients
    pub main_input: CommodityID,
    /// The output which operating costs are charged against
    pub main_output: CommodityID,
}

/// A unit which converts inputs into outputs at a controllable load
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionComponent {
    /// Unique identifier for the component
    pub id: ComponentID,
    /// Operating cost per unit of main output
    pub variable_om: MoneyPerFlow,
    /// Main input throughput per step at full load
    pub fixed_capacity: Flow,
    /// Operating costs accumulated so far
    pub total_variable_costs: Money,
    /// Current load as a fraction of fixed capacity
    pub load: Dimensionless,
    /// Maximum increase in load per step
    pub ramp_up: Dimensionless,
    /// Maximum decrease in load per step
    pub ramp_down: Dimensionless,
    /// Minimum load
    pub min_p: Dimensionless,
    /// Maximum load
    pub max_p: Dimensionless,
    /// Input coefficients relative to one unit of main input
    pub inputs: IndexMap<CommodityID, Dimensionless>,
    /// Output coefficients relative to one unit of main input
    pub outputs: IndexMap<CommodityID, Dimensionless>,
    /// The reference input commodity
    pub main_input: CommodityID,
    /// The reference output commodity
    pub main_output: CommodityID,
    /// Total quantity consumed of each input
    pub consumed_commodities: IndexMap<CommodityID, Flow>,
    /// Total quantity produced of each output
    pub produced_commodities: IndexMap<CommodityID, Flow>,
}

/// Calculated values for ramping a conversion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RampValues {
    /// The change in load which will be applied
    pub delta: Dimensionless,
    /// The load after ramping
    pub load: Dimensionless,
    /// Operating cost for this step
    pub cost: Money,
    /// Quantity of each input consumed
    pub consumption: Vec<(CommodityID, Flow)>,
    /// Quantity of each output produced
    pub production: Vec<(CommodityID, Flow)>,
}

/// A proposed change of load, progressively tightened
#[derive(Debug, Clone, PartialEq)]
struct RampCandidate {
    delta: Dimensionless,
    load: Dimensionless,
    notes: Notes,
}

impl RampCandidate {
    /// A candidate with a different delta, noting why it changed
    fn with_delta(&self, component: &ConversionComponent, delta: Dimensionless, note: &str) -> Self {
        Self {
            delta,
            load: component.load + delta,
            notes: self.notes.with(note),
        }
    }
}

type RampTighten = fn(&ConversionComponent, &SystemView, RampCandidate) -> RampCandidate;

/// The tighten steps for ramping, applied in order
const RAMP_PIPELINE: [RampTighten; 3] = [
    tighten_to_balance,
    tighten_to_ramp_limits,
    tighten_to_input_stocks,
];

impl HasCapabilities for ConversionComponent {
    fn supported_capabilities(&self) -> &'static [Capability] {
        &[Capability::Ramp]
    }
}

impl ConversionComponent {
    /// Create a new conversion.
    ///
    /// All coefficients are divided by the coefficient of the main input, so that one unit of
    /// capacity corresponds to one unit of main input.
    pub fn new(
        id: ComponentID,
        variable_om: MoneyPerFlow,
        fixed_capacity: Flow,
        limits: LoadLimits,
        flows: ConversionFlows,
    ) -> Result<Self> {
        ensure!(
            flows.outputs.contains_key(&flows.main_output),
            "Main output {} of {id} is not one of its outputs",
            flows.main_output
        );
        let main_coefficient = *flows.inputs.get(&flows.main_input).with_context(|| {
            format!(
                "Main input {} of {id} is not one of its inputs",
                flows.main_input
            )
        })?;
        ensure!(
            flows
                .inputs
                .values()
                .chain(flows.outputs.values())
                .all(|coeff| coeff.is_finite() && *coeff > Dimensionless(0.0)),
            "Coefficients for {id} must be positive numbers"
        );

        let normalise = |coefficients: IndexMap<CommodityID, Dimensionless>| {
            coefficients
                .into_iter()
                .map(|(commodity_id, coeff)| (commodity_id, coeff / main_coefficient))
                .collect::<IndexMap<_, _>>()
        };
        let inputs = normalise(flows.inputs);
        let outputs = normalise(flows.outputs);
        let zeroed = |coefficients: &IndexMap<CommodityID, Dimensionless>| {
            coefficients
                .keys()
                .map(|commodity_id| (commodity_id.clone(), Flow(0.0)))
                .collect::<IndexMap<_, _>>()
        };

        Ok(Self {
            id,
            variable_om,
            fixed_capacity,
            total_variable_costs: Money(0.0),
            load: limits.initial_load,
            ramp_up: limits.ramp_up,
            ramp_down: limits.ramp_down,
            min_p: limits.min_p,
            max_p: limits.max_p,
            consumed_commodities: zeroed(&inputs),
            produced_commodities: zeroed(&outputs),
            inputs,
            outputs,
            main_input: flows.main_input,
            main_output: flows.main_output,
        })
    }

    /// Quantity of main output per unit of main input
    pub fn main_output_coefficient(&self) -> Dimensionless {
        self.outputs[&self.main_output]
    }

    /// Operating cost per unit of main input throughput
    fn cost_per_throughput(&self) -> MoneyPerFlow {
        self.main_output_coefficient() * self.variable_om
    }

    /// Work out the feasible version of changing the load by `delta`.
    ///
    /// A `delta` of zero keeps the current load, but still consumes and produces at that load.
    pub fn calculate_ramp(&self, delta: Dimensionless, view: &SystemView) -> Calculation<RampValues> {
        if let Some(reason) = check_finite(delta.value(), &self.id) {
            return Calculation::rejected(reason);
        }

        let initial = RampCandidate {
            delta,
            load: self.load + delta,
            notes: Notes::default(),
        };
        let candidate = RAMP_PIPELINE
            .iter()
            .fold(initial, |candidate, tighten| tighten(self, view, candidate));

        let throughput = self.fixed_capacity * candidate.load;
        let cost = throughput * self.cost_per_throughput();
        if exceeds(cost.value(), view.balance.value()) {
            return Calculation::infeasible(format!(
                "{} cannot afford to run at load {} (cost {cost}, balance {})",
                self.id, candidate.load, view.balance
            ));
        }
        let cost = cap_to_balance(cost, view.balance);

        let consumption = self
            .inputs
            .iter()
            .map(|(commodity_id, coeff)| {
                let needed = throughput * *coeff;
                let available = view.available(commodity_id);
                if exceeds(needed.value(), available.value()) {
                    Err(format!(
                        "{} needs {needed} of {commodity_id} but only {available} is available",
                        self.id
                    ))
                } else {
                    Ok((commodity_id.clone(), needed.min(available)))
                }
            })
            .collect::<Result<Vec<_>, _>>();
        let consumption = match consumption {
            Ok(consumption) => consumption,
            Err(reason) => return Calculation::infeasible(reason),
        };
        let production = self
            .outputs
            .iter()
            .map(|(commodity_id, coeff)| (commodity_id.clone(), throughput * *coeff))
            .collect();

        let summary = format!(
            "{} ramped by {} to load {} for {cost}",
            self.id, candidate.delta, candidate.load
        );
        Calculation::completed(
            RampValues {
                delta: candidate.delta,
                load: candidate.load,
                cost,
                consumption,
                production,
            },
            candidate.delta == delta,
            summary,
            &candidate.notes,
        )
    }

    /// Commit a ramp calculated with [`ConversionComponent::calculate_ramp`]
    pub fn apply_ramp(
        &mut self,
        values: &RampValues,
        commodities: &mut CommodityMap,
        balance: &mut Money,
    ) {
        for (commodity_id, quantity) in &values.consumption {
            let commodity = &mut commodities[commodity_id];
            commodity.available_quantity -= *quantity;
            commodity.counters.consumed_quantity += *quantity;
            *self
                .consumed_commodities
                .entry(commodity_id.clone())
                .or_default() += *quantity;
        }
        for (commodity_id, quantity) in &values.production {
            let commodity = &mut commodities[commodity_id];
            commodity.available_quantity += *quantity;
            commodity.counters.produced_quantity += *quantity;
            *self
                .produced_commodities
                .entry(commodity_id.clone())
                .or_default() += *quantity;
        }

        commodities[&self.main_output]
            .counters
            .total_production_costs += values.cost;
        self.load = values.load;
        self.total_variable_costs += values.cost;
        *balance -= values.cost;
    }
}

/// Limit the delta so that the load is affordable, judged by the cost at the current load
fn tighten_to_balance(
    component: &ConversionComponent,
    view: &SystemView,
    candidate: RampCandidate,
) -> RampCandidate {
    let unit_cost = component.cost_per_throughput();
    let current_cost = component.fixed_capacity * component.load * unit_cost;
    if !exceeds(current_cost.value(), view.balance.value()) {
        return candidate;
    }

    let affordable_load = affordable_flow(view.balance, unit_cost) / component.fixed_capacity;
    let delta = candidate.delta.min(affordable_load - component.load);
    if delta == candidate.delta {
        return candidate;
    }

    candidate.with_delta(component, delta, "limited by balance")
}

/// Limit the delta to the ramp rates and the resulting load to `[min_p, max_p]`
fn tighten_to_ramp_limits(
    component: &ConversionComponent,
    _view: &SystemView,
    candidate: RampCandidate,
) -> RampCandidate {
    let mut candidate = candidate;
    if candidate.delta > Dimensionless(0.0) {
        if candidate.delta > component.ramp_up {
            candidate = candidate.with_delta(component, component.ramp_up, "limited by ramp-up");
        }
        if candidate.load > component.max_p {
            let delta = component.max_p - component.load;
            candidate = candidate.with_delta(component, delta, "limited by maximum load");
        }
    } else if candidate.delta < Dimensionless(0.0) {
        if -candidate.delta > component.ramp_down {
            candidate =
                candidate.with_delta(component, -component.ramp_down, "limited by ramp-down");
        }
        if candidate.load < component.min_p {
            let delta = component.min_p - component.load;
            candidate = candidate.with_delta(component, delta, "limited by minimum load");
        }
    }

    candidate
}

/// Lower the load until each input in turn can be supplied from stock.
///
/// Inputs are handled one at a time in declaration order, and the load is never lowered past
/// what a single step of ramping down allows.
fn tighten_to_input_stocks(
    component: &ConversionComponent,
    view: &SystemView,
    candidate: RampCandidate,
) -> RampCandidate {
    let floor = (component.load - component.ramp_down).max(component.min_p);

    component
        .inputs
        .iter()
        .fold(candidate, |candidate, (commodity_id, coeff)| {
            let available = view.available(commodity_id);
            let needed = component.fixed_capacity * candidate.load * *coeff;
            if needed <= available {
                return candidate;
            }

            let mut load = available / (component.fixed_capacity * *coeff);
            if load < component.load {
                load = load.max(floor);
            }
            let load = load.min(candidate.load);
            if load == candidate.load {
                return candidate;
            }

            let note = format!("limited by available {commodity_id}");
            candidate.with_delta(component, load - component.load, &note)
        })
}
