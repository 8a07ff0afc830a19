//! Generation components supply a commodity according to the weather (e.g. a wind turbine).
use super::{ComponentID, SystemView};
use crate::calculation::{
    Calculation, Notes, affordable_flow, cap_to_balance, check_finite, exceeds,
};
use crate::capability::{Capability, HasCapabilities};
use crate::commodity::{CommodityID, CommodityMap};
use crate::units::{Dimensionless, Flow, Money, MoneyPerFlow};

/// A weather-driven generator whose output may be curtailed
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationComponent {
    /// Unique identifier for the component
    pub id: ComponentID,
    /// Operating cost per unit generated
    pub variable_om: MoneyPerFlow,
    /// Output per step under ideal weather
    pub fixed_capacity: Flow,
    /// Operating costs accumulated so far
    pub total_variable_costs: Money,
    /// The commodity supplied
    pub generated_commodity: CommodityID,
    /// Whether output can be withheld
    pub curtailment_possible: bool,
    /// Potential output currently withheld
    pub curtailment: Flow,
    /// Total output the weather allowed
    pub potential_generation_quantity: Flow,
    /// Total output actually supplied
    pub generated_quantity: Flow,
}

/// Calculated values for curtailing a generator
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CurtailValues {
    /// Change of curtailment, positive to withhold more output
    pub delta: Flow,
    /// Curtailment after the change
    pub curtailment: Flow,
    /// Quantity supplied this step
    pub generated: Flow,
    /// Quantity the weather allows this step
    pub potential: Flow,
    /// Operating cost for this step
    pub cost: Money,
}

/// A proposed change of curtailment, progressively tightened
#[derive(Debug, Clone, PartialEq)]
struct CurtailCandidate {
    /// Output allowed by the weather, fixed for the calculation
    potential: Flow,
    delta: Flow,
    curtailment: Flow,
    generated: Flow,
    notes: Notes,
}

impl CurtailCandidate {
    /// A candidate for changing the generator's curtailment by `delta`
    fn new(generator: &GenerationComponent, potential: Flow, delta: Flow, notes: Notes) -> Self {
        let curtailment = generator.curtailment + delta;
        Self {
            potential,
            delta,
            curtailment,
            generated: (potential - curtailment).max(Flow(0.0)),
            notes,
        }
    }

    /// The same candidate with a different delta, noting why it changed
    fn with_delta(&self, generator: &GenerationComponent, delta: Flow, note: &str) -> Self {
        Self::new(generator, self.potential, delta, self.notes.with(note))
    }
}

type CurtailTighten = fn(&GenerationComponent, &SystemView, CurtailCandidate) -> CurtailCandidate;

/// Tighten steps for curtailment, applied in order
const CURTAIL_PIPELINE: [CurtailTighten; 3] = [
    tighten_to_current_output,
    tighten_to_current_curtailment,
    tighten_to_balance,
];

impl HasCapabilities for GenerationComponent {
    fn supported_capabilities(&self) -> &'static [Capability] {
        &[Capability::Curtail]
    }

    fn is_enabled(&self, capability: Capability) -> bool {
        capability == Capability::Curtail && self.curtailment_possible
    }
}

impl GenerationComponent {
    /// Create a new generator with no curtailment
    pub fn new(
        id: ComponentID,
        variable_om: MoneyPerFlow,
        fixed_capacity: Flow,
        generated_commodity: CommodityID,
        curtailment_possible: bool,
    ) -> Self {
        Self {
            id,
            variable_om,
            fixed_capacity,
            total_variable_costs: Money(0.0),
            generated_commodity,
            curtailment_possible,
            curtailment: Flow(0.0),
            potential_generation_quantity: Flow(0.0),
            generated_quantity: Flow(0.0),
        }
    }

    /// Work out the feasible version of changing curtailment by `delta` and what is generated.
    ///
    /// `weather` is the coefficient for the current step, or `None` if there is no weather data.
    pub fn calculate_curtailment(
        &self,
        delta: Flow,
        view: &SystemView,
        weather: Option<Dimensionless>,
    ) -> Calculation<CurtailValues> {
        if let Some(reason) = check_finite(delta.value(), &self.id) {
            return Calculation::rejected(reason);
        }
        if !self.curtailment_possible && delta != Flow(0.0) {
            return Calculation::rejected(format!("{} cannot be curtailed", self.id));
        }
        let Some(weather) = weather else {
            return Calculation::rejected(format!("No weather data for {}", self.id));
        };

        let potential = self.fixed_capacity * weather;
        let initial = CurtailCandidate::new(self, potential, delta, Notes::default());
        let candidate = CURTAIL_PIPELINE
            .iter()
            .fold(initial, |candidate, tighten| tighten(self, view, candidate));

        let cost = cap_to_balance(candidate.generated * self.variable_om, view.balance);
        let summary = format!(
            "{} generated {} of {} for {cost}",
            self.id, candidate.generated, self.generated_commodity
        );
        Calculation::completed(
            CurtailValues {
                delta: candidate.delta,
                curtailment: candidate.curtailment,
                generated: candidate.generated,
                potential,
                cost,
            },
            candidate.delta == delta,
            summary,
            &candidate.notes,
        )
    }

    /// Commit a curtailment calculated with [`GenerationComponent::calculate_curtailment`]
    pub fn apply_curtailment(
        &mut self,
        values: &CurtailValues,
        commodities: &mut CommodityMap,
        balance: &mut Money,
    ) {
        let commodity = &mut commodities[&self.generated_commodity];
        commodity.available_quantity += values.generated;
        commodity.counters.generated_quantity += values.generated;
        commodity.counters.total_generation_costs += values.cost;

        self.curtailment = values.curtailment;
        self.potential_generation_quantity += values.potential;
        self.generated_quantity += values.generated;
        self.total_variable_costs += values.cost;
        *balance -= values.cost;
    }
}

/// Limit additional curtailment to the output currently being generated and to capacity
fn tighten_to_current_output(
    generator: &GenerationComponent,
    _view: &SystemView,
    candidate: CurtailCandidate,
) -> CurtailCandidate {
    if candidate.delta <= Flow(0.0) {
        return candidate;
    }

    let current_output = (candidate.potential - generator.curtailment).max(Flow(0.0));
    let headroom = generator.fixed_capacity - generator.curtailment;
    let limit = current_output.min(headroom);
    if candidate.delta <= limit {
        return candidate;
    }

    candidate.with_delta(generator, limit, "limited by current output")
}

/// Limit the removal of curtailment to the curtailment currently applied
fn tighten_to_current_curtailment(
    generator: &GenerationComponent,
    _view: &SystemView,
    candidate: CurtailCandidate,
) -> CurtailCandidate {
    if candidate.delta >= Flow(0.0) || -candidate.delta <= generator.curtailment {
        return candidate;
    }

    candidate.with_delta(
        generator,
        -generator.curtailment,
        "limited by current curtailment",
    )
}

/// Curtail further until the output can be afforded.
///
/// This may reverse the requested direction.
fn tighten_to_balance(
    generator: &GenerationComponent,
    view: &SystemView,
    candidate: CurtailCandidate,
) -> CurtailCandidate {
    let cost = candidate.generated * generator.variable_om;
    if !exceeds(cost.value(), view.balance.value()) {
        return candidate;
    }

    let affordable = affordable_flow(view.balance, generator.variable_om).min(candidate.generated);
    if affordable == candidate.generated {
        return candidate;
    }

    let curtailment = candidate.potential - affordable;
    CurtailCandidate {
        potential: candidate.potential,
        delta: curtailment - generator.curtailment,
        curtailment,
        generated: affordable,
        notes: candidate.notes.with("limited by balance"),
    }
}
