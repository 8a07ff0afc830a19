//! Resolving all the actions of one step, stage by stage.
use super::dispatch::dispatch_conversions;
use crate::action::{Action, ActionValues};
use crate::calculation::{Calculation, Resolution};
use crate::capability::Capability;
use crate::system::PtxSystem;
use crate::units::Money;
use itertools::Itertools;
use log::{debug, trace};
use serde::Serialize;
use strum::{EnumIter, IntoEnumIterator};

/// The stages of a step, in the order they are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    /// Buying commodities
    Purchase,
    /// Generating from the weather, with any curtailment
    Generation,
    /// Returning stored commodities to stock
    Discharge,
    /// Running conversions
    Conversion,
    /// Storing commodities
    Charge,
    /// Selling commodities
    Sale,
    /// Releasing commodities into the environment
    Emission,
}

impl Stage {
    /// The stage in which an action is resolved
    pub fn of(action: &Action) -> Self {
        match action.capability {
            Capability::Purchase => Self::Purchase,
            Capability::Curtail => Self::Generation,
            Capability::ChargeOrDischarge if action.magnitude < 0.0 => Self::Discharge,
            Capability::ChargeOrDischarge => Self::Charge,
            Capability::Ramp => Self::Conversion,
            Capability::Sell => Self::Sale,
            Capability::Emit => Self::Emission,
        }
    }
}

/// What happened to one requested action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRecord {
    /// The element acted on
    pub element: String,
    /// The capability requested
    pub capability: Capability,
    /// The requested magnitude
    pub requested: f64,
    /// The magnitude achieved
    pub achieved: f64,
    /// How the request was resolved
    pub resolution: Resolution,
    /// Human-readable status
    pub status: String,
}

impl ActionRecord {
    /// Record the calculation for an action
    pub fn new(action: &Action, calculation: &Calculation<ActionValues>) -> Self {
        Self {
            element: action.target.to_string(),
            capability: action.capability,
            requested: action.magnitude,
            achieved: calculation.values.achieved(),
            resolution: calculation.resolution,
            status: calculation.status.clone(),
        }
    }
}

/// The result of resolving one step
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// One record per action, in the order they were resolved
    pub records: Vec<ActionRecord>,
    /// False if any action was infeasible
    pub success: bool,
    /// The change of balance over the step
    pub balance_delta: Money,
}

/// Group actions by stage, in stage order, keeping the order of actions within a stage
pub fn stage_actions(actions: Vec<Action>) -> Vec<(Stage, Vec<Action>)> {
    let mut by_stage = actions.into_iter().into_group_map_by(Stage::of);
    Stage::iter()
        .filter_map(|stage| Some((stage, by_stage.remove(&stage)?)))
        .collect()
}

/// Calculate and apply a single action, returning its record
fn resolve_action(system: &mut PtxSystem, action: &Action) -> ActionRecord {
    let calculation = system.calculate(action);
    if calculation.succeeded() {
        system.apply(&action.target, &calculation.values);
    }
    if calculation.resolution == Resolution::Clamped {
        trace!("{action}: {}", calculation.status);
    }
    ActionRecord::new(action, &calculation)
}

/// Resolve all of a step's actions against `system` and move it on to the next step
pub fn resolve_step(system: &mut PtxSystem, actions: Vec<Action>) -> StepOutcome {
    let mut records = Vec::with_capacity(actions.len());
    for (stage, actions) in stage_actions(actions) {
        if stage == Stage::Conversion {
            let report = dispatch_conversions(system, actions);
            records.extend(report.records);
        } else {
            records.extend(actions.iter().map(|action| resolve_action(system, action)));
        }
    }

    let success = records
        .iter()
        .all(|record| record.resolution != Resolution::Infeasible);
    let balance_delta = system.next_step();
    debug!("{system}");

    StepOutcome {
        records,
        success,
        balance_delta,
    }
}
