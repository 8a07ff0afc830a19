//! Resolves a batch of conversion ramp requests against each other.
//!
//! Each ramp changes commodity stocks and the balance available to the others, so the order in
//! which they are applied matters. Requests which can be met exactly are applied first, sweeping
//! the batch repeatedly because one exact request can free what another one needed. When no
//! request can be met exactly, the one closest to its request is applied and the sweeping starts
//! again.
use super::stage::ActionRecord;
use crate::action::{Action, ActionValues};
use crate::calculation::Calculation;
use crate::system::PtxSystem;
use log::{debug, trace};

/// The outcome of dispatching a batch of conversion requests
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReport {
    /// One record per request, in the order the requests were resolved
    pub records: Vec<ActionRecord>,
    /// The number of outer rounds needed
    pub rounds: u32,
}

/// The closest inexact request seen in the latest sweep
struct Fallback {
    index: usize,
    deviation: f64,
    calculation: Calculation<ActionValues>,
}

/// How far a calculated action is from what was requested. Failed actions are furthest of all.
fn deviation(action: &Action, calculation: &Calculation<ActionValues>) -> f64 {
    if calculation.succeeded() {
        (calculation.values.achieved() - action.magnitude).abs()
    } else {
        f64::INFINITY
    }
}

/// Sweep the pending requests, applying every one that can be met exactly.
///
/// Returns whether anything was applied and the closest inexact request of the sweep.
fn sweep(
    system: &mut PtxSystem,
    pending: &mut Vec<Action>,
    records: &mut Vec<ActionRecord>,
) -> (bool, Option<Fallback>) {
    let mut progress = false;
    let mut best: Option<Fallback> = None;
    let mut index = 0;
    while index < pending.len() {
        let action = &pending[index];
        let calculation = system.calculate(action);
        if calculation.is_exact() {
            system.apply(&action.target, &calculation.values);
            let action = pending.remove(index);
            records.push(ActionRecord::new(&action, &calculation));
            progress = true;
            continue;
        }

        let deviation = deviation(action, &calculation);
        if best.as_ref().is_none_or(|best| deviation < best.deviation) {
            best = Some(Fallback {
                index,
                deviation,
                calculation,
            });
        }
        index += 1;
    }

    (progress, best)
}

/// Resolve a batch of conversion ramp requests, applying them to `system`.
///
/// Each request is removed from the batch exactly once. Requests which fail are recorded but
/// never applied.
pub fn dispatch_conversions(system: &mut PtxSystem, actions: Vec<Action>) -> DispatchReport {
    let mut pending = actions;
    let mut records = Vec::with_capacity(pending.len());
    let mut rounds = 0;

    while !pending.is_empty() {
        rounds += 1;

        // Fallback indices are only valid for a sweep in which nothing was removed
        let fallback = loop {
            let (progress, best) = sweep(system, &mut pending, &mut records);
            if !progress {
                break best;
            }
        };

        let Some(Fallback {
            index,
            deviation,
            calculation,
        }) = fallback
        else {
            break;
        };
        let action = pending.remove(index);
        if calculation.succeeded() {
            trace!("Applying closest request {action} (off by {deviation})");
            system.apply(&action.target, &calculation.values);
        }
        records.push(ActionRecord::new(&action, &calculation));
    }

    debug!(
        "Dispatched {} conversion requests in {rounds} rounds",
        records.len()
    );
    DispatchReport { records, rounds }
}
