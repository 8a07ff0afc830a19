//! The result type shared by every calculate/apply action pair.
//!
//! Calculating an action never mutates anything: it inspects the current state of the system and
//! works out the largest feasible version of what was requested. The returned [`Calculation`] is
//! then either committed with the matching apply function or discarded.
use crate::units::{Flow, Money, MoneyPerFlow};
use serde::Serialize;
use std::fmt::Display;

/// Relative tolerance used when checking a quantity that was derived from a limit against that
/// same limit
const TOLERANCE: f64 = 1e-9;

/// How the outcome of a calculation relates to the requested magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Resolution {
    /// The action can be carried out exactly as requested
    Exact,
    /// Only part of the requested action is feasible
    Clamped,
    /// The request itself is invalid (e.g. a negative purchase). Nothing may be applied.
    Rejected,
    /// The action cannot be carried out even after clamping. Nothing may be applied.
    Infeasible,
}

/// The result of calculating an action against the current system state
#[derive(Debug, Clone, PartialEq)]
pub struct Calculation<V> {
    /// The values to commit if the action is applied
    pub values: V,
    /// Human-readable description of the outcome
    pub status: String,
    /// How the outcome relates to the request
    pub resolution: Resolution,
}

impl<V: Default> Calculation<V> {
    /// A structurally invalid request
    pub fn rejected<S: Into<String>>(status: S) -> Self {
        Self {
            values: V::default(),
            status: status.into(),
            resolution: Resolution::Rejected,
        }
    }

    /// A request that cannot be carried out even after clamping
    pub fn infeasible<S: Into<String>>(status: S) -> Self {
        Self {
            values: V::default(),
            status: status.into(),
            resolution: Resolution::Infeasible,
        }
    }
}

impl<V> Calculation<V> {
    /// A feasible outcome.
    ///
    /// Any notes left by tighten steps are appended to `summary`.
    pub fn completed(values: V, exact: bool, summary: String, notes: &Notes) -> Self {
        let status = if notes.is_empty() {
            summary
        } else {
            format!("{summary} ({notes})")
        };

        Self {
            values,
            status,
            resolution: if exact {
                Resolution::Exact
            } else {
                Resolution::Clamped
            },
        }
    }

    /// Whether the values may be applied
    pub fn succeeded(&self) -> bool {
        matches!(self.resolution, Resolution::Exact | Resolution::Clamped)
    }

    /// Whether the values match the request exactly
    pub fn is_exact(&self) -> bool {
        self.resolution == Resolution::Exact
    }

    /// Convert the values, keeping the status and resolution
    pub fn map<U, F: FnOnce(V) -> U>(self, f: F) -> Calculation<U> {
        Calculation {
            values: f(self.values),
            status: self.status,
            resolution: self.resolution,
        }
    }
}

/// Notes collected while tightening a candidate
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Notes(Vec<String>);

impl Notes {
    /// Return a copy of these notes with another note added
    pub fn with<S: Into<String>>(&self, note: S) -> Self {
        let mut notes = self.0.clone();
        notes.push(note.into());
        Self(notes)
    }

    /// Whether no tighten step has changed the candidate
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for Notes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("; "))
    }
}

/// Check whether `value` is above `limit`, ignoring rounding noise
pub fn exceeds(value: f64, limit: f64) -> bool {
    value > limit + TOLERANCE * limit.abs().max(1.0)
}

/// The largest flow whose cost at `unit_cost` fits within `balance`.
///
/// Free flows are never limited, whatever the balance.
pub fn affordable_flow(balance: Money, unit_cost: MoneyPerFlow) -> Flow {
    if unit_cost <= MoneyPerFlow(0.0) {
        Flow(f64::INFINITY)
    } else if balance <= Money(0.0) {
        Flow(0.0)
    } else {
        balance / unit_cost
    }
}

/// Limit a cost to what `balance` can pay.
///
/// Re-deriving a cost from [`affordable_flow`] can overshoot the balance by rounding noise, which
/// must not reach the ledger.
pub fn cap_to_balance(cost: Money, balance: Money) -> Money {
    if cost > balance {
        balance.max(Money(0.0))
    } else {
        cost
    }
}

/// Reason for rejecting a requested magnitude that is not a finite number
pub fn check_finite(magnitude: f64, element: &impl Display) -> Option<String> {
    (!magnitude.is_finite()).then(|| format!("Requested amount for {element} is not a number"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_completed_status() {
        let exact = Calculation::completed(1, true, "Did it".into(), &Notes::default());
        assert_eq!(exact.status, "Did it");
        assert!(exact.succeeded() && exact.is_exact());

        let notes = Notes::default().with("a").with("b");
        let clamped = Calculation::completed(1, false, "Did some".into(), &notes);
        assert_eq!(clamped.status, "Did some (a; b)");
        assert!(clamped.succeeded() && !clamped.is_exact());
    }

    #[test]
    fn test_failures_carry_default_values() {
        let rejected: Calculation<Flow> = Calculation::rejected("no");
        assert_eq!(rejected.values, Flow(0.0));
        assert!(!rejected.succeeded());

        let infeasible: Calculation<Flow> = Calculation::infeasible("no");
        assert_eq!(infeasible.resolution, Resolution::Infeasible);
        assert!(!infeasible.is_exact());
    }

    #[rstest]
    #[case(1.0, 1.0, false)]
    #[case(1.0 + 1e-12, 1.0, false)]
    #[case(1.001, 1.0, true)]
    #[case(1e-12, 0.0, false)]
    #[case(1e-3, 0.0, true)]
    fn test_exceeds(#[case] value: f64, #[case] limit: f64, #[case] expected: bool) {
        assert_eq!(exceeds(value, limit), expected);
    }

    #[rstest]
    #[case(Money(2.0), MoneyPerFlow(2.0), Flow(1.0))]
    #[case(Money(0.0), MoneyPerFlow(2.0), Flow(0.0))]
    #[case(Money(-1.0), MoneyPerFlow(2.0), Flow(0.0))]
    #[case(Money(1.0), MoneyPerFlow(0.0), Flow(f64::INFINITY))]
    #[case(Money(0.0), MoneyPerFlow(0.0), Flow(f64::INFINITY))]
    #[case(Money(-1e-15), MoneyPerFlow(0.0), Flow(f64::INFINITY))]
    fn test_affordable_flow(
        #[case] balance: Money,
        #[case] unit_cost: MoneyPerFlow,
        #[case] expected: Flow,
    ) {
        assert_eq!(affordable_flow(balance, unit_cost), expected);
    }

    #[rstest]
    #[case(Money(1.0), Money(2.0), Money(1.0))]
    #[case(Money(2.0 + 1e-15), Money(2.0), Money(2.0))]
    #[case(Money(0.0), Money(-1e-15), Money(0.0))]
    fn test_cap_to_balance(#[case] cost: Money, #[case] balance: Money, #[case] expected: Money) {
        assert_eq!(cap_to_balance(cost, balance), expected);
    }

    #[test]
    fn test_affordable_cost_within_balance() {
        let balance = Money(50.22);
        let unit_cost = MoneyPerFlow(44.58);
        let cost = cap_to_balance(affordable_flow(balance, unit_cost) * unit_cost, balance);
        assert!(cost <= balance);
        assert!(balance - cost >= Money(0.0));
    }
}
