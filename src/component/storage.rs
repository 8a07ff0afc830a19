//! Storage components hold a commodity between steps (e.g. a battery or a hydrogen tank).
use super::{ComponentID, SystemView};
use crate::calculation::{
    Calculation, Notes, affordable_flow, cap_to_balance, check_finite, exceeds,
};
use crate::capability::{Capability, HasCapabilities};
use crate::commodity::{CommodityID, CommodityMap};
use crate::units::{Dimensionless, Flow, Money, MoneyPerFlow};

/// State-of-charge limits, efficiencies and rates of a storage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageLimits {
    /// Minimum state of charge
    pub min_soc: Dimensionless,
    /// Maximum state of charge
    pub max_soc: Dimensionless,
    /// Fraction of charged commodity which ends up stored
    pub charging_efficiency: Dimensionless,
    /// Fraction of discharged charge which is delivered
    pub discharging_efficiency: Dimensionless,
    /// Maximum charge or discharge per step relative to capacity
    pub ratio_capacity_p: Dimensionless,
    /// State of charge at the start of an episode
    pub initial_soc: Dimensionless,
}

/// A unit which stores a single commodity
#[derive(Debug, Clone, PartialEq)]
pub struct StorageComponent {
    /// Unique identifier for the component
    pub id: ComponentID,
    /// Operating cost per unit charged
    pub variable_om: MoneyPerFlow,
    /// Storage capacity
    pub fixed_capacity: Flow,
    /// Operating costs accumulated so far
    pub total_variable_costs: Money,
    /// Quantity currently stored
    pub charge_state: Flow,
    /// Minimum state of charge
    pub min_soc: Dimensionless,
    /// Maximum state of charge
    pub max_soc: Dimensionless,
    /// Fraction of charged commodity which ends up stored
    pub charging_efficiency: Dimensionless,
    /// Fraction of discharged charge which is delivered
    pub discharging_efficiency: Dimensionless,
    /// Maximum change in charge per step relative to capacity
    pub ratio_capacity_p: Dimensionless,
    /// The commodity held in this storage
    pub stored_commodity: CommodityID,
    /// Total quantity of commodity taken in
    pub charged_quantity: Flow,
    /// Total quantity of commodity delivered
    pub discharged_quantity: Flow,
}

/// Whether a storage is charging or discharging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageDirection {
    /// Taking the commodity from stock
    #[default]
    Charge,
    /// Returning the commodity to stock
    Discharge,
}

/// Calculated values for charging or discharging a storage
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StorageValues {
    /// Whether the storage charges or discharges
    pub direction: StorageDirection,
    /// Quantity of commodity taken from stock (charging) or delivered to stock (discharging)
    pub commodity_quantity: Flow,
    /// Signed change of `charge_state`
    pub charge_delta: Flow,
    /// Operating cost, which is zero when discharging
    pub cost: Money,
}

/// A proposed transfer, progressively tightened.
///
/// `external` is measured on the commodity side and `internal` on the storage side; the two
/// differ by the efficiency for the direction of transfer.
#[derive(Debug, Clone, PartialEq)]
struct StorageCandidate {
    external: Flow,
    internal: Flow,
    notes: Notes,
}

type StorageTighten = fn(&StorageComponent, &SystemView, StorageCandidate) -> StorageCandidate;

/// Tighten steps for charging, applied in order
const CHARGE_PIPELINE: [StorageTighten; 4] = [
    tighten_charge_to_rate,
    tighten_charge_to_headroom,
    tighten_charge_to_stock,
    tighten_charge_to_balance,
];

/// Tighten steps for discharging, applied in order
const DISCHARGE_PIPELINE: [StorageTighten; 2] =
    [tighten_discharge_to_rate, tighten_discharge_to_reserve];

impl HasCapabilities for StorageComponent {
    fn supported_capabilities(&self) -> &'static [Capability] {
        &[Capability::ChargeOrDischarge]
    }
}

impl StorageComponent {
    /// Create a new storage, charged to its initial state of charge
    pub fn new(
        id: ComponentID,
        variable_om: MoneyPerFlow,
        fixed_capacity: Flow,
        stored_commodity: CommodityID,
        limits: StorageLimits,
    ) -> Self {
        Self {
            id,
            variable_om,
            fixed_capacity,
            total_variable_costs: Money(0.0),
            charge_state: fixed_capacity * limits.initial_soc,
            min_soc: limits.min_soc,
            max_soc: limits.max_soc,
            charging_efficiency: limits.charging_efficiency,
            discharging_efficiency: limits.discharging_efficiency,
            ratio_capacity_p: limits.ratio_capacity_p,
            stored_commodity,
            charged_quantity: Flow(0.0),
            discharged_quantity: Flow(0.0),
        }
    }

    /// The charge held above the minimum state of charge
    pub fn reserve(&self) -> Flow {
        (self.charge_state - self.fixed_capacity * self.min_soc).max(Flow(0.0))
    }

    /// The most that can be charged or discharged in one step, measured inside the storage
    fn max_rate(&self) -> Flow {
        self.fixed_capacity * self.ratio_capacity_p
    }

    /// A charging candidate for taking `external` from stock
    fn charge_candidate(&self, external: Flow, notes: Notes) -> StorageCandidate {
        StorageCandidate {
            external,
            internal: external * self.charging_efficiency,
            notes,
        }
    }

    /// A charging candidate for storing `internal`
    fn charge_candidate_stored(&self, internal: Flow, notes: Notes) -> StorageCandidate {
        StorageCandidate {
            external: internal / self.charging_efficiency,
            internal,
            notes,
        }
    }

    /// A discharging candidate for removing `internal` from storage
    fn discharge_candidate(&self, internal: Flow, notes: Notes) -> StorageCandidate {
        StorageCandidate {
            external: internal * self.discharging_efficiency,
            internal,
            notes,
        }
    }

    /// Work out the feasible version of charging (positive) or discharging (negative) `quantity`.
    ///
    /// `quantity` is measured on the commodity side: the amount taken from stock when charging or
    /// the amount delivered to stock when discharging.
    pub fn calculate_charge_or_discharge(
        &self,
        quantity: Flow,
        view: &SystemView,
    ) -> Calculation<StorageValues> {
        if let Some(reason) = check_finite(quantity.value(), &self.id) {
            return Calculation::rejected(reason);
        }
        if quantity == Flow(0.0) {
            return Calculation::rejected(format!("Cannot charge or discharge {} by zero", self.id));
        }

        if quantity > Flow(0.0) {
            let initial = self.charge_candidate(quantity, Notes::default());
            let candidate = CHARGE_PIPELINE
                .iter()
                .fold(initial, |candidate, tighten| tighten(self, view, candidate));
            let cost = cap_to_balance(candidate.external * self.variable_om, view.balance);
            let summary = format!(
                "{} charged {} of {} for {cost}",
                self.id, candidate.external, self.stored_commodity
            );
            Calculation::completed(
                StorageValues {
                    direction: StorageDirection::Charge,
                    commodity_quantity: candidate.external,
                    charge_delta: candidate.internal,
                    cost,
                },
                candidate.external == quantity,
                summary,
                &candidate.notes,
            )
        } else {
            let delivered = -quantity;
            let initial = StorageCandidate {
                external: delivered,
                internal: delivered / self.discharging_efficiency,
                notes: Notes::default(),
            };
            let candidate = DISCHARGE_PIPELINE
                .iter()
                .fold(initial, |candidate, tighten| tighten(self, view, candidate));
            let summary = format!(
                "{} discharged {} of {}",
                self.id, candidate.external, self.stored_commodity
            );
            Calculation::completed(
                StorageValues {
                    direction: StorageDirection::Discharge,
                    commodity_quantity: candidate.external,
                    charge_delta: -candidate.internal,
                    cost: Money(0.0),
                },
                candidate.external == delivered,
                summary,
                &candidate.notes,
            )
        }
    }

    /// Commit a transfer calculated with [`StorageComponent::calculate_charge_or_discharge`]
    pub fn apply_charge_or_discharge(
        &mut self,
        values: &StorageValues,
        commodities: &mut CommodityMap,
        balance: &mut Money,
    ) {
        let commodity = &mut commodities[&self.stored_commodity];
        self.charge_state += values.charge_delta;
        match values.direction {
            StorageDirection::Charge => {
                commodity.available_quantity -= values.commodity_quantity;
                commodity.counters.charged_quantity += values.commodity_quantity;
                commodity.counters.total_storage_costs += values.cost;
                self.charged_quantity += values.commodity_quantity;
                self.total_variable_costs += values.cost;
                *balance -= values.cost;
            }
            StorageDirection::Discharge => {
                commodity.available_quantity += values.commodity_quantity;
                commodity.counters.discharged_quantity += values.commodity_quantity;
                self.discharged_quantity += values.commodity_quantity;
            }
        }
    }
}

/// Limit the quantity stored to the maximum rate
fn tighten_charge_to_rate(
    storage: &StorageComponent,
    _view: &SystemView,
    candidate: StorageCandidate,
) -> StorageCandidate {
    let max_rate = storage.max_rate();
    if candidate.internal <= max_rate {
        return candidate;
    }

    storage.charge_candidate_stored(max_rate, candidate.notes.with("limited by charging rate"))
}

/// Limit the quantity stored to the space left below the maximum state of charge
fn tighten_charge_to_headroom(
    storage: &StorageComponent,
    _view: &SystemView,
    candidate: StorageCandidate,
) -> StorageCandidate {
    let headroom =
        (storage.fixed_capacity * storage.max_soc - storage.charge_state).max(Flow(0.0));
    if candidate.internal <= headroom {
        return candidate;
    }

    storage.charge_candidate_stored(headroom, candidate.notes.with("limited by headroom"))
}

/// Limit the quantity taken to what is in stock
fn tighten_charge_to_stock(
    storage: &StorageComponent,
    view: &SystemView,
    candidate: StorageCandidate,
) -> StorageCandidate {
    let available = view.available(&storage.stored_commodity);
    if candidate.external <= available {
        return candidate;
    }

    let note = format!("limited by available {}", storage.stored_commodity);
    storage.charge_candidate(available, candidate.notes.with(note))
}

/// Limit the quantity taken to what can be afforded
fn tighten_charge_to_balance(
    storage: &StorageComponent,
    view: &SystemView,
    candidate: StorageCandidate,
) -> StorageCandidate {
    let cost = candidate.external * storage.variable_om;
    if !exceeds(cost.value(), view.balance.value()) {
        return candidate;
    }

    let affordable = affordable_flow(view.balance, storage.variable_om).min(candidate.external);
    storage.charge_candidate(affordable, candidate.notes.with("limited by balance"))
}

/// Limit the quantity removed to the maximum rate
fn tighten_discharge_to_rate(
    storage: &StorageComponent,
    _view: &SystemView,
    candidate: StorageCandidate,
) -> StorageCandidate {
    let max_rate = storage.max_rate();
    if candidate.internal <= max_rate {
        return candidate;
    }

    storage.discharge_candidate(max_rate, candidate.notes.with("limited by discharging rate"))
}

/// Limit the quantity removed to the charge held above the minimum state of charge
fn tighten_discharge_to_reserve(
    storage: &StorageComponent,
    _view: &SystemView,
    candidate: StorageCandidate,
) -> StorageCandidate {
    let reserve = storage.reserve();
    if candidate.internal <= reserve {
        return candidate;
    }

    storage.discharge_candidate(reserve, candidate.notes.with("limited by state of charge"))
}
