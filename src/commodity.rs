//! Commodities are the resources which flow between the components of a PtX system and in and out
//! of the system through trade.
use crate::calculation::{
    Calculation, Notes, affordable_flow, cap_to_balance, check_finite, exceeds,
};
use crate::capability::{Capability, HasCapabilities};
use crate::id::define_id_type;
use crate::units::{Flow, Money, MoneyPerFlow};
use indexmap::IndexMap;
use serde::Serialize;

define_id_type! {CommodityID}

/// A map of [`Commodity`]s, keyed by commodity ID
pub type CommodityMap = IndexMap<CommodityID, Commodity>;

/// A resource that can be traded, consumed, produced or stored
#[derive(Debug, Clone, PartialEq)]
pub struct Commodity {
    /// Unique identifier for the commodity (e.g. "Hydrogen")
    pub id: CommodityID,
    /// The unit in which quantities of this commodity are measured
    pub unit: String,
    /// Whether the commodity can be bought
    pub purchasable: bool,
    /// Whether the commodity can be sold
    pub saleable: bool,
    /// Whether the commodity can be released into the environment
    pub emittable: bool,
    /// Whether there is a demand for this commodity
    pub demanded: bool,
    /// Whether the commodity is freely available without limitation or price
    pub available: bool,
    /// Whether `demand` is a total over the episode rather than a per-step amount
    pub total_demand: bool,
    /// Price paid per unit purchased
    pub purchase_price: MoneyPerFlow,
    /// Price received per unit sold
    pub sale_price: MoneyPerFlow,
    /// Demand for this commodity
    pub demand: Flow,
    /// Quantity currently held in the system
    pub available_quantity: Flow,
    /// Running totals of flows, costs and revenues
    pub counters: CommodityCounters,
}

/// Accumulated flows, costs and revenues for a commodity
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CommodityCounters {
    /// Total quantity bought
    pub purchased_quantity: Flow,
    /// Total spent on purchases
    pub purchase_costs: Money,
    /// Total quantity sold
    pub sold_quantity: Flow,
    /// Total revenue from sales
    pub selling_revenue: Money,
    /// Total quantity released into the environment
    pub emitted_quantity: Flow,
    /// Total quantity used as a conversion input
    pub consumed_quantity: Flow,
    /// Total quantity made as a conversion output
    pub produced_quantity: Flow,
    /// Operating costs of conversions whose main output is this commodity
    pub total_production_costs: Money,
    /// Total quantity supplied by generators
    pub generated_quantity: Flow,
    /// Operating costs of generators supplying this commodity
    pub total_generation_costs: Money,
    /// Total quantity taken from stock by storages
    pub charged_quantity: Flow,
    /// Total quantity returned to stock by storages
    pub discharged_quantity: Flow,
    /// Operating costs of storages holding this commodity
    pub total_storage_costs: Money,
}

/// Calculated values for purchasing, selling or emitting a commodity
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TradeValues {
    /// The quantity moved
    pub quantity: Flow,
    /// The money paid (purchase) or received (sale). Zero for emissions.
    pub money: Money,
}

const COMMODITY_CAPABILITIES: &[Capability] =
    &[Capability::Purchase, Capability::Sell, Capability::Emit];

impl HasCapabilities for Commodity {
    fn supported_capabilities(&self) -> &'static [Capability] {
        COMMODITY_CAPABILITIES
    }

    fn is_enabled(&self, capability: Capability) -> bool {
        match capability {
            Capability::Purchase => self.purchasable,
            Capability::Sell => self.saleable,
            Capability::Emit => self.emittable,
            _ => false,
        }
    }
}

impl Commodity {
    /// Create a commodity with no capabilities, prices or stock
    pub fn new(id: CommodityID, unit: &str) -> Self {
        Self {
            id,
            unit: unit.to_string(),
            purchasable: false,
            saleable: false,
            emittable: false,
            demanded: false,
            available: false,
            total_demand: false,
            purchase_price: MoneyPerFlow(0.0),
            sale_price: MoneyPerFlow(0.0),
            demand: Flow(0.0),
            available_quantity: Flow(0.0),
            counters: CommodityCounters::default(),
        }
    }

    /// Reason for rejecting a request outright, if any
    fn check_request(&self, capability: Capability, quantity: Flow) -> Option<String> {
        if !self.is_enabled(capability) {
            return Some(format!("{} does not allow {capability}", self.id));
        }
        if let Some(reason) = check_finite(quantity.value(), &self.id) {
            return Some(reason);
        }
        (quantity < Flow(0.0)).then(|| {
            format!(
                "Cannot {capability} a negative quantity ({quantity}) of {}",
                self.id
            )
        })
    }

    /// Limit a quantity leaving the system to what is in stock
    fn limit_to_stock(&self, quantity: Flow, notes: &Notes) -> (Flow, Notes) {
        if quantity > self.available_quantity {
            let note = format!(
                "limited to available quantity {} {}",
                self.available_quantity, self.unit
            );
            (self.available_quantity, notes.with(note))
        } else {
            (quantity, notes.clone())
        }
    }

    /// Work out how much of `quantity` can be bought with `balance`
    pub fn calculate_purchase(&self, quantity: Flow, balance: Money) -> Calculation<TradeValues> {
        if let Some(reason) = self.check_request(Capability::Purchase, quantity) {
            return Calculation::rejected(reason);
        }

        let mut notes = Notes::default();
        let mut quantity = quantity;
        if exceeds((quantity * self.purchase_price).value(), balance.value()) {
            quantity = affordable_flow(balance, self.purchase_price).min(quantity);
            notes = notes.with(format!("limited by balance {balance}"));
        }
        let cost = cap_to_balance(quantity * self.purchase_price, balance);

        let summary = format!(
            "Purchased {quantity} {} of {} for {cost}",
            self.unit, self.id
        );
        Calculation::completed(
            TradeValues {
                quantity,
                money: cost,
            },
            notes.is_empty(),
            summary,
            &notes,
        )
    }

    /// Commit a purchase calculated with [`Commodity::calculate_purchase`]
    pub fn apply_purchase(&mut self, values: &TradeValues, balance: &mut Money) {
        self.available_quantity += values.quantity;
        self.counters.purchased_quantity += values.quantity;
        self.counters.purchase_costs += values.money;
        *balance -= values.money;
    }

    /// Work out how much of `quantity` can be sold from stock
    pub fn calculate_sale(&self, quantity: Flow) -> Calculation<TradeValues> {
        if let Some(reason) = self.check_request(Capability::Sell, quantity) {
            return Calculation::rejected(reason);
        }

        let (quantity, notes) = self.limit_to_stock(quantity, &Notes::default());
        let revenue = quantity * self.sale_price;
        let summary = format!("Sold {quantity} {} of {} for {revenue}", self.unit, self.id);
        Calculation::completed(
            TradeValues {
                quantity,
                money: revenue,
            },
            notes.is_empty(),
            summary,
            &notes,
        )
    }

    /// Commit a sale calculated with [`Commodity::calculate_sale`]
    pub fn apply_sale(&mut self, values: &TradeValues, balance: &mut Money) {
        self.available_quantity -= values.quantity;
        self.counters.sold_quantity += values.quantity;
        self.counters.selling_revenue += values.money;
        *balance += values.money;
    }

    /// Work out how much of `quantity` can be emitted from stock
    pub fn calculate_emission(&self, quantity: Flow) -> Calculation<TradeValues> {
        if let Some(reason) = self.check_request(Capability::Emit, quantity) {
            return Calculation::rejected(reason);
        }

        let (quantity, notes) = self.limit_to_stock(quantity, &Notes::default());
        let summary = format!("Emitted {quantity} {} of {}", self.unit, self.id);
        Calculation::completed(
            TradeValues {
                quantity,
                money: Money(0.0),
            },
            notes.is_empty(),
            summary,
            &notes,
        )
    }

    /// Commit an emission calculated with [`Commodity::calculate_emission`]
    pub fn apply_emission(&mut self, values: &TradeValues) {
        self.available_quantity -= values.quantity;
        self.counters.emitted_quantity += values.quantity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::Resolution;
    use crate::fixture::{electricity, hydrogen};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_purchase_exact(electricity: Commodity) {
        let calc = electricity.calculate_purchase(Flow(1.0), Money(2.0));
        assert_eq!(calc.resolution, Resolution::Exact);
        assert_eq!(
            calc.values,
            TradeValues {
                quantity: Flow(1.0),
                money: Money(2.0)
            }
        );
    }

    #[rstest]
    fn test_purchase_limited_by_balance(electricity: Commodity) {
        let calc = electricity.calculate_purchase(Flow(2.0), Money(2.0));
        assert_eq!(calc.resolution, Resolution::Clamped);
        assert_eq!(
            calc.values,
            TradeValues {
                quantity: Flow(1.0),
                money: Money(2.0)
            }
        );
    }

    #[rstest]
    fn test_clamped_purchase_never_overdraws(mut electricity: Commodity) {
        electricity.purchase_price = MoneyPerFlow(44.58);
        let mut balance = Money(50.22);
        let calc = electricity.calculate_purchase(Flow(10.0), balance);
        assert_eq!(calc.resolution, Resolution::Clamped);
        assert!(calc.values.money <= balance);

        electricity.apply_purchase(&calc.values, &mut balance);
        assert!(balance >= Money(0.0));
        assert_approx_eq!(Flow, electricity.available_quantity, Flow(50.22 / 44.58));
    }

    #[rstest]
    #[case(Money(0.0))]
    #[case(Money(-3.0))]
    fn test_purchase_without_funds(electricity: Commodity, #[case] balance: Money) {
        let calc = electricity.calculate_purchase(Flow(2.0), balance);
        assert_eq!(calc.resolution, Resolution::Clamped);
        assert_eq!(calc.values, TradeValues::default());
    }

    #[rstest]
    #[case(Flow(-1.0))]
    #[case(Flow(f64::NAN))]
    #[case(Flow(f64::INFINITY))]
    fn test_purchase_rejected(electricity: Commodity, #[case] quantity: Flow) {
        let calc = electricity.calculate_purchase(quantity, Money(100.0));
        assert_eq!(calc.resolution, Resolution::Rejected);
        assert!(!calc.succeeded());
    }

    #[rstest]
    fn test_purchase_not_enabled(hydrogen: Commodity) {
        let calc = hydrogen.calculate_purchase(Flow(1.0), Money(100.0));
        assert_eq!(calc.resolution, Resolution::Rejected);
        assert_eq!(calc.status, "Hydrogen does not allow purchase");
    }

    #[rstest]
    fn test_apply_purchase(mut electricity: Commodity) {
        let mut balance = Money(2.0);
        let calc = electricity.calculate_purchase(Flow(1.0), balance);
        electricity.apply_purchase(&calc.values, &mut balance);
        assert_eq!(balance, Money(0.0));
        assert_eq!(electricity.available_quantity, Flow(1.0));
        assert_eq!(electricity.counters.purchased_quantity, Flow(1.0));
        assert_eq!(electricity.counters.purchase_costs, Money(2.0));
    }

    #[rstest]
    #[case(Flow(1.0), Flow(1.0), true)]
    #[case(Flow(5.0), Flow(2.0), false)]
    fn test_sale(
        mut hydrogen: Commodity,
        #[case] quantity: Flow,
        #[case] expected: Flow,
        #[case] exact: bool,
    ) {
        hydrogen.available_quantity = Flow(2.0);
        let calc = hydrogen.calculate_sale(quantity);
        assert_eq!(calc.is_exact(), exact);
        assert_eq!(calc.values.quantity, expected);

        let mut balance = Money(0.0);
        hydrogen.apply_sale(&calc.values, &mut balance);
        assert_approx_eq!(Money, balance, expected * hydrogen.sale_price);
        assert_eq!(hydrogen.available_quantity, Flow(2.0) - expected);
        assert_eq!(hydrogen.counters.sold_quantity, expected);
        assert_eq!(hydrogen.counters.selling_revenue, balance);
    }

    #[rstest]
    fn test_emission(mut hydrogen: Commodity) {
        hydrogen.emittable = true;
        hydrogen.available_quantity = Flow(1.0);

        let calc = hydrogen.calculate_emission(Flow(3.0));
        assert_eq!(calc.resolution, Resolution::Clamped);
        hydrogen.apply_emission(&calc.values);
        assert_eq!(hydrogen.available_quantity, Flow(0.0));
        assert_eq!(hydrogen.counters.emitted_quantity, Flow(1.0));
    }

    #[rstest]
    fn test_calculate_does_not_mutate(electricity: Commodity) {
        let before = electricity.clone();
        let first = electricity.calculate_purchase(Flow(3.0), Money(4.0));
        let second = electricity.calculate_purchase(Flow(3.0), Money(4.0));
        assert_eq!(first, second);
        assert_eq!(electricity, before);
    }

    #[rstest]
    fn test_enabled_capabilities(electricity: Commodity, hydrogen: Commodity) {
        assert_eq!(
            electricity.enabled_capabilities(),
            [Capability::Purchase, Capability::Sell]
        );
        assert_eq!(hydrogen.enabled_capabilities(), [Capability::Sell]);
    }
}
