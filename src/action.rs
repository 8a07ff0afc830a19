//! Requests made of the elements of a PtX system and the values they resolve to.
use crate::capability::Capability;
use crate::commodity::{CommodityID, TradeValues};
use crate::component::{ComponentID, CurtailValues, RampValues, StorageDirection, StorageValues};
use std::fmt::Display;

/// The element that an action is requested of
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ActionTarget {
    /// A commodity
    #[display("{_0}")]
    Commodity(CommodityID),
    /// A component
    #[display("{_0}")]
    Component(ComponentID),
}

/// A request for an element to perform one of its capabilities
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    /// The element to act on
    pub target: ActionTarget,
    /// What the element should do
    pub capability: Capability,
    /// The requested amount. For dual-direction capabilities, the sign selects the direction.
    pub magnitude: f64,
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}({})", self.target, self.capability, self.magnitude)
    }
}

/// The values calculated for an action, ready to be applied
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ActionValues {
    /// Nothing to apply
    #[default]
    None,
    /// Values for a purchase
    Purchase(TradeValues),
    /// Values for a sale
    Sale(TradeValues),
    /// Values for an emission
    Emission(TradeValues),
    /// Values for ramping a conversion
    Ramp(RampValues),
    /// Values for charging or discharging a storage
    ChargeOrDischarge(StorageValues),
    /// Values for curtailing a generator
    Curtail(CurtailValues),
}

impl ActionValues {
    /// The amount achieved, measured the same way as the requested magnitude
    pub fn achieved(&self) -> f64 {
        match self {
            Self::None => 0.0,
            Self::Purchase(values) | Self::Sale(values) | Self::Emission(values) => {
                values.quantity.value()
            }
            Self::Ramp(values) => values.delta.value(),
            Self::ChargeOrDischarge(values) => match values.direction {
                StorageDirection::Charge => values.commodity_quantity.value(),
                StorageDirection::Discharge => -values.commodity_quantity.value(),
            },
            Self::Curtail(values) => values.delta.value(),
        }
    }
}
