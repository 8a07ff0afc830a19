//! The kinds of action that elements of a PtX system can perform.
use serde::Serialize;
use strum::{EnumIter, EnumString};

/// An action that can be requested of a commodity or component
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Serialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    /// Buy a commodity from outside the system
    Purchase,
    /// Sell a commodity outside the system
    Sell,
    /// Release a commodity into the environment
    Emit,
    /// Withhold (positive) or release (negative) a generator's weather-limited output
    Curtail,
    /// Change the load of a conversion component
    Ramp,
    /// Charge (positive) or discharge (negative) a storage component
    ChargeOrDischarge,
}

/// Elements of a PtX system which offer a fixed set of actions
pub trait HasCapabilities {
    /// Every capability that this kind of element can offer
    fn supported_capabilities(&self) -> &'static [Capability];

    /// Whether the element's configuration enables the given capability
    fn is_enabled(&self, capability: Capability) -> bool {
        self.supported_capabilities().contains(&capability)
    }

    /// The enabled capabilities, in the order they are supported
    fn enabled_capabilities(&self) -> Vec<Capability> {
        self.supported_capabilities()
            .iter()
            .copied()
            .filter(|capability| self.is_enabled(*capability))
            .collect()
    }
}
