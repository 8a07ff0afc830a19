//! The mapping between flat action vectors and the actions they request.
use crate::action::{Action, ActionTarget};
use crate::capability::{Capability, HasCapabilities};
use crate::component::Component;
use crate::system::PtxSystem;
use anyhow::{Result, ensure};
use itertools::Itertools;

/// One entry of an action vector
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionSlot {
    /// The element the entry acts on
    pub target: ActionTarget,
    /// The capability requested
    pub capability: Capability,
}

impl ActionSlot {
    /// The label for this slot, e.g. "Electrolyser.ramp"
    pub fn label(&self) -> String {
        format!("{}.{}", self.target, self.capability)
    }
}

/// The ordered slots of the action vectors accepted by a system.
///
/// Commodities come first, then generators, conversions and storages, each in the order they
/// were defined and each with only its enabled capabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSpace {
    slots: Vec<ActionSlot>,
    /// Generators without a slot, which still generate every step
    uncontrolled_generators: Vec<ActionTarget>,
}

impl ActionSpace {
    /// Build the action space for a system
    pub fn from_system(system: &PtxSystem) -> Self {
        let mut slots = Vec::new();
        let mut push_enabled = |target: ActionTarget, element: &dyn HasCapabilities| {
            slots.extend(
                element
                    .enabled_capabilities()
                    .into_iter()
                    .map(|capability| ActionSlot {
                        target: target.clone(),
                        capability,
                    }),
            );
        };

        for commodity in system.commodities().values() {
            push_enabled(ActionTarget::Commodity(commodity.id.clone()), commodity);
        }
        let by_kind = |component: &&Component| match component {
            Component::Generation(_) => 0,
            Component::Conversion(_) => 1,
            Component::Storage(_) => 2,
        };
        for component in system.components().values().sorted_by_key(by_kind) {
            push_enabled(ActionTarget::Component(component.id().clone()), component);
        }

        let uncontrolled_generators = system
            .iter_generators()
            .filter(|generator| !generator.is_enabled(Capability::Curtail))
            .map(|generator| ActionTarget::Component(generator.id.clone()))
            .collect();

        Self {
            slots,
            uncontrolled_generators,
        }
    }

    /// The number of entries in an action vector
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the system accepts no actions at all
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The slots in vector order
    pub fn slots(&self) -> &[ActionSlot] {
        &self.slots
    }

    /// The labels of all slots in vector order
    pub fn labels(&self) -> Vec<String> {
        self.slots.iter().map(ActionSlot::label).collect()
    }

    /// Turn an action vector into the actions it requests.
    ///
    /// Generators which cannot be curtailed get an implicit request to generate as normal.
    pub fn decode(&self, vector: &[f64]) -> Result<Vec<Action>> {
        ensure!(
            vector.len() == self.slots.len(),
            "Action vector has {} entries but the system expects {}",
            vector.len(),
            self.slots.len()
        );

        let requested = self
            .slots
            .iter()
            .zip(vector)
            .map(|(slot, magnitude)| Action {
                target: slot.target.clone(),
                capability: slot.capability,
                magnitude: *magnitude,
            });
        let implicit = self.uncontrolled_generators.iter().map(|target| Action {
            target: target.clone(),
            capability: Capability::Curtail,
            magnitude: 0.0,
        });

        Ok(requested.chain(implicit).collect())
    }
}
