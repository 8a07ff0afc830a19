//! Weather data which bounds the output of generators.
use crate::component::ComponentID;
use crate::units::Dimensionless;
use indexmap::IndexMap;
use std::fmt::Debug;

/// A source of weather coefficients for generators
pub trait WeatherSource: Debug {
    /// The fraction of its capacity that `generator` can supply at `step`, if known
    fn coefficient_for(&self, generator: &ComponentID, step: u32) -> Option<Dimensionless>;
}

/// Weather coefficients for each generator, one value per step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherProfile {
    coefficients: IndexMap<ComponentID, Vec<Dimensionless>>,
    /// The number of leading entries to skip
    offset: usize,
}

impl WeatherProfile {
    /// Create a profile from per-generator coefficients, starting `offset` entries in
    pub fn new(coefficients: IndexMap<ComponentID, Vec<Dimensionless>>, offset: usize) -> Self {
        Self {
            coefficients,
            offset,
        }
    }

    /// The generators which have weather data
    pub fn generators(&self) -> impl Iterator<Item = &ComponentID> {
        self.coefficients.keys()
    }

    /// The number of steps for which every generator has data, or `None` if there are no
    /// generators
    pub fn usable_steps(&self) -> Option<usize> {
        self.coefficients
            .values()
            .map(|values| values.len().saturating_sub(self.offset))
            .min()
    }
}

impl WeatherSource for WeatherProfile {
    fn coefficient_for(&self, generator: &ComponentID, step: u32) -> Option<Dimensionless> {
        let index = usize::try_from(step).ok()?.checked_add(self.offset)?;
        self.coefficients.get(generator)?.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(offset: usize) -> WeatherProfile {
        let coefficients = [
            (
                ComponentID::new("Wind"),
                vec![Dimensionless(0.1), Dimensionless(0.2), Dimensionless(0.3)],
            ),
            (
                ComponentID::new("Solar"),
                vec![Dimensionless(0.0), Dimensionless(0.5)],
            ),
        ]
        .into_iter()
        .collect();
        WeatherProfile::new(coefficients, offset)
    }

    #[test]
    fn test_coefficient_for() {
        let weather = profile(0);
        assert_eq!(
            weather.coefficient_for(&"Wind".into(), 1),
            Some(Dimensionless(0.2))
        );
        assert_eq!(weather.coefficient_for(&"Solar".into(), 2), None);
        assert_eq!(weather.coefficient_for(&"Hydro".into(), 0), None);
    }

    #[test]
    fn test_offset() {
        let weather = profile(1);
        assert_eq!(
            weather.coefficient_for(&"Wind".into(), 1),
            Some(Dimensionless(0.3))
        );
        assert_eq!(weather.usable_steps(), Some(1));
        assert_eq!(profile(5).usable_steps(), Some(0));
        assert_eq!(WeatherProfile::default().usable_steps(), None);
    }
}
