//! Fixtures for tests

use crate::commodity::{Commodity, CommodityMap};
use crate::component::{
    Component, ConversionComponent, ConversionFlows, GenerationComponent, LoadLimits,
    StorageComponent, StorageLimits,
};
use crate::system::PtxSystem;
use crate::units::{Dimensionless, Flow, Money, MoneyPerFlow};
use crate::weather::WeatherProfile;
use indexmap::indexmap;
use rstest::fixture;
use std::rc::Rc;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

#[fixture]
pub fn electricity() -> Commodity {
    Commodity {
        purchasable: true,
        saleable: true,
        purchase_price: MoneyPerFlow(2.0),
        sale_price: MoneyPerFlow(1.0),
        ..Commodity::new("Electricity".into(), "MWh")
    }
}

#[fixture]
pub fn water() -> Commodity {
    Commodity {
        purchasable: true,
        purchase_price: MoneyPerFlow(0.5),
        ..Commodity::new("Water".into(), "t")
    }
}

#[fixture]
pub fn hydrogen() -> Commodity {
    Commodity {
        saleable: true,
        demanded: true,
        sale_price: MoneyPerFlow(3.0),
        ..Commodity::new("Hydrogen".into(), "MWh")
    }
}

#[fixture]
pub fn oxygen() -> Commodity {
    Commodity {
        emittable: true,
        ..Commodity::new("Oxygen".into(), "t")
    }
}

#[fixture]
pub fn commodities(
    electricity: Commodity,
    water: Commodity,
    hydrogen: Commodity,
    oxygen: Commodity,
) -> CommodityMap {
    [electricity, water, hydrogen, oxygen]
        .into_iter()
        .map(|commodity| (commodity.id.clone(), commodity))
        .collect()
}

#[fixture]
pub fn electrolyser() -> ConversionComponent {
    let limits = LoadLimits {
        min_p: Dimensionless(0.0),
        max_p: Dimensionless(1.0),
        ramp_up: Dimensionless(1.0),
        ramp_down: Dimensionless(1.0),
        initial_load: Dimensionless(0.5),
    };
    let flows = ConversionFlows {
        inputs: indexmap! {
            "Electricity".into() => Dimensionless(1.0),
            "Water".into() => Dimensionless(0.5),
        },
        outputs: indexmap! {
            "Hydrogen".into() => Dimensionless(2.0),
            "Oxygen".into() => Dimensionless(2.0),
        },
        main_input: "Electricity".into(),
        main_output: "Hydrogen".into(),
    };
    ConversionComponent::new(
        "Electrolyser".into(),
        MoneyPerFlow(1.0),
        Flow(10.0),
        limits,
        flows,
    )
    .unwrap()
}

#[fixture]
pub fn battery() -> StorageComponent {
    let limits = StorageLimits {
        min_soc: Dimensionless(0.1),
        max_soc: Dimensionless(0.75),
        charging_efficiency: Dimensionless(0.5),
        discharging_efficiency: Dimensionless(0.5),
        ratio_capacity_p: Dimensionless(0.5),
        initial_soc: Dimensionless(0.25),
    };
    StorageComponent::new(
        "Battery".into(),
        MoneyPerFlow(1.0),
        Flow(4.0),
        "Electricity".into(),
        limits,
    )
}

#[fixture]
pub fn wind_turbine() -> GenerationComponent {
    GenerationComponent::new(
        "Wind".into(),
        MoneyPerFlow(1.0),
        Flow(5.0),
        "Electricity".into(),
        true,
    )
}

/// Weather for the wind turbine over four steps
#[fixture]
pub fn weather() -> WeatherProfile {
    let coefficients = indexmap! {
        "Wind".into() => [0.5, 1.0, 0.2, 0.0].into_iter().map(Dimensionless).collect(),
    };
    WeatherProfile::new(coefficients, 0)
}

/// A small electrolysis system with a budget of 100
#[fixture]
pub fn system(
    commodities: CommodityMap,
    electrolyser: ConversionComponent,
    battery: StorageComponent,
    wind_turbine: GenerationComponent,
    weather: WeatherProfile,
) -> PtxSystem {
    let components = vec![
        Component::Generation(wind_turbine),
        Component::Conversion(electrolyser),
        Component::Storage(battery),
    ];
    let mut system = PtxSystem::new(
        "Electrolysis",
        commodities.into_values().collect(),
        components,
        Rc::new(weather),
    )
    .unwrap();
    system.set_initial_balance(Money(100.0));
    system
}

/// An electrolyser running at half load with no stock and a slow ramp-down, so that it cannot
/// keep running
#[fixture]
pub fn stranded_system(
    commodities: CommodityMap,
    mut electrolyser: ConversionComponent,
) -> PtxSystem {
    electrolyser.ramp_down = Dimensionless(0.1);
    let mut system = PtxSystem::new(
        "Stranded",
        commodities.into_values().collect(),
        vec![Component::Conversion(electrolyser)],
        Rc::new(WeatherProfile::default()),
    )
    .unwrap();
    system.set_initial_balance(Money(100.0));
    system
}
