//! Savings-to-investment ratio and present-worth savings.

use crate::energy::EnergyUse;
use crate::error::EngineError;

use super::fuel::FuelEconomics;

/// SIR reported when a measure has no positive initial cost.
///
/// A zero or negative cost means the cost data is anomalous; the sentinel
/// sorts such a measure to the top instead of dividing by zero.
pub const SIR_SENTINEL: f64 = 999.0;

/// Lifecycle savings divided by initial cost, or [`SIR_SENTINEL`] when the
/// cost is not positive.
pub fn savings_to_investment_ratio(lifecycle_savings: f64, initial_cost: f64) -> f64 {
    if initial_cost <= 0.0 {
        SIR_SENTINEL
    } else {
        lifecycle_savings / initial_cost
    }
}

/// Present worth of a first-year dollar saving on one fuel.
///
/// # Errors
///
/// Propagates errors from the present-worth factor lookup.
pub fn present_worth<E: FuelEconomics + ?Sized>(
    economics: &E,
    annual_dollar_savings: f64,
    fuel: crate::energy::Fuel,
    lifetime_years: u32,
) -> Result<f64, EngineError> {
    Ok(annual_dollar_savings * economics.present_worth_factor(fuel, lifetime_years)?)
}

/// First-year and discounted lifetime savings of a measure.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LifecycleSavings {
    /// First-year fuel bill reduction ($).
    pub annual_dollars: f64,
    /// Present worth of the savings stream over the lifetime ($).
    pub present_worth: f64,
}

/// Prices and discounts an annual energy saving, fuel by fuel.
///
/// # Errors
///
/// Returns [`EngineError::MissingRecord`] if a fuel with non-zero savings has
/// no price.
pub fn lifecycle_savings<E: FuelEconomics + ?Sized>(
    economics: &E,
    savings: &EnergyUse,
    lifetime_years: u32,
) -> Result<LifecycleSavings, EngineError> {
    let mut out = LifecycleSavings::default();
    for (fuel, mmbtu) in savings.by_fuel().iter() {
        if mmbtu == 0.0 {
            continue;
        }
        let annual = mmbtu * economics.fuel_cost_per_mmbtu(fuel)?;
        out.annual_dollars += annual;
        out.present_worth += present_worth(economics, annual, fuel, lifetime_years)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::economics::EscalationTable;
    use crate::energy::{Fuel, FuelMix};

    #[test]
    fn zero_cost_returns_sentinel() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let x: f64 = rng.random_range(-1.0e4..1.0e4);
            assert_eq!(savings_to_investment_ratio(x, 0.0), SIR_SENTINEL);
        }
        assert_eq!(savings_to_investment_ratio(10.0, -5.0), SIR_SENTINEL);
    }

    #[test]
    fn sign_follows_savings_for_positive_cost() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let cost: f64 = rng.random_range(0.01..5_000.0);
            let gain: f64 = rng.random_range(0.01..5_000.0);
            assert!(savings_to_investment_ratio(gain, cost) > 0.0);
            assert!(savings_to_investment_ratio(-gain, cost) < 0.0);
        }
    }

    #[test]
    fn ratio_is_plain_division() {
        assert_eq!(savings_to_investment_ratio(150.0, 100.0), 1.5);
        assert_eq!(savings_to_investment_ratio(50.0, 200.0), 0.25);
    }

    #[test]
    fn lifecycle_savings_prices_each_fuel() {
        let mut prices = BTreeMap::new();
        prices.insert(Fuel::NaturalGas, 10.0);
        prices.insert(Fuel::Electricity, 40.0);
        let table = EscalationTable::new(0.0, prices, BTreeMap::new());

        let savings = EnergyUse {
            heating: FuelMix::single(Fuel::NaturalGas, 2.0),
            cooling: FuelMix::single(Fuel::Electricity, 0.5),
            baseload: FuelMix::new(),
        };
        let ls = lifecycle_savings(&table, &savings, 10).unwrap();
        assert!((ls.annual_dollars - 40.0).abs() < 1e-12);
        assert!((ls.present_worth - 400.0).abs() < 1e-9);
    }

    #[test]
    fn unpriced_fuel_with_zero_savings_is_ignored() {
        let table = EscalationTable::new(0.0, BTreeMap::new(), BTreeMap::new());
        let savings = EnergyUse {
            heating: FuelMix::single(Fuel::Propane, 0.0),
            ..EnergyUse::default()
        };
        assert!(lifecycle_savings(&table, &savings, 10).is_ok());
    }
}
