//! Energy quantities: fuels, end uses, and annual consumption records.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::economics::FuelEconomics;
use crate::error::EngineError;

/// Fuel delivered to the dwelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fuel {
    Electricity,
    NaturalGas,
    Propane,
    FuelOil,
    Kerosene,
    Wood,
}

impl Fuel {
    /// All fuels in declaration order.
    pub const ALL: [Fuel; 6] = [
        Fuel::Electricity,
        Fuel::NaturalGas,
        Fuel::Propane,
        Fuel::FuelOil,
        Fuel::Kerosene,
        Fuel::Wood,
    ];

    /// Snake-case key used in configuration files.
    pub fn key(self) -> &'static str {
        match self {
            Fuel::Electricity => "electricity",
            Fuel::NaturalGas => "natural_gas",
            Fuel::Propane => "propane",
            Fuel::FuelOil => "fuel_oil",
            Fuel::Kerosene => "kerosene",
            Fuel::Wood => "wood",
        }
    }
}

impl fmt::Display for Fuel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Category of consumption a measure can affect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndUse {
    Heating,
    Cooling,
    Baseload,
}

impl EndUse {
    pub const ALL: [EndUse; 3] = [EndUse::Heating, EndUse::Cooling, EndUse::Baseload];
}

impl fmt::Display for EndUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EndUse::Heating => "heating",
            EndUse::Cooling => "cooling",
            EndUse::Baseload => "baseload",
        };
        f.write_str(s)
    }
}

/// Which sweep of the audit an oracle call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationPass {
    /// Unmodified dwelling, evaluated once.
    BaseCase,
    /// Each measure screened alone against the base case.
    FirstPass,
    /// Admitted measures applied on top of each other.
    Cumulative,
}

impl fmt::Display for EvaluationPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EvaluationPass::BaseCase => "base_case",
            EvaluationPass::FirstPass => "first_pass",
            EvaluationPass::Cumulative => "cumulative",
        };
        f.write_str(s)
    }
}

/// Annual energy (MMBtu) per fuel for one end use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FuelMix(BTreeMap<Fuel, f64>);

impl FuelMix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mix holding a single fuel.
    pub fn single(fuel: Fuel, mmbtu: f64) -> Self {
        let mut mix = Self::new();
        mix.add(fuel, mmbtu);
        mix
    }

    /// Adds `mmbtu` to the running amount for `fuel`.
    pub fn add(&mut self, fuel: Fuel, mmbtu: f64) {
        *self.0.entry(fuel).or_insert(0.0) += mmbtu;
    }

    pub fn get(&self, fuel: Fuel) -> f64 {
        self.0.get(&fuel).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Fuel, f64)> + '_ {
        self.0.iter().map(|(f, v)| (*f, *v))
    }

    /// Per-fuel difference `self - other`, covering fuels present in either mix.
    pub fn minus(&self, other: &FuelMix) -> FuelMix {
        let mut out = self.clone();
        for (fuel, mmbtu) in other.iter() {
            out.add(fuel, -mmbtu);
        }
        out
    }
}

/// Annual energy use of a dwelling by end use and fuel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyUse {
    pub heating: FuelMix,
    pub cooling: FuelMix,
    pub baseload: FuelMix,
}

impl EnergyUse {
    pub fn end_use(&self, end_use: EndUse) -> &FuelMix {
        match end_use {
            EndUse::Heating => &self.heating,
            EndUse::Cooling => &self.cooling,
            EndUse::Baseload => &self.baseload,
        }
    }

    pub fn end_use_mut(&mut self, end_use: EndUse) -> &mut FuelMix {
        match end_use {
            EndUse::Heating => &mut self.heating,
            EndUse::Cooling => &mut self.cooling,
            EndUse::Baseload => &mut self.baseload,
        }
    }

    pub fn heating_mmbtu(&self) -> f64 {
        self.heating.total()
    }

    pub fn cooling_mmbtu(&self) -> f64 {
        self.cooling.total()
    }

    pub fn baseload_mmbtu(&self) -> f64 {
        self.baseload.total()
    }

    pub fn total_mmbtu(&self) -> f64 {
        self.heating_mmbtu() + self.cooling_mmbtu() + self.baseload_mmbtu()
    }

    /// Energy summed across end uses for each fuel.
    pub fn by_fuel(&self) -> FuelMix {
        let mut mix = FuelMix::new();
        for end_use in EndUse::ALL {
            for (fuel, mmbtu) in self.end_use(end_use).iter() {
                mix.add(fuel, mmbtu);
            }
        }
        mix
    }

    /// Takes the affected end uses from `post` and keeps every other end use
    /// at `self`, so a measure can never zero out what it does not touch.
    pub fn merge_end_uses(&self, post: &EnergyUse, affected: &[EndUse]) -> EnergyUse {
        let mut merged = self.clone();
        for &end_use in affected {
            *merged.end_use_mut(end_use) = post.end_use(end_use).clone();
        }
        merged
    }

    /// Annual fuel bill for this consumption at current prices.
    ///
    /// # Errors
    ///
    /// Propagates a missing fuel price from `prices`.
    pub fn dollar_cost<E: FuelEconomics + ?Sized>(&self, prices: &E) -> Result<f64, EngineError> {
        let mut total = 0.0;
        for (fuel, mmbtu) in self.by_fuel().iter() {
            if mmbtu != 0.0 {
                total += mmbtu * prices.fuel_cost_per_mmbtu(fuel)?;
            }
        }
        Ok(total)
    }

    /// Per end use and fuel difference `self - other`.
    pub fn minus(&self, other: &EnergyUse) -> EnergyUse {
        EnergyUse {
            heating: self.heating.minus(&other.heating),
            cooling: self.cooling.minus(&other.cooling),
            baseload: self.baseload.minus(&other.baseload),
        }
    }
}

impl fmt::Display for EnergyUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "heat={:.2} cool={:.2} base={:.2} MMBtu",
            self.heating_mmbtu(),
            self.cooling_mmbtu(),
            self.baseload_mmbtu()
        )
    }
}

/// Season assigned to a calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Heating,
    Cooling,
    Swing,
}

/// Month-to-season assignment, fixed once the base case has been evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonTable(pub [Season; 12]);

impl SeasonTable {
    pub fn month(&self, month: usize) -> Season {
        self.0[month % 12]
    }

    pub fn count(&self, season: Season) -> usize {
        self.0.iter().filter(|s| **s == season).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EnergyUse {
        EnergyUse {
            heating: FuelMix::single(Fuel::NaturalGas, 60.0),
            cooling: FuelMix::single(Fuel::Electricity, 10.0),
            baseload: {
                let mut mix = FuelMix::single(Fuel::Electricity, 20.0);
                mix.add(Fuel::NaturalGas, 15.0);
                mix
            },
        }
    }

    #[test]
    fn totals_sum_end_uses() {
        let e = sample();
        assert_eq!(e.heating_mmbtu(), 60.0);
        assert_eq!(e.baseload_mmbtu(), 35.0);
        assert_eq!(e.total_mmbtu(), 105.0);
    }

    #[test]
    fn by_fuel_collapses_end_uses() {
        let mix = sample().by_fuel();
        assert_eq!(mix.get(Fuel::NaturalGas), 75.0);
        assert_eq!(mix.get(Fuel::Electricity), 30.0);
        assert_eq!(mix.get(Fuel::Propane), 0.0);
    }

    #[test]
    fn merge_keeps_untouched_end_uses() {
        let pre = sample();
        let post = EnergyUse::default();
        let merged = pre.merge_end_uses(&post, &[EndUse::Heating]);
        assert_eq!(merged.heating_mmbtu(), 0.0);
        assert_eq!(merged.cooling, pre.cooling);
        assert_eq!(merged.baseload, pre.baseload);
    }

    #[test]
    fn minus_covers_fuels_missing_on_one_side() {
        let a = FuelMix::single(Fuel::Propane, 5.0);
        let b = FuelMix::single(Fuel::Electricity, 2.0);
        let diff = a.minus(&b);
        assert_eq!(diff.get(Fuel::Propane), 5.0);
        assert_eq!(diff.get(Fuel::Electricity), -2.0);
    }

    #[test]
    fn season_table_counts() {
        let mut months = [Season::Heating; 12];
        months[6] = Season::Cooling;
        months[7] = Season::Cooling;
        months[4] = Season::Swing;
        let table = SeasonTable(months);
        assert_eq!(table.count(Season::Cooling), 2);
        assert_eq!(table.month(18), Season::Cooling);
    }
}
