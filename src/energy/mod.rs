//! Energy quantities and the oracle that produces them.

pub mod oracle;
pub mod types;

pub use oracle::{DegreeDayOracle, EnergyOracle, MMBTU_PER_KWH};
pub use types::{EndUse, EnergyUse, EvaluationPass, Fuel, FuelMix, Season, SeasonTable};
