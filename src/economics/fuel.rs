//! Fuel prices and present-worth factors.

use std::collections::BTreeMap;

use crate::config::AuditConfig;
use crate::energy::Fuel;
use crate::error::EngineError;
use crate::invariant;

/// Read-only lookup of fuel prices and discounting.
pub trait FuelEconomics {
    /// Current price of `fuel` ($/MMBtu).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MissingRecord`] if no price is known.
    fn fuel_cost_per_mmbtu(&self, fuel: Fuel) -> Result<f64, EngineError>;

    /// Multiplier turning a first-year dollar saving on `fuel` into its
    /// present worth over `lifetime_years`.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if the discount rate makes the factor
    /// undefined.
    fn present_worth_factor(&self, fuel: Fuel, lifetime_years: u32) -> Result<f64, EngineError>;
}

/// Price and escalation schedule built from configuration.
#[derive(Debug, Clone)]
pub struct EscalationTable {
    discount_rate: f64,
    prices: BTreeMap<Fuel, f64>,
    escalation: BTreeMap<Fuel, Vec<f64>>,
}

impl EscalationTable {
    pub fn new(
        discount_rate: f64,
        prices: BTreeMap<Fuel, f64>,
        escalation: BTreeMap<Fuel, Vec<f64>>,
    ) -> Self {
        Self {
            discount_rate,
            prices,
            escalation,
        }
    }

    /// Table holding every fuel's configured price and escalation list.
    pub fn from_config(cfg: &AuditConfig) -> Self {
        let prices = Fuel::ALL
            .into_iter()
            .map(|f| (f, cfg.fuel_prices.price(f)))
            .collect();
        let escalation = Fuel::ALL
            .into_iter()
            .map(|f| (f, cfg.escalation.rates(f).to_vec()))
            .collect();
        Self::new(cfg.economics.discount_rate, prices, escalation)
    }

    /// Escalation rate applied in year `year` (1-based). Years past the end
    /// of the list reuse its last rate.
    fn rate(&self, fuel: Fuel, year: u32) -> f64 {
        match self.escalation.get(&fuel) {
            Some(rates) if !rates.is_empty() => {
                let idx = (year as usize).saturating_sub(1).min(rates.len() - 1);
                rates[idx]
            }
            _ => 0.0,
        }
    }
}

impl FuelEconomics for EscalationTable {
    fn fuel_cost_per_mmbtu(&self, fuel: Fuel) -> Result<f64, EngineError> {
        self.prices
            .get(&fuel)
            .copied()
            .ok_or_else(|| EngineError::MissingRecord {
                what: format!("fuel price for {fuel}"),
            })
    }

    fn present_worth_factor(&self, fuel: Fuel, lifetime_years: u32) -> Result<f64, EngineError> {
        let d = self.discount_rate;
        invariant!(d > -1.0, "discount rate {d} must exceed -1");

        let mut escalated = 1.0;
        let mut discount = 1.0;
        let mut pwf = 0.0;
        for year in 1..=lifetime_years {
            escalated *= 1.0 + self.rate(fuel, year);
            discount *= 1.0 + d;
            pwf += escalated / discount;
        }
        Ok(pwf)
    }
}
