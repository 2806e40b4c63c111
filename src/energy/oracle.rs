//! Energy oracle: annual consumption of a dwelling state.
//!
//! The audit treats the oracle as opaque. [`DegreeDayOracle`] is the reference
//! implementation: a steady-state UA model driven by monthly degree days.

use crate::dwelling::DwellingState;
use crate::error::EngineError;
use crate::invariant;

use super::types::{EnergyUse, EvaluationPass, Fuel, FuelMix, Season, SeasonTable};

/// MMBtu per kWh.
pub const MMBTU_PER_KWH: f64 = 0.003_412;
/// Sensible heat of air (Btu/h·°F per cfm).
const AIR_HEAT_FACTOR: f64 = 1.08;
/// Degree days below which a month does not count toward a season.
const SEASON_THRESHOLD_DD: f64 = 50.0;
const HEATING_SETBACK_FACTOR: f64 = 0.92;
const COOLING_SETUP_FACTOR: f64 = 0.95;
const LOW_FLOW_FACTOR: f64 = 0.85;
/// Btu to raise one gallon of water by 1 °F.
const BTU_PER_GALLON_F: f64 = 8.33;

/// Computes annual energy use by end use and fuel.
///
/// Implementations must be deterministic for identical state contents and
/// must not memoize across calls.
pub trait EnergyOracle {
    /// Annual consumption of `state` during `pass`.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation when a quantity the model divides by is
    /// not positive, or a missing record when the frozen season table is
    /// absent outside the base case.
    fn compute_energy(
        &self,
        state: &DwellingState,
        pass: EvaluationPass,
    ) -> Result<EnergyUse, EngineError>;

    /// Month-to-season assignment derived from the unmodified dwelling.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation for negative degree days.
    fn season_table(&self, state: &DwellingState) -> Result<SeasonTable, EngineError>;
}

/// Monthly degree-day model of envelope, HVAC, and baseload consumption.
#[derive(Debug, Clone, Copy, Default)]
pub struct DegreeDayOracle;

impl DegreeDayOracle {
    pub fn new() -> Self {
        Self
    }

    /// Whole-house conductance including infiltration (Btu/h·°F).
    ///
    /// # Errors
    ///
    /// Returns an invariant violation for a non-positive R-value on an
    /// assembly with area.
    pub fn total_ua(state: &DwellingState) -> Result<f64, EngineError> {
        let env = &state.envelope;
        let mut ua = 0.0;

        for attic in &env.attics {
            invariant!(
                attic.total_r() > 0.0,
                "attic {} has non-positive R-value {}",
                attic.code,
                attic.total_r()
            );
            ua += attic.area_ft2 / attic.total_r();
        }

        let gross: f64 = env.walls.iter().map(|w| w.gross_area_ft2).sum();
        for wall in &env.walls {
            invariant!(
                wall.existing_r > 0.0,
                "wall {} has non-positive R-value {}",
                wall.code,
                wall.existing_r
            );
            if gross <= 0.0 {
                continue;
            }
            let share = wall.gross_area_ft2 / gross * state.derived.net_wall_area_ft2;
            let f = wall.uninsulatable_fraction;
            let u = f / wall.existing_r + (1.0 - f) / (wall.existing_r + wall.added_r);
            ua += share * u;
        }

        for w in &env.windows {
            invariant!(w.u_value > 0.0, "window {} has non-positive U-value", w.code);
            ua += w.area_ft2 * w.effective_u();
        }
        for d in &env.doors {
            ua += d.area_ft2 * d.u_value;
        }

        let fnd = &env.foundation;
        invariant!(
            fnd.effective_r() > 0.0,
            "foundation {} has non-positive R-value",
            fnd.code
        );
        ua += fnd.floor_area_ft2 / fnd.effective_r();

        ua += AIR_HEAT_FACTOR * state.derived.natural_cfm;
        Ok(ua)
    }

    fn seasons(&self, state: &DwellingState, pass: EvaluationPass) -> Result<SeasonTable, EngineError> {
        match (pass, state.derived.seasons) {
            (_, Some(table)) => Ok(table),
            (EvaluationPass::BaseCase, None) => self.season_table(state),
            (_, None) => Err(EngineError::MissingRecord {
                what: format!("frozen season table during {pass}"),
            }),
        }
    }
}

impl EnergyOracle for DegreeDayOracle {
    fn compute_energy(
        &self,
        state: &DwellingState,
        pass: EvaluationPass,
    ) -> Result<EnergyUse, EngineError> {
        let site = &state.site;
        invariant!(
            site.floor_area_ft2 > 0.0,
            "conditioned floor area must be positive, got {}",
            site.floor_area_ft2
        );
        let seasons = self.seasons(state, pass)?;
        let ua = Self::total_ua(state)?;

        let duct_eff = state.ducts.distribution_efficiency;
        invariant!(
            duct_eff > 0.0 && duct_eff <= 1.0,
            "duct distribution efficiency {duct_eff} outside (0, 1]"
        );

        let mut heating_dd = 0.0;
        let mut cooling_dd = 0.0;
        let mut cooling_months = 0.0;
        for month in 0..12 {
            match seasons.month(month) {
                Season::Heating => heating_dd += site.monthly_hdd[month],
                Season::Cooling => {
                    cooling_dd += site.monthly_cdd[month];
                    cooling_months += 1.0;
                }
                Season::Swing => {
                    heating_dd += site.monthly_hdd[month];
                    cooling_dd += site.monthly_cdd[month];
                }
            }
        }

        let heat = &state.heating;
        invariant!(
            heat.afue > 0.0,
            "heating efficiency must be positive, got {}",
            heat.afue
        );
        let mut heating_mmbtu = ua * heating_dd * 24.0 / 1.0e6 / (heat.afue * duct_eff);
        if heat.setback {
            heating_mmbtu *= HEATING_SETBACK_FACTOR;
        }

        let cooling = match &state.cooling {
            Some(cs) => {
                invariant!(cs.seer > 0.0, "SEER must be positive, got {}", cs.seer);
                let solar_btu: f64 = state
                    .envelope
                    .windows
                    .iter()
                    .map(|w| w.area_ft2 * w.shgc)
                    .sum::<f64>()
                    * site.cooling_solar_btu_per_ft2
                    * cooling_months;
                let load_mmbtu = (ua * cooling_dd * 24.0 + solar_btu) / 1.0e6;
                let cop = cs.seer / 3.412;
                let mut mmbtu = load_mmbtu / cop / duct_eff;
                if heat.setback {
                    mmbtu *= COOLING_SETUP_FACTOR;
                }
                FuelMix::single(Fuel::Electricity, mmbtu)
            }
            None => FuelMix::new(),
        };

        let dhw = &state.water_heater;
        invariant!(
            dhw.energy_factor > 0.0,
            "water heater energy factor must be positive, got {}",
            dhw.energy_factor
        );
        let mut water_mmbtu = dhw.gallons_per_day * BTU_PER_GALLON_F * dhw.temperature_rise_f
            * 365.0
            / 1.0e6
            / dhw.energy_factor;
        if dhw.low_flow_showers {
            water_mmbtu *= LOW_FLOW_FACTOR;
        }

        let lt = &state.lighting;
        let lighting_kwh = f64::from(lt.lamps) * lt.watts_per_lamp * lt.hours_per_day * 365.0 / 1000.0;
        let fridge_kwh: f64 = state.refrigerators.iter().map(|r| r.annual_kwh).sum();

        let mut baseload = FuelMix::single(dhw.fuel, water_mmbtu);
        baseload.add(Fuel::Electricity, (lighting_kwh + fridge_kwh) * MMBTU_PER_KWH);

        Ok(EnergyUse {
            heating: FuelMix::single(heat.fuel, heating_mmbtu),
            cooling,
            baseload,
        })
    }

    fn season_table(&self, state: &DwellingState) -> Result<SeasonTable, EngineError> {
        let site = &state.site;
        let mut months = [Season::Swing; 12];
        for (m, slot) in months.iter_mut().enumerate() {
            let hdd = site.monthly_hdd[m];
            let cdd = site.monthly_cdd[m];
            invariant!(
                hdd >= 0.0 && cdd >= 0.0,
                "negative degree days in month {}",
                m + 1
            );
            *slot = if hdd > cdd && hdd >= SEASON_THRESHOLD_DD {
                Season::Heating
            } else if cdd > hdd && cdd >= SEASON_THRESHOLD_DD {
                Season::Cooling
            } else {
                Season::Swing
            };
        }
        Ok(SeasonTable(months))
    }
}
