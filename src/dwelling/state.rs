//! Dwelling description and the derived quantities kept alongside it.
//!
//! Each sub-record sits behind an [`Arc`]. Cloning a [`DwellingState`]
//! therefore only bumps reference counts, and writers go through the
//! `*_mut` accessors which copy a sub-record on first write
//! ([`Arc::make_mut`]). Snapshots taken before a trial keep sharing every
//! sub-record the trial never touched.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Deserialize;

use super::component::ComponentCode;
use crate::config::CatalogOverride;
use crate::energy::{EndUse, Fuel, SeasonTable};
use crate::error::EngineError;
use crate::invariant;
use crate::measures::MeasureKind;

/// Location, geometry, and climate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Site {
    /// Conditioned floor area (ft², must be > 0).
    pub floor_area_ft2: f64,
    pub stories: u32,
    /// Heating degree days (°F·day, base 65) for each month.
    pub monthly_hdd: [f64; 12],
    /// Cooling degree days (°F·day, base 65) for each month.
    pub monthly_cdd: [f64; 12],
    /// Solar gain through a unit-SHGC window during a cooling month (Btu/ft²·month).
    #[serde(default = "default_solar_gain")]
    pub cooling_solar_btu_per_ft2: f64,
}

fn default_solar_gain() -> f64 {
    9_000.0
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Attic {
    pub code: ComponentCode,
    pub area_ft2: f64,
    /// Existing assembly R-value (h·ft²·°F/Btu).
    pub existing_r: f64,
    #[serde(default)]
    pub added_r: f64,
    /// Floored attics cannot take blown loose fill.
    #[serde(default)]
    pub floored: bool,
}

impl Attic {
    pub fn total_r(&self) -> f64 {
        self.existing_r + self.added_r
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WallSegment {
    pub code: ComponentCode,
    pub gross_area_ft2: f64,
    pub existing_r: f64,
    #[serde(default)]
    pub added_r: f64,
    #[serde(default)]
    pub cavity_insulated: bool,
    /// Share of the wall that cannot be reached by dense-pack (0.0–1.0).
    #[serde(default)]
    pub uninsulatable_fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowGroup {
    pub code: ComponentCode,
    pub count: u32,
    /// Total glazed area of the group (ft²).
    pub area_ft2: f64,
    pub u_value: f64,
    pub shgc: f64,
    /// Current leakage attributed to the group (cfm50).
    pub leakage_cfm50: f64,
    /// Leakage as audited, before any measure.
    #[serde(skip)]
    pub audited_leakage_cfm50: f64,
    #[serde(default)]
    pub has_storm: bool,
    #[serde(default)]
    pub replaced: bool,
}

impl WindowGroup {
    /// U-value including a storm panel if present.
    pub fn effective_u(&self) -> f64 {
        if self.has_storm {
            1.0 / (1.0 / self.u_value + 1.0)
        } else {
            self.u_value
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DoorGroup {
    pub code: ComponentCode,
    pub count: u32,
    pub area_ft2: f64,
    pub u_value: f64,
    pub leakage_cfm50: f64,
    #[serde(skip)]
    pub audited_leakage_cfm50: f64,
    #[serde(default)]
    pub weatherstripped: bool,
    #[serde(default)]
    pub replaced: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoundationKind {
    Slab,
    Crawlspace,
    Basement,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Foundation {
    pub code: ComponentCode,
    pub kind: FoundationKind,
    pub floor_area_ft2: f64,
    pub existing_r: f64,
    #[serde(default)]
    pub added_r: f64,
}

impl Foundation {
    /// Effective floor R-value including the buffering effect of the space below.
    pub fn effective_r(&self) -> f64 {
        let buffer = match self.kind {
            FoundationKind::Slab => 8.0,
            FoundationKind::Crawlspace => 2.0,
            FoundationKind::Basement => 4.0,
        };
        self.existing_r + self.added_r + buffer
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    #[serde(default)]
    pub attics: Vec<Attic>,
    #[serde(default)]
    pub walls: Vec<WallSegment>,
    #[serde(default)]
    pub windows: Vec<WindowGroup>,
    #[serde(default)]
    pub doors: Vec<DoorGroup>,
    pub foundation: Foundation,
}

/// Whole-house air leakage from the blower-door test.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AirLeakage {
    /// Whole-house leakage at 50 Pa (cfm50).
    pub cfm50: f64,
    /// Blower-door to natural airflow conversion factor (must be > 0).
    pub n_factor: f64,
    /// Auditor's estimate of achievable leakage after air sealing.
    pub target_cfm50: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeatingSystem {
    pub fuel: Fuel,
    /// Seasonal efficiency (AFUE, or COP-like value for heat pumps).
    pub afue: f64,
    /// Unsafe equipment that must be replaced.
    #[serde(default)]
    pub red_tagged: bool,
    #[serde(default)]
    pub tuned: bool,
    /// Thermostat already performs night setback.
    #[serde(default)]
    pub setback: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoolingSystem {
    pub seer: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ducts {
    /// Fraction of equipment output delivered to the living space (0.0–1.0].
    pub distribution_efficiency: f64,
    #[serde(default)]
    pub sealed: bool,
    #[serde(default)]
    pub outside_envelope: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaterHeater {
    pub fuel: Fuel,
    pub energy_factor: f64,
    #[serde(default)]
    pub tank_insulated: bool,
    pub gallons_per_day: f64,
    /// Temperature rise from inlet to setpoint (°F).
    pub temperature_rise_f: f64,
    #[serde(default)]
    pub low_flow_showers: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Lighting {
    pub lamps: u32,
    pub watts_per_lamp: f64,
    pub hours_per_day: f64,
    #[serde(default)]
    pub retrofitted: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Refrigerator {
    pub code: ComponentCode,
    pub annual_kwh: f64,
    #[serde(default)]
    pub replaced: bool,
}

/// Reporting category of a user-itemized cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemizedCategory {
    HealthAndSafety,
    IncidentalRepair,
    Energy,
}

/// Savings the user declares for an itemized cost.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeclaredSavings {
    pub end_use: EndUse,
    pub fuel: Fuel,
    /// Annual savings (MMBtu).
    pub mmbtu: f64,
}

/// A cost entered by the auditor outside the measure catalog.
///
/// With `attached_to` set it is an adder on that measure's cost (limited to
/// `component` when given); otherwise it is evaluated as its own measure.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemizedCost {
    pub code: ComponentCode,
    pub description: String,
    pub cost: f64,
    pub category: ItemizedCategory,
    #[serde(default)]
    pub savings: Option<DeclaredSavings>,
    #[serde(default)]
    pub attached_to: Option<MeasureKind>,
    #[serde(default)]
    pub component: Option<ComponentCode>,
    #[serde(default)]
    pub lifetime_years: Option<u32>,
}

/// Intermediate quantities recomputed after every mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Derived {
    /// Area-weighted share of wall that cannot be insulated.
    pub uninsulatable_wall_fraction: f64,
    /// Wall area net of windows and doors (ft²).
    pub net_wall_area_ft2: f64,
    /// Whole-house leakage net of component leakage improvements (cfm50).
    pub effective_cfm50: f64,
    /// Natural infiltration after flooring (cfm).
    pub natural_cfm: f64,
    /// Natural infiltration would have fallen below the floor.
    pub infiltration_floored: bool,
    /// Month-to-season table frozen after the base case.
    pub seasons: Option<SeasonTable>,
}

/// The authoritative, mutable building description.
#[derive(Debug, Clone, PartialEq)]
pub struct DwellingState {
    pub site: Arc<Site>,
    pub envelope: Arc<Envelope>,
    pub air_leakage: Arc<AirLeakage>,
    pub heating: Arc<HeatingSystem>,
    pub cooling: Option<Arc<CoolingSystem>>,
    pub ducts: Arc<Ducts>,
    pub water_heater: Arc<WaterHeater>,
    pub lighting: Arc<Lighting>,
    pub refrigerators: Arc<Vec<Refrigerator>>,
    pub itemized_costs: Arc<Vec<ItemizedCost>>,
    pub required_measures: Arc<BTreeSet<MeasureKind>>,
    /// Per-dwelling pricing and lifetime overrides keyed by measure key.
    pub measure_overrides: Arc<BTreeMap<String, CatalogOverride>>,
    pub derived: Arc<Derived>,
}

impl DwellingState {
    pub fn envelope_mut(&mut self) -> &mut Envelope {
        Arc::make_mut(&mut self.envelope)
    }

    pub fn air_leakage_mut(&mut self) -> &mut AirLeakage {
        Arc::make_mut(&mut self.air_leakage)
    }

    pub fn heating_mut(&mut self) -> &mut HeatingSystem {
        Arc::make_mut(&mut self.heating)
    }

    pub fn cooling_mut(&mut self) -> Option<&mut CoolingSystem> {
        self.cooling.as_mut().map(Arc::make_mut)
    }

    pub fn ducts_mut(&mut self) -> &mut Ducts {
        Arc::make_mut(&mut self.ducts)
    }

    pub fn water_heater_mut(&mut self) -> &mut WaterHeater {
        Arc::make_mut(&mut self.water_heater)
    }

    pub fn lighting_mut(&mut self) -> &mut Lighting {
        Arc::make_mut(&mut self.lighting)
    }

    pub fn refrigerators_mut(&mut self) -> &mut Vec<Refrigerator> {
        Arc::make_mut(&mut self.refrigerators)
    }

    pub fn derived_mut(&mut self) -> &mut Derived {
        Arc::make_mut(&mut self.derived)
    }

    /// Whether the user mandated `kind`.
    pub fn is_required(&self, kind: MeasureKind) -> bool {
        self.required_measures.contains(&kind)
    }

    /// Dwelling-level override for `kind`, if the auditor entered one.
    pub fn measure_override(&self, kind: MeasureKind) -> Option<&CatalogOverride> {
        self.measure_overrides.get(kind.key())
    }

    /// Checks that every override key names a known measure and that every
    /// attached itemized cost names a catalog measure it can ride on.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownCategory`] for the first unknown key or
    /// for an itemized cost attached to `itemized`.
    pub fn check_categories(&self) -> Result<(), EngineError> {
        for key in self.measure_overrides.keys() {
            MeasureKind::from_key(key)?;
        }
        if let Some(ic) = self
            .itemized_costs
            .iter()
            .find(|ic| ic.attached_to == Some(MeasureKind::Itemized))
        {
            return Err(EngineError::UnknownCategory {
                field: "attached_to",
                value: format!("{} ({})", MeasureKind::Itemized.key(), ic.code),
            });
        }
        Ok(())
    }

    /// Leakage removed by window and door work, relative to the audit (cfm50).
    pub fn component_leakage_reduction(&self) -> f64 {
        let env = &self.envelope;
        env.windows
            .iter()
            .map(|w| w.audited_leakage_cfm50 - w.leakage_cfm50)
            .chain(
                env.doors
                    .iter()
                    .map(|d| d.audited_leakage_cfm50 - d.leakage_cfm50),
            )
            .sum()
    }

    /// Puts every window and door back at its audited leakage.
    pub fn reset_component_leakage(&mut self) {
        let env = self.envelope_mut();
        for w in &mut env.windows {
            w.leakage_cfm50 = w.audited_leakage_cfm50;
        }
        for d in &mut env.doors {
            d.leakage_cfm50 = d.audited_leakage_cfm50;
        }
    }

    /// Freezes the month-to-season assignment.
    pub fn freeze_seasons(&mut self, seasons: SeasonTable) {
        self.derived_mut().seasons = Some(seasons);
    }

    /// Recomputes the derived sub-record from the current description.
    ///
    /// Natural infiltration below `min_natural_cfm` is floored rather than
    /// rejected; [`Derived::infiltration_floored`] reports when that happened.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation for negative areas, a wall area smaller
    /// than the openings in it, or a non-positive n-factor.
    pub fn refresh_derived(&mut self, min_natural_cfm: f64) -> Result<(), EngineError> {
        let env = &self.envelope;

        let mut gross = 0.0;
        let mut uninsulatable = 0.0;
        for wall in &env.walls {
            invariant!(
                wall.gross_area_ft2 >= 0.0,
                "wall {} has negative area {}",
                wall.code,
                wall.gross_area_ft2
            );
            invariant!(
                (0.0..=1.0).contains(&wall.uninsulatable_fraction),
                "wall {} uninsulatable fraction {} outside [0, 1]",
                wall.code,
                wall.uninsulatable_fraction
            );
            gross += wall.gross_area_ft2;
            uninsulatable += wall.gross_area_ft2 * wall.uninsulatable_fraction;
        }
        let openings: f64 = env.windows.iter().map(|w| w.area_ft2).sum::<f64>()
            + env.doors.iter().map(|d| d.area_ft2).sum::<f64>();
        invariant!(
            env.walls.is_empty() || gross >= openings,
            "window and door area {openings:.1} ft2 exceeds gross wall area {gross:.1} ft2"
        );

        let component_reduction = self.component_leakage_reduction();

        let leak = &self.air_leakage;
        invariant!(
            leak.n_factor > 0.0,
            "blower-door n-factor must be positive, got {}",
            leak.n_factor
        );
        let effective_cfm50 = leak.cfm50 - component_reduction;
        let raw_natural = effective_cfm50 / leak.n_factor;
        let floored = raw_natural < min_natural_cfm;

        let uninsulatable_wall_fraction = if gross > 0.0 {
            uninsulatable / gross
        } else {
            0.0
        };
        let net_wall_area_ft2 = if env.walls.is_empty() {
            0.0
        } else {
            gross - openings
        };

        let derived = self.derived_mut();
        derived.uninsulatable_wall_fraction = uninsulatable_wall_fraction;
        derived.net_wall_area_ft2 = net_wall_area_ft2;
        derived.effective_cfm50 = effective_cfm50;
        derived.natural_cfm = raw_natural.max(min_natural_cfm);
        derived.infiltration_floored = floored;
        Ok(())
    }

    /// Window group by code.
    pub fn window(&self, code: &ComponentCode) -> Option<&WindowGroup> {
        self.envelope.windows.iter().find(|w| &w.code == code)
    }

    /// Door group by code.
    pub fn door(&self, code: &ComponentCode) -> Option<&DoorGroup> {
        self.envelope.doors.iter().find(|d| &d.code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dwelling::DwellingInput;

    fn sample_state() -> DwellingState {
        let mut state = DwellingState::from(DwellingInput::sample());
        state.refresh_derived(5.0).unwrap();
        state
    }

    #[test]
    fn clone_shares_untouched_sub_records() {
        let state = sample_state();
        let mut copy = state.clone();
        copy.heating_mut().afue = 0.95;
        assert!(Arc::ptr_eq(&state.envelope, &copy.envelope));
        assert!(!Arc::ptr_eq(&state.heating, &copy.heating));
        assert_ne!(state.heating.afue, copy.heating.afue);
    }

    #[test]
    fn derived_net_wall_area_excludes_openings() {
        let state = sample_state();
        let gross: f64 = state.envelope.walls.iter().map(|w| w.gross_area_ft2).sum();
        let openings: f64 = state.envelope.windows.iter().map(|w| w.area_ft2).sum::<f64>()
            + state.envelope.doors.iter().map(|d| d.area_ft2).sum::<f64>();
        assert!((state.derived.net_wall_area_ft2 - (gross - openings)).abs() < 1e-9);
    }

    #[test]
    fn component_leakage_reduction_lowers_effective_cfm50() {
        let mut state = sample_state();
        let before = state.derived.effective_cfm50;
        state.envelope_mut().windows[0].leakage_cfm50 -= 50.0;
        state.refresh_derived(5.0).unwrap();
        assert!((before - state.derived.effective_cfm50 - 50.0).abs() < 1e-9);
    }

    #[test]
    fn resetting_component_leakage_restores_the_audited_figure() {
        let mut state = sample_state();
        let audited = state.derived.effective_cfm50;
        state.envelope_mut().windows[0].leakage_cfm50 -= 40.0;
        state.envelope_mut().doors[0].leakage_cfm50 -= 10.0;
        assert!((state.component_leakage_reduction() - 50.0).abs() < 1e-9);
        state.reset_component_leakage();
        state.refresh_derived(5.0).unwrap();
        assert_eq!(state.component_leakage_reduction(), 0.0);
        assert_eq!(state.derived.effective_cfm50, audited);
    }

    #[test]
    fn infiltration_below_floor_is_clamped_and_flagged() {
        let mut state = sample_state();
        state.air_leakage_mut().cfm50 = 10.0;
        state.refresh_derived(5.0).unwrap();
        assert!(state.derived.infiltration_floored);
        assert_eq!(state.derived.natural_cfm, 5.0);
    }

    #[test]
    fn zero_n_factor_is_fatal() {
        let mut state = sample_state();
        state.air_leakage_mut().n_factor = 0.0;
        let err = state.refresh_derived(5.0).unwrap_err();
        assert!(matches!(err, EngineError::InvariantViolation { .. }));
    }

    #[test]
    fn unknown_override_key_is_rejected() {
        let mut state = sample_state();
        Arc::make_mut(&mut state.measure_overrides)
            .insert("solar_shingles".to_string(), CatalogOverride::default());
        let err = state.check_categories().unwrap_err();
        assert!(matches!(err, EngineError::UnknownCategory { .. }));
    }

    #[test]
    fn itemized_cost_attached_to_itemized_is_rejected() {
        let mut state = sample_state();
        assert!(state.check_categories().is_ok());
        Arc::make_mut(&mut state.itemized_costs)[0].attached_to = Some(MeasureKind::Itemized);
        let err = state.check_categories().unwrap_err();
        assert!(matches!(
            err,
            EngineError::UnknownCategory {
                field: "attached_to",
                ..
            }
        ));
    }

    #[test]
    fn openings_larger_than_walls_are_fatal() {
        let mut state = sample_state();
        state.envelope_mut().windows[0].area_ft2 = 1.0e6;
        assert!(state.refresh_derived(5.0).is_err());
    }
}
