//! TOML dwelling descriptions and the built-in sample house.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use super::component::ComponentCode;
use super::state::{
    AirLeakage, Attic, CoolingSystem, DoorGroup, Ducts, DwellingState, Envelope, Foundation,
    FoundationKind, HeatingSystem, ItemizedCategory, ItemizedCost, Lighting, Refrigerator, Site,
    WallSegment, WaterHeater, WindowGroup,
};
use crate::config::{CatalogOverride, ConfigError};
use crate::energy::Fuel;
use crate::measures::MeasureKind;

/// Dwelling description as entered by the auditor.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DwellingInput {
    pub site: Site,
    pub envelope: Envelope,
    pub air_leakage: AirLeakage,
    pub heating: HeatingSystem,
    #[serde(default)]
    pub cooling: Option<CoolingSystem>,
    pub ducts: Ducts,
    pub water_heater: WaterHeater,
    pub lighting: Lighting,
    #[serde(default)]
    pub refrigerators: Vec<Refrigerator>,
    #[serde(default)]
    pub itemized_costs: Vec<ItemizedCost>,
    #[serde(default)]
    pub required_measures: BTreeSet<MeasureKind>,
    #[serde(default)]
    pub measure_overrides: BTreeMap<String, CatalogOverride>,
}

impl DwellingInput {
    /// Parses a dwelling from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "dwelling".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a dwelling from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "dwelling".to_string(),
            message: e.to_string(),
        })
    }

    /// A 1,400 ft² single-story house with a gas furnace, an old central
    /// air conditioner, single-pane windows, and a leaky envelope.
    pub fn sample() -> Self {
        Self {
            site: Site {
                floor_area_ft2: 1400.0,
                stories: 1,
                monthly_hdd: [
                    820.0, 650.0, 480.0, 230.0, 80.0, 5.0, 0.0, 0.0, 30.0, 220.0, 480.0, 740.0,
                ],
                monthly_cdd: [
                    0.0, 0.0, 10.0, 40.0, 150.0, 330.0, 450.0, 420.0, 250.0, 50.0, 0.0, 0.0,
                ],
                cooling_solar_btu_per_ft2: 9_000.0,
            },
            envelope: Envelope {
                attics: vec![Attic {
                    code: "A1".into(),
                    area_ft2: 1400.0,
                    existing_r: 7.0,
                    added_r: 0.0,
                    floored: false,
                }],
                walls: vec![
                    WallSegment {
                        code: "WL1".into(),
                        gross_area_ft2: 780.0,
                        existing_r: 4.0,
                        added_r: 0.0,
                        cavity_insulated: false,
                        uninsulatable_fraction: 0.1,
                    },
                    WallSegment {
                        code: "WL2".into(),
                        gross_area_ft2: 520.0,
                        existing_r: 11.0,
                        added_r: 0.0,
                        cavity_insulated: true,
                        uninsulatable_fraction: 0.0,
                    },
                ],
                windows: vec![
                    WindowGroup {
                        code: "W1".into(),
                        count: 8,
                        area_ft2: 120.0,
                        u_value: 1.10,
                        shgc: 0.75,
                        leakage_cfm50: 240.0,
                        audited_leakage_cfm50: 240.0,
                        has_storm: false,
                        replaced: false,
                    },
                    WindowGroup {
                        code: "W2".into(),
                        count: 4,
                        area_ft2: 48.0,
                        u_value: 0.55,
                        shgc: 0.60,
                        leakage_cfm50: 60.0,
                        audited_leakage_cfm50: 60.0,
                        has_storm: false,
                        replaced: false,
                    },
                ],
                doors: vec![DoorGroup {
                    code: "D1".into(),
                    count: 2,
                    area_ft2: 40.0,
                    u_value: 0.50,
                    leakage_cfm50: 150.0,
                    audited_leakage_cfm50: 150.0,
                    weatherstripped: false,
                    replaced: false,
                }],
                foundation: Foundation {
                    code: "FND".into(),
                    kind: FoundationKind::Crawlspace,
                    floor_area_ft2: 1400.0,
                    existing_r: 0.0,
                    added_r: 0.0,
                },
            },
            air_leakage: AirLeakage {
                cfm50: 3200.0,
                n_factor: 18.0,
                target_cfm50: 2000.0,
            },
            heating: HeatingSystem {
                fuel: Fuel::NaturalGas,
                afue: 0.65,
                red_tagged: false,
                tuned: false,
                setback: false,
            },
            cooling: Some(CoolingSystem { seer: 9.0 }),
            ducts: Ducts {
                distribution_efficiency: 0.75,
                sealed: false,
                outside_envelope: true,
            },
            water_heater: WaterHeater {
                fuel: Fuel::NaturalGas,
                energy_factor: 0.55,
                tank_insulated: false,
                gallons_per_day: 64.0,
                temperature_rise_f: 70.0,
                low_flow_showers: false,
            },
            lighting: Lighting {
                lamps: 20,
                watts_per_lamp: 60.0,
                hours_per_day: 3.0,
                retrofitted: false,
            },
            refrigerators: vec![Refrigerator {
                code: "RF1".into(),
                annual_kwh: 1250.0,
                replaced: false,
            }],
            itemized_costs: vec![
                ItemizedCost {
                    code: "IC1".into(),
                    description: "Install CO alarm and repair range venting".to_string(),
                    cost: 350.0,
                    category: ItemizedCategory::HealthAndSafety,
                    savings: None,
                    attached_to: None,
                    component: None,
                    lifetime_years: None,
                },
                ItemizedCost {
                    code: "IC2".into(),
                    description: "Attic ventilation baffles".to_string(),
                    cost: 150.0,
                    category: ItemizedCategory::IncidentalRepair,
                    savings: None,
                    attached_to: Some(MeasureKind::AtticInsulation),
                    component: Some(ComponentCode::from("A1")),
                    lifetime_years: None,
                },
            ],
            required_measures: BTreeSet::new(),
            measure_overrides: BTreeMap::new(),
        }
    }
}

impl From<DwellingInput> for DwellingState {
    fn from(input: DwellingInput) -> Self {
        let mut envelope = input.envelope;
        for w in &mut envelope.windows {
            w.audited_leakage_cfm50 = w.leakage_cfm50;
        }
        for d in &mut envelope.doors {
            d.audited_leakage_cfm50 = d.leakage_cfm50;
        }

        Self {
            site: Arc::new(input.site),
            envelope: Arc::new(envelope),
            air_leakage: Arc::new(input.air_leakage),
            heating: Arc::new(input.heating),
            cooling: input.cooling.map(Arc::new),
            ducts: Arc::new(input.ducts),
            water_heater: Arc::new(input.water_heater),
            lighting: Arc::new(input.lighting),
            refrigerators: Arc::new(input.refrigerators),
            itemized_costs: Arc::new(input.itemized_costs),
            required_measures: Arc::new(input.required_measures),
            measure_overrides: Arc::new(input.measure_overrides),
            derived: Arc::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
required_measures = ["duct_sealing"]

[site]
floor_area_ft2 = 1000.0
stories = 1
monthly_hdd = [700, 600, 400, 200, 50, 0, 0, 0, 20, 200, 450, 650]
monthly_cdd = [0, 0, 0, 20, 100, 250, 350, 300, 150, 20, 0, 0]

[envelope.foundation]
code = "FND"
kind = "slab"
floor_area_ft2 = 1000.0
existing_r = 0.0

[[envelope.windows]]
code = "W1"
count = 6
area_ft2 = 90.0
u_value = 1.1
shgc = 0.7
leakage_cfm50 = 120.0

[air_leakage]
cfm50 = 2500.0
n_factor = 17.0
target_cfm50 = 1800.0

[heating]
fuel = "propane"
afue = 0.7

[ducts]
distribution_efficiency = 0.8

[water_heater]
fuel = "electricity"
energy_factor = 0.88
gallons_per_day = 50.0
temperature_rise_f = 65.0

[lighting]
lamps = 12
watts_per_lamp = 60.0
hours_per_day = 2.5
"#;

    #[test]
    fn minimal_toml_parses_with_defaults() {
        let input = DwellingInput::from_toml_str(MINIMAL);
        assert!(input.is_ok(), "should parse: {:?}", input.err());
        let input = input.unwrap();
        assert!(input.cooling.is_none());
        assert!(input.envelope.attics.is_empty());
        assert!(input.required_measures.contains(&MeasureKind::DuctSealing));
        assert_eq!(input.heating.fuel, Fuel::Propane);
    }

    #[test]
    fn conversion_records_audited_leakage() {
        let state = DwellingState::from(DwellingInput::from_toml_str(MINIMAL).unwrap());
        let w = &state.envelope.windows[0];
        assert_eq!(w.audited_leakage_cfm50, 120.0);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let toml = MINIMAL.replace("stories = 1", "stories = 1\nbasement_bar = true");
        let err = DwellingInput::from_toml_str(&toml).unwrap_err();
        assert_eq!(err.field, "dwelling");
    }

    #[test]
    fn unknown_required_measure_is_rejected() {
        let toml = MINIMAL.replace("duct_sealing", "hot_tub_cover");
        assert!(DwellingInput::from_toml_str(&toml).is_err());
    }

    #[test]
    fn sample_converts() {
        let state = DwellingState::from(DwellingInput::sample());
        assert_eq!(state.envelope.windows.len(), 2);
        assert!(state.cooling.is_some());
    }
}
