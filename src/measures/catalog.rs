//! Measure catalog: recognized retrofit types, unit costs, and lifetimes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::CatalogOverride;
use crate::energy::EndUse;
use crate::error::EngineError;

/// Retrofit measure types, in fixed evaluation order.
///
/// The derived `Ord` follows declaration order, which is also the order in
/// which the passes visit measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureKind {
    AtticInsulation,
    AtticBattInsulation,
    WallInsulation,
    FoundationInsulation,
    WindowReplacement,
    StormWindow,
    DoorReplacement,
    DoorWeatherstrip,
    InfiltrationReduction,
    DuctSealing,
    HeatingReplacement,
    HeatingTuneUp,
    ProgrammableThermostat,
    CoolingReplacement,
    WaterHeaterReplacement,
    WaterHeaterWrap,
    LowFlowShowerhead,
    LightingRetrofit,
    RefrigeratorReplacement,
    Itemized,
}

const HEAT_COOL: &[EndUse] = &[EndUse::Heating, EndUse::Cooling];
const HEAT: &[EndUse] = &[EndUse::Heating];
const COOL: &[EndUse] = &[EndUse::Cooling];
const BASE: &[EndUse] = &[EndUse::Baseload];

impl MeasureKind {
    /// Every kind in evaluation order.
    pub const ORDER: [MeasureKind; 20] = [
        MeasureKind::AtticInsulation,
        MeasureKind::AtticBattInsulation,
        MeasureKind::WallInsulation,
        MeasureKind::FoundationInsulation,
        MeasureKind::WindowReplacement,
        MeasureKind::StormWindow,
        MeasureKind::DoorReplacement,
        MeasureKind::DoorWeatherstrip,
        MeasureKind::InfiltrationReduction,
        MeasureKind::DuctSealing,
        MeasureKind::HeatingReplacement,
        MeasureKind::HeatingTuneUp,
        MeasureKind::ProgrammableThermostat,
        MeasureKind::CoolingReplacement,
        MeasureKind::WaterHeaterReplacement,
        MeasureKind::WaterHeaterWrap,
        MeasureKind::LowFlowShowerhead,
        MeasureKind::LightingRetrofit,
        MeasureKind::RefrigeratorReplacement,
        MeasureKind::Itemized,
    ];

    /// Snake-case key used in TOML files and CSV output.
    pub fn key(self) -> &'static str {
        match self {
            MeasureKind::AtticInsulation => "attic_insulation",
            MeasureKind::AtticBattInsulation => "attic_batt_insulation",
            MeasureKind::WallInsulation => "wall_insulation",
            MeasureKind::FoundationInsulation => "foundation_insulation",
            MeasureKind::WindowReplacement => "window_replacement",
            MeasureKind::StormWindow => "storm_window",
            MeasureKind::DoorReplacement => "door_replacement",
            MeasureKind::DoorWeatherstrip => "door_weatherstrip",
            MeasureKind::InfiltrationReduction => "infiltration_reduction",
            MeasureKind::DuctSealing => "duct_sealing",
            MeasureKind::HeatingReplacement => "heating_replacement",
            MeasureKind::HeatingTuneUp => "heating_tune_up",
            MeasureKind::ProgrammableThermostat => "programmable_thermostat",
            MeasureKind::CoolingReplacement => "cooling_replacement",
            MeasureKind::WaterHeaterReplacement => "water_heater_replacement",
            MeasureKind::WaterHeaterWrap => "water_heater_wrap",
            MeasureKind::LowFlowShowerhead => "low_flow_showerhead",
            MeasureKind::LightingRetrofit => "lighting_retrofit",
            MeasureKind::RefrigeratorReplacement => "refrigerator_replacement",
            MeasureKind::Itemized => "itemized",
        }
    }

    /// Parses a snake-case key.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownCategory`] for unrecognized keys.
    pub fn from_key(key: &str) -> Result<Self, EngineError> {
        Self::ORDER
            .into_iter()
            .find(|k| k.key() == key)
            .ok_or_else(|| EngineError::UnknownCategory {
                field: "measure",
                value: key.to_string(),
            })
    }

    /// End uses whose energy the measure may change.
    pub fn end_uses(self) -> &'static [EndUse] {
        match self {
            MeasureKind::AtticInsulation
            | MeasureKind::AtticBattInsulation
            | MeasureKind::WallInsulation
            | MeasureKind::WindowReplacement
            | MeasureKind::StormWindow
            | MeasureKind::DoorReplacement
            | MeasureKind::DoorWeatherstrip
            | MeasureKind::FoundationInsulation
            | MeasureKind::InfiltrationReduction
            | MeasureKind::DuctSealing
            | MeasureKind::ProgrammableThermostat => HEAT_COOL,
            MeasureKind::HeatingReplacement | MeasureKind::HeatingTuneUp => HEAT,
            MeasureKind::CoolingReplacement => COOL,
            MeasureKind::WaterHeaterReplacement
            | MeasureKind::WaterHeaterWrap
            | MeasureKind::LowFlowShowerhead
            | MeasureKind::LightingRetrofit
            | MeasureKind::RefrigeratorReplacement => BASE,
            MeasureKind::Itemized => &[EndUse::Heating, EndUse::Cooling, EndUse::Baseload],
        }
    }

    /// Component-specific measures that also change envelope leakage.
    ///
    /// At most one of these may claim a given component per pass.
    pub fn affects_component_leakage(self) -> bool {
        matches!(
            self,
            MeasureKind::WindowReplacement
                | MeasureKind::StormWindow
                | MeasureKind::DoorReplacement
                | MeasureKind::DoorWeatherstrip
        )
    }
}

impl fmt::Display for MeasureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Quantity unit a catalog cost is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostUnit {
    SquareFoot,
    Each,
    Cfm50Reduced,
    System,
}

impl fmt::Display for CostUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CostUnit::SquareFoot => "ft2",
            CostUnit::Each => "ea",
            CostUnit::Cfm50Reduced => "cfm50",
            CostUnit::System => "system",
        };
        f.write_str(s)
    }
}

/// Default pricing and lifetime for one measure kind.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub unit: CostUnit,
    /// Material cost per unit ($).
    pub material_per_unit: f64,
    /// Labor cost per unit ($).
    pub labor_per_unit: f64,
    pub lifetime_years: u32,
}

impl CatalogEntry {
    const fn new(
        name: &'static str,
        unit: CostUnit,
        material_per_unit: f64,
        labor_per_unit: f64,
        lifetime_years: u32,
    ) -> Self {
        Self {
            name,
            unit,
            material_per_unit,
            labor_per_unit,
            lifetime_years,
        }
    }
}

/// Static table of recognized measures, optionally overridden from config.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: BTreeMap<MeasureKind, CatalogEntry>,
}

impl Catalog {
    /// Built-in default costs (2020s weatherization averages).
    pub fn standard() -> Self {
        use CostUnit::{Cfm50Reduced, Each, SquareFoot, System};
        use MeasureKind as K;

        let table = [
            (K::AtticInsulation, CatalogEntry::new("Attic insulation (loose fill)", SquareFoot, 0.45, 0.35, 25)),
            (K::AtticBattInsulation, CatalogEntry::new("Attic insulation (batts)", SquareFoot, 0.55, 0.45, 25)),
            (K::WallInsulation, CatalogEntry::new("Wall insulation (dense pack)", SquareFoot, 0.70, 0.90, 25)),
            (K::FoundationInsulation, CatalogEntry::new("Floor insulation", SquareFoot, 0.60, 0.70, 25)),
            (K::WindowReplacement, CatalogEntry::new("Window replacement", SquareFoot, 28.0, 12.0, 20)),
            (K::StormWindow, CatalogEntry::new("Storm windows", SquareFoot, 6.0, 3.0, 20)),
            (K::DoorReplacement, CatalogEntry::new("Door replacement", Each, 350.0, 200.0, 20)),
            (K::DoorWeatherstrip, CatalogEntry::new("Door weatherstripping", Each, 15.0, 35.0, 5)),
            (K::InfiltrationReduction, CatalogEntry::new("Air sealing", Cfm50Reduced, 0.10, 0.40, 10)),
            (K::DuctSealing, CatalogEntry::new("Duct sealing", System, 80.0, 320.0, 15)),
            (K::HeatingReplacement, CatalogEntry::new("Heating system replacement", System, 2600.0, 1400.0, 20)),
            (K::HeatingTuneUp, CatalogEntry::new("Heating system tune-up", System, 20.0, 130.0, 5)),
            (K::ProgrammableThermostat, CatalogEntry::new("Programmable thermostat", Each, 60.0, 40.0, 10)),
            (K::CoolingReplacement, CatalogEntry::new("Cooling system replacement", System, 2900.0, 1300.0, 15)),
            (K::WaterHeaterReplacement, CatalogEntry::new("Water heater replacement", System, 700.0, 400.0, 13)),
            (K::WaterHeaterWrap, CatalogEntry::new("Water heater wrap", Each, 25.0, 20.0, 10)),
            (K::LowFlowShowerhead, CatalogEntry::new("Low-flow showerhead", Each, 12.0, 10.0, 10)),
            (K::LightingRetrofit, CatalogEntry::new("LED lamps", Each, 3.0, 1.0, 15)),
            (K::RefrigeratorReplacement, CatalogEntry::new("Refrigerator replacement", Each, 650.0, 75.0, 15)),
            (K::Itemized, CatalogEntry::new("Itemized cost", Each, 0.0, 0.0, 15)),
        ];

        Self {
            entries: table.into_iter().collect(),
        }
    }

    /// Applies configured overrides on top of the standard table.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownCategory`] if an override names an
    /// unknown measure key.
    pub fn with_overrides(
        mut self,
        overrides: &BTreeMap<String, CatalogOverride>,
    ) -> Result<Self, EngineError> {
        for (key, ov) in overrides {
            let kind = MeasureKind::from_key(key)?;
            let entry = self.entry_mut(kind)?;
            if let Some(m) = ov.material_per_unit {
                entry.material_per_unit = m;
            }
            if let Some(l) = ov.labor_per_unit {
                entry.labor_per_unit = l;
            }
            if let Some(y) = ov.lifetime_years {
                entry.lifetime_years = y;
            }
        }
        Ok(self)
    }

    /// Catalog entry for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MissingRecord`] if the table has no entry.
    pub fn entry(&self, kind: MeasureKind) -> Result<&CatalogEntry, EngineError> {
        self.entries.get(&kind).ok_or_else(|| EngineError::MissingRecord {
            what: format!("catalog entry for {kind}"),
        })
    }

    fn entry_mut(&mut self, kind: MeasureKind) -> Result<&mut CatalogEntry, EngineError> {
        self.entries
            .get_mut(&kind)
            .ok_or_else(|| EngineError::MissingRecord {
                what: format!("catalog entry for {kind}"),
            })
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}
