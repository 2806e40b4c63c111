//! TOML-based audit configuration and preset definitions.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::energy::Fuel;
use crate::measures::MeasureKind;

/// Top-level audit configuration parsed from TOML.
///
/// All sections have defaults matching the `default` preset. Load from TOML
/// with [`AuditConfig::from_toml_file`] or use [`AuditConfig::default`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Acceptance threshold, discounting, and clamps.
    #[serde(default)]
    pub economics: EconomicsConfig,
    /// Current fuel prices.
    #[serde(default)]
    pub fuel_prices: FuelPricesConfig,
    /// Annual real fuel price escalation.
    #[serde(default)]
    pub escalation: EscalationConfig,
    /// Catalog overrides keyed by measure key (e.g. `[catalog.storm_window]`).
    #[serde(default)]
    pub catalog: BTreeMap<String, CatalogOverride>,
}

/// Acceptance threshold, discounting, and clamps.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EconomicsConfig {
    /// SIR a measure must reach to be admitted (must be >= 0).
    pub minimum_sir: f64,
    /// Real discount rate (0.0–1.0).
    pub discount_rate: f64,
    /// Cap on any measure lifetime (years, must be > 0).
    pub max_lifetime_years: u32,
    /// Floor on natural infiltration (cfm, must be >= 0).
    pub min_natural_cfm: f64,
}

impl Default for EconomicsConfig {
    fn default() -> Self {
        Self {
            minimum_sir: 1.0,
            discount_rate: 0.03,
            max_lifetime_years: 30,
            min_natural_cfm: 5.0,
        }
    }
}

/// Fuel prices ($/MMBtu).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FuelPricesConfig {
    pub electricity: f64,
    pub natural_gas: f64,
    pub propane: f64,
    pub fuel_oil: f64,
    pub kerosene: f64,
    pub wood: f64,
}

impl Default for FuelPricesConfig {
    fn default() -> Self {
        Self {
            // $0.14/kWh
            electricity: 41.0,
            natural_gas: 12.0,
            propane: 28.0,
            fuel_oil: 25.0,
            kerosene: 27.0,
            wood: 10.0,
        }
    }
}

impl FuelPricesConfig {
    pub fn price(&self, fuel: Fuel) -> f64 {
        match fuel {
            Fuel::Electricity => self.electricity,
            Fuel::NaturalGas => self.natural_gas,
            Fuel::Propane => self.propane,
            Fuel::FuelOil => self.fuel_oil,
            Fuel::Kerosene => self.kerosene,
            Fuel::Wood => self.wood,
        }
    }
}

/// Annual real escalation rates per fuel, year 1 first.
///
/// Years past the end of a list reuse its last rate; an empty list means no
/// escalation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EscalationConfig {
    pub electricity: Vec<f64>,
    pub natural_gas: Vec<f64>,
    pub propane: Vec<f64>,
    pub fuel_oil: Vec<f64>,
    pub kerosene: Vec<f64>,
    pub wood: Vec<f64>,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            electricity: vec![0.0, 0.002, 0.004, 0.005],
            natural_gas: vec![0.01, 0.012, 0.011, 0.008],
            propane: vec![0.006],
            fuel_oil: vec![0.008],
            kerosene: vec![0.008],
            wood: Vec::new(),
        }
    }
}

impl EscalationConfig {
    pub fn rates(&self, fuel: Fuel) -> &[f64] {
        match fuel {
            Fuel::Electricity => &self.electricity,
            Fuel::NaturalGas => &self.natural_gas,
            Fuel::Propane => &self.propane,
            Fuel::FuelOil => &self.fuel_oil,
            Fuel::Kerosene => &self.kerosene,
            Fuel::Wood => &self.wood,
        }
    }
}

/// Override of one catalog entry. Unset fields keep the catalog value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogOverride {
    pub material_per_unit: Option<f64>,
    pub labor_per_unit: Option<f64>,
    pub lifetime_years: Option<u32>,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"economics.discount_rate"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl AuditConfig {
    /// Returns the strict preset: measures must pay back one and a half times.
    pub fn strict() -> Self {
        Self {
            economics: EconomicsConfig {
                minimum_sir: 1.5,
                max_lifetime_years: 20,
                ..EconomicsConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the high-discount preset: 7% real discount rate, no escalation.
    pub fn high_discount() -> Self {
        Self {
            economics: EconomicsConfig {
                discount_rate: 0.07,
                ..EconomicsConfig::default()
            },
            escalation: EscalationConfig {
                electricity: Vec::new(),
                natural_gas: Vec::new(),
                propane: Vec::new(),
                fuel_oil: Vec::new(),
                kerosene: Vec::new(),
                wood: Vec::new(),
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["default", "strict", "high_discount"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "default" => Ok(Self::default()),
            "strict" => Ok(Self::strict()),
            "high_discount" => Ok(Self::high_discount()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let e = &self.economics;

        if !(e.minimum_sir >= 0.0) {
            errors.push(ConfigError {
                field: "economics.minimum_sir".into(),
                message: "must be >= 0".into(),
            });
        }
        if !(0.0..=1.0).contains(&e.discount_rate) {
            errors.push(ConfigError {
                field: "economics.discount_rate".into(),
                message: "must be in [0.0, 1.0]".into(),
            });
        }
        if e.max_lifetime_years == 0 {
            errors.push(ConfigError {
                field: "economics.max_lifetime_years".into(),
                message: "must be > 0".into(),
            });
        }
        if !(e.min_natural_cfm >= 0.0) {
            errors.push(ConfigError {
                field: "economics.min_natural_cfm".into(),
                message: "must be >= 0".into(),
            });
        }

        for fuel in Fuel::ALL {
            if !(self.fuel_prices.price(fuel) >= 0.0) {
                errors.push(ConfigError {
                    field: format!("fuel_prices.{}", fuel.key()),
                    message: "must be >= 0".into(),
                });
            }
            if self.escalation.rates(fuel).iter().any(|r| !(*r > -1.0)) {
                errors.push(ConfigError {
                    field: format!("escalation.{}", fuel.key()),
                    message: "rates must be > -1.0".into(),
                });
            }
        }

        for (key, ov) in &self.catalog {
            if MeasureKind::from_key(key).is_err() {
                errors.push(ConfigError {
                    field: format!("catalog.{key}"),
                    message: "unknown measure".into(),
                });
                continue;
            }
            let negative = [ov.material_per_unit, ov.labor_per_unit]
                .into_iter()
                .flatten()
                .any(|v| !(v >= 0.0));
            if negative {
                errors.push(ConfigError {
                    field: format!("catalog.{key}"),
                    message: "unit costs must be >= 0".into(),
                });
            }
            if ov.lifetime_years == Some(0) {
                errors.push(ConfigError {
                    field: format!("catalog.{key}.lifetime_years"),
                    message: "must be > 0".into(),
                });
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preset_valid() {
        let errors = AuditConfig::default().validate();
        assert!(errors.is_empty(), "default should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = AuditConfig::from_preset("nonexistent");
        assert!(err.is_err());
        assert!(err.unwrap_err().message.contains("unknown preset"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in AuditConfig::PRESETS {
            let cfg = AuditConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(errors.is_empty(), "preset \"{name}\" should be valid: {errors:?}");
        }
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[economics]
minimum_sir = 1.2
discount_rate = 0.04
max_lifetime_years = 25
min_natural_cfm = 3.0

[fuel_prices]
natural_gas = 14.5

[escalation]
natural_gas = [0.02, 0.015]

[catalog.storm_window]
material_per_unit = 5.0
lifetime_years = 25
"#;
        let cfg = AuditConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.unwrap();
        assert_eq!(cfg.economics.minimum_sir, 1.2);
        assert_eq!(cfg.fuel_prices.price(Fuel::NaturalGas), 14.5);
        assert_eq!(cfg.fuel_prices.price(Fuel::Electricity), 41.0);
        assert_eq!(cfg.escalation.rates(Fuel::NaturalGas), &[0.02, 0.015]);
        assert_eq!(cfg.catalog["storm_window"].lifetime_years, Some(25));
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[economics]
minimum_sir = 1.0
bogus_field = true
"#;
        assert!(AuditConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_catches_bad_discount_rate() {
        let mut cfg = AuditConfig::default();
        cfg.economics.discount_rate = 1.5;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "economics.discount_rate"));
    }

    #[test]
    fn validation_catches_unknown_catalog_key() {
        let mut cfg = AuditConfig::default();
        cfg.catalog.insert("solar_shingles".into(), CatalogOverride::default());
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "catalog.solar_shingles"));
    }

    #[test]
    fn validation_reports_every_error() {
        let mut cfg = AuditConfig::default();
        cfg.economics.minimum_sir = -1.0;
        cfg.economics.max_lifetime_years = 0;
        cfg.fuel_prices.propane = -3.0;
        assert_eq!(cfg.validate().len(), 3);
    }

    #[test]
    fn strict_raises_threshold() {
        let base = AuditConfig::default();
        let strict = AuditConfig::strict();
        assert!(strict.economics.minimum_sir > base.economics.minimum_sir);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let cfg = AuditConfig::from_toml_str("[economics]\nminimum_sir = 2.0\n").unwrap();
        assert_eq!(cfg.economics.minimum_sir, 2.0);
        assert_eq!(cfg.economics.max_lifetime_years, 30);
        assert_eq!(cfg.fuel_prices.natural_gas, 12.0);
    }
}
