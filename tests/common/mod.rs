//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use rand::Rng;
use rand::rngs::StdRng;

use retrofit_eval::audit::{AuditOutcome, PassOrchestrator};
use retrofit_eval::config::AuditConfig;
use retrofit_eval::dwelling::{
    DeclaredSavings, DwellingInput, DwellingState, ItemizedCategory, ItemizedCost,
};
use retrofit_eval::energy::{EndUse, Fuel};

/// The built-in sample house, not yet refreshed.
pub fn sample_state() -> DwellingState {
    DwellingState::from(DwellingInput::sample())
}

/// Runs a full audit of `input` under `config`.
pub fn run(config: AuditConfig, input: DwellingInput) -> AuditOutcome {
    PassOrchestrator::from_config(config)
        .expect("config should be valid")
        .run(DwellingState::from(input))
        .expect("audit should complete")
}

/// Full audit of the sample house with the default preset.
pub fn default_outcome() -> AuditOutcome {
    run(AuditConfig::default(), DwellingInput::sample())
}

/// Flat economics: $100/MMBtu electricity, no discounting, no electric
/// escalation. A one-year lifetime then makes SIR = 100 × savings / cost.
pub fn flat_electric_config() -> AuditConfig {
    AuditConfig::from_toml_str(
        r#"
[economics]
discount_rate = 0.0

[fuel_prices]
electricity = 100.0

[escalation]
electricity = []
"#,
    )
    .expect("flat config should parse")
}

/// Itemized electric baseload saving with a one-year lifetime.
pub fn declared_item(code: &str, cost: f64, mmbtu: f64) -> ItemizedCost {
    ItemizedCost {
        code: code.into(),
        description: format!("declared baseload saving {code}"),
        cost,
        category: ItemizedCategory::Energy,
        savings: Some(DeclaredSavings {
            end_use: EndUse::Baseload,
            fuel: Fuel::Electricity,
            mmbtu,
        }),
        attached_to: None,
        component: None,
        lifetime_years: Some(1),
    }
}

/// Sample house whose lighting and refrigerator are already efficient, plus
/// two declared items: 1.5 MMBtu for $100 and 0.5 MMBtu for $200.
pub fn two_item_dwelling() -> DwellingInput {
    let mut input = DwellingInput::sample();
    input.lighting.retrofitted = true;
    for r in &mut input.refrigerators {
        r.replaced = true;
    }
    input.itemized_costs.push(declared_item("M1", 100.0, 1.5));
    input.itemized_costs.push(declared_item("M2", 200.0, 0.5));
    input
}

/// Path of a file under `scenarios/`.
pub fn scenario(name: &str) -> String {
    format!("{}/scenarios/{name}", env!("CARGO_MANIFEST_DIR"))
}

/// Applies one random edit to `state`.
pub fn mutate(rng: &mut StdRng, state: &mut DwellingState) {
    match rng.random_range(0..8) {
        0 => state.heating_mut().afue = rng.random_range(0.5..0.99),
        1 => {
            let r = rng.random_range(0.0..40.0);
            state.envelope_mut().attics[0].added_r = r;
        }
        2 => {
            let i = rng.random_range(0..state.envelope.windows.len());
            state.envelope_mut().windows[i].has_storm = rng.random_bool(0.5);
        }
        3 => {
            let cfm = rng.random_range(500.0..4000.0);
            state.air_leakage_mut().cfm50 = cfm;
        }
        4 => state.ducts_mut().sealed = true,
        5 => state.lighting_mut().lamps = rng.random_range(0..40),
        6 => state.water_heater_mut().low_flow_showers = rng.random_bool(0.5),
        _ => state.refrigerators_mut().clear(),
    }
}
