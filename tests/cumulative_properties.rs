//! The cumulative running baseline always matches the committed dwelling.

mod common;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use retrofit_eval::audit::{AuditContext, evaluate_measure};
use retrofit_eval::config::AuditConfig;
use retrofit_eval::dwelling::{DwellingInput, DwellingState};
use retrofit_eval::economics::EscalationTable;
use retrofit_eval::energy::{DegreeDayOracle, EnergyOracle, EnergyUse, EvaluationPass};
use retrofit_eval::measures::{Catalog, registry};

const EPS: f64 = 1e-9;

fn assert_tracks(running: &EnergyUse, actual: &EnergyUse, after: &str) {
    let pairs = [
        ("heating", running.heating_mmbtu(), actual.heating_mmbtu()),
        ("cooling", running.cooling_mmbtu(), actual.cooling_mmbtu()),
        ("baseload", running.baseload_mmbtu(), actual.baseload_mmbtu()),
    ];
    for (end_use, running, actual) in pairs {
        assert!(
            (running - actual).abs() < EPS,
            "{end_use} baseline {running} drifted from dwelling {actual} after {after}"
        );
    }
}

/// Runs every measure cumulatively on `state`, checking the running
/// baseline against a fresh oracle call after each one. Returns the number
/// of commits.
fn check_cumulative_baseline(mut state: DwellingState) -> usize {
    let config = AuditConfig::default();
    let economics = EscalationTable::from_config(&config);
    let catalog = Catalog::standard();
    let oracle = DegreeDayOracle::new();

    state.refresh_derived(config.economics.min_natural_cfm).unwrap();
    let seasons = oracle.season_table(&state).unwrap();
    state.freeze_seasons(seasons);

    let mut ctx = AuditContext::new(state, &oracle, &economics, &catalog, &config.economics);
    let base = oracle.compute_energy(&ctx.state, EvaluationPass::BaseCase).unwrap();
    ctx.set_base(base);
    ctx.begin_pass(EvaluationPass::Cumulative);

    let mut commits = 0;
    for measure in registry() {
        for ev in evaluate_measure(&mut ctx, measure.as_ref(), None).unwrap() {
            if ctx.results.results()[ev.result].committed {
                commits += 1;
            }
            let actual = oracle
                .compute_energy(&ctx.state, EvaluationPass::Cumulative)
                .unwrap();
            assert_tracks(
                ctx.pre_energy(),
                &actual,
                &format!("{} on {}", measure.kind(), ev.component),
            );
        }
    }
    commits
}

#[test]
fn sample_baseline_follows_every_commit() {
    let commits = check_cumulative_baseline(common::sample_state());
    assert!(commits > 3);
}

#[test]
fn red_tagged_scenario_baseline_follows_every_commit() {
    let input = DwellingInput::from_toml_file(std::path::Path::new(&common::scenario(
        "red_tagged.toml",
    )))
    .expect("scenario should parse");
    check_cumulative_baseline(DwellingState::from(input));
}

#[test]
fn edited_dwellings_keep_their_baseline_in_step() {
    let mut rng = StdRng::seed_from_u64(31);
    for _ in 0..25 {
        let mut state = common::sample_state();
        for _ in 0..rng.random_range(1..5) {
            common::mutate(&mut rng, &mut state);
        }
        check_cumulative_baseline(state);
    }
}
