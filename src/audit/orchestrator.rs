//! Sequences the base case, first pass, and cumulative pass.

use tracing::info;

use crate::config::AuditConfig;
use crate::dwelling::{DwellingState, snapshot};
use crate::economics::{EscalationTable, FuelEconomics};
use crate::energy::{DegreeDayOracle, EnergyOracle, EvaluationPass};
use crate::error::EngineError;
use crate::invariant;
use crate::measures::{Catalog, Measure, MeasureKind, registry};

use super::accumulator::{Advisory, ResultsAccumulator, Totals};
use super::context::AuditContext;
use super::evaluator::{Admissions, evaluate_itemized, evaluate_measure};
use super::ledger::InteractionLedger;
use super::result::MeasureResult;
use super::summary::AuditSummary;

/// Runs a full audit over one dwelling.
///
/// Generic over the energy and economics collaborators so tests can swap in
/// stubs; [`PassOrchestrator::from_config`] wires the reference ones.
pub struct PassOrchestrator<O, F> {
    oracle: O,
    economics: F,
    catalog: Catalog,
    config: AuditConfig,
    measures: Vec<Box<dyn Measure>>,
}

impl PassOrchestrator<DegreeDayOracle, EscalationTable> {
    /// Orchestrator with the degree-day oracle and the configured prices.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, or
    /// [`EngineError::UnknownCategory`] for a catalog override naming an
    /// unknown measure.
    pub fn from_config(config: AuditConfig) -> Result<Self, EngineError> {
        if let Some(err) = config.validate().into_iter().next() {
            return Err(err.into());
        }
        let economics = EscalationTable::from_config(&config);
        let catalog = Catalog::standard().with_overrides(&config.catalog)?;
        Ok(Self::new(DegreeDayOracle::new(), economics, catalog, config))
    }
}

impl<O: EnergyOracle, F: FuelEconomics> PassOrchestrator<O, F> {
    pub fn new(oracle: O, economics: F, catalog: Catalog, config: AuditConfig) -> Self {
        Self {
            oracle,
            economics,
            catalog,
            config,
            measures: registry(),
        }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Runs BASE_CASE, FIRST_PASS, and CUMULATIVE over `state`.
    ///
    /// # Errors
    ///
    /// Any [`EngineError`] aborts the run; there is no partial outcome.
    pub fn run(&self, state: DwellingState) -> Result<AuditOutcome, EngineError> {
        let mut ctx = AuditContext::new(
            state,
            &self.oracle,
            &self.economics,
            &self.catalog,
            &self.config.economics,
        );

        self.base_case(&mut ctx)?;
        let admissions = self.first_pass(&mut ctx)?;
        self.cumulative_pass(&mut ctx, &admissions)?;

        // every ranked result must have a reporting group
        ctx.results.grouped()?;
        let ranking = ctx.results.ranking();
        Ok(AuditOutcome {
            results: ctx.results,
            ranking,
            interactions: ctx.interactions,
            final_state: ctx.state,
        })
    }

    fn base_case(&self, ctx: &mut AuditContext<'_>) -> Result<(), EngineError> {
        ctx.state.check_categories()?;
        ctx.state.refresh_derived(self.config.economics.min_natural_cfm)?;
        let seasons = self.oracle.season_table(&ctx.state)?;
        ctx.state.freeze_seasons(seasons);

        ctx.begin_pass(EvaluationPass::BaseCase);
        if ctx.state.derived.infiltration_floored {
            ctx.results.advise(
                "infiltration-floored",
                format!(
                    "natural infiltration floored at {:.1} cfm",
                    self.config.economics.min_natural_cfm
                ),
            );
        }
        let base = self
            .oracle
            .compute_energy(&ctx.state, EvaluationPass::BaseCase)?;
        info!(
            pass = %EvaluationPass::BaseCase,
            heating_mmbtu = base.heating_mmbtu(),
            cooling_mmbtu = base.cooling_mmbtu(),
            baseload_mmbtu = base.baseload_mmbtu(),
            "base case evaluated"
        );
        ctx.results.set_base(base.clone());
        ctx.results.set_current(base.clone());
        ctx.set_base(base);
        Ok(())
    }

    fn first_pass(&self, ctx: &mut AuditContext<'_>) -> Result<Admissions, EngineError> {
        ctx.begin_pass(EvaluationPass::FirstPass);
        let before = snapshot(&ctx.state);
        let mut admissions = Admissions::new();

        for measure in &self.measures {
            for ev in evaluate_measure(ctx, measure.as_ref(), None)? {
                if ev.admitted {
                    admissions.insert((measure.kind(), ev.component));
                }
            }
        }
        for ev in evaluate_itemized(ctx, None)? {
            if ev.admitted {
                admissions.insert((MeasureKind::Itemized, ev.component));
            }
        }

        invariant!(
            ctx.state == *before.state(),
            "first pass left changes in the dwelling state"
        );
        info!(
            pass = %EvaluationPass::FirstPass,
            evaluated = ctx.results.len(),
            admitted = admissions.len(),
            "first pass complete"
        );
        Ok(admissions)
    }

    fn cumulative_pass(
        &self,
        ctx: &mut AuditContext<'_>,
        admissions: &Admissions,
    ) -> Result<(), EngineError> {
        ctx.begin_pass(EvaluationPass::Cumulative);
        for measure in &self.measures {
            let kind = measure.kind();
            if !admissions.iter().any(|(k, _)| *k == kind) {
                continue;
            }
            evaluate_measure(ctx, measure.as_ref(), Some(admissions))?;
        }
        evaluate_itemized(ctx, Some(admissions))?;

        let current = ctx.pre_energy().clone();
        let totals = ctx.results.totals();
        info!(
            pass = %EvaluationPass::Cumulative,
            committed = totals.committed_count,
            cost = totals.committed_cost,
            savings_mmbtu = totals.committed_savings_mmbtu,
            "cumulative pass complete"
        );
        ctx.results.set_current(current);
        Ok(())
    }
}

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct AuditOutcome {
    pub results: ResultsAccumulator,
    /// Result indices of the accepted package in report order.
    pub ranking: Vec<usize>,
    /// Leakage credit recorded during the cumulative pass.
    pub interactions: InteractionLedger,
    /// Dwelling with every committed measure applied.
    pub final_state: DwellingState,
}

impl AuditOutcome {
    /// Every result in evaluation order.
    pub fn results(&self) -> &[MeasureResult] {
        self.results.results()
    }

    /// The accepted package in report order.
    pub fn ranked(&self) -> Vec<&MeasureResult> {
        self.ranking
            .iter()
            .filter_map(|&i| self.results.get(i))
            .collect()
    }

    pub fn advisories(&self) -> &[Advisory] {
        self.results.advisories()
    }

    pub fn totals(&self) -> &Totals {
        self.results.totals()
    }

    pub fn summary(&self) -> AuditSummary {
        AuditSummary::from_outcome(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dwelling::DwellingInput;
    use crate::energy::EnergyUse;

    fn outcome() -> AuditOutcome {
        let orchestrator = PassOrchestrator::from_config(AuditConfig::default()).unwrap();
        orchestrator
            .run(DwellingState::from(DwellingInput::sample()))
            .unwrap()
    }

    #[test]
    fn passes_appear_in_order() {
        let out = outcome();
        let passes: Vec<EvaluationPass> = out.results().iter().map(|r| r.pass).collect();
        let first_cumulative = passes
            .iter()
            .position(|p| *p == EvaluationPass::Cumulative)
            .unwrap();
        assert!(passes[..first_cumulative]
            .iter()
            .all(|p| *p == EvaluationPass::FirstPass));
        assert!(passes[first_cumulative..]
            .iter()
            .all(|p| *p == EvaluationPass::Cumulative));
    }

    #[test]
    fn only_cumulative_results_are_committed() {
        let out = outcome();
        assert!(out
            .results()
            .iter()
            .filter(|r| r.committed)
            .all(|r| r.pass == EvaluationPass::Cumulative));
        assert!(out.totals().committed_count > 0);
    }

    #[test]
    fn final_energy_is_below_base() {
        let out = outcome();
        let t = out.totals();
        assert!(t.current.total_mmbtu() < t.base.total_mmbtu());
        assert_ne!(t.current, EnergyUse::default());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = AuditConfig::default();
        cfg.economics.max_lifetime_years = 0;
        assert!(matches!(
            PassOrchestrator::from_config(cfg),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn zero_floor_area_fails_the_run() {
        let mut state = DwellingState::from(DwellingInput::sample());
        std::sync::Arc::make_mut(&mut state.site).floor_area_ft2 = 0.0;
        let orchestrator = PassOrchestrator::from_config(AuditConfig::default()).unwrap();
        assert!(matches!(
            orchestrator.run(state),
            Err(EngineError::InvariantViolation { .. })
        ));
    }
}
