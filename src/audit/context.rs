//! Explicit run context handed to every measure evaluation.

use crate::config::EconomicsConfig;
use crate::dwelling::DwellingState;
use crate::economics::FuelEconomics;
use crate::energy::{EnergyOracle, EnergyUse, EvaluationPass};
use crate::measures::Catalog;

use super::accumulator::ResultsAccumulator;
use super::ledger::{ComponentLedger, InteractionLedger};

/// Everything a measure evaluation reads or writes during a run.
///
/// Owns the live dwelling, both ledgers, and the results; borrows the
/// read-only collaborators.
pub struct AuditContext<'a> {
    pub state: DwellingState,
    pub pass: EvaluationPass,
    pub oracle: &'a dyn EnergyOracle,
    pub economics: &'a dyn FuelEconomics,
    pub catalog: &'a Catalog,
    pub policy: &'a EconomicsConfig,
    pub components: ComponentLedger,
    pub interactions: InteractionLedger,
    pub results: ResultsAccumulator,
    base: EnergyUse,
    running_pre: EnergyUse,
}

impl<'a> AuditContext<'a> {
    pub fn new(
        state: DwellingState,
        oracle: &'a dyn EnergyOracle,
        economics: &'a dyn FuelEconomics,
        catalog: &'a Catalog,
        policy: &'a EconomicsConfig,
    ) -> Self {
        Self {
            state,
            pass: EvaluationPass::BaseCase,
            oracle,
            economics,
            catalog,
            policy,
            components: ComponentLedger::new(),
            interactions: InteractionLedger::new(),
            results: ResultsAccumulator::new(),
            base: EnergyUse::default(),
            running_pre: EnergyUse::default(),
        }
    }

    /// Enters `pass`: clears both ledgers and rewinds the running baseline.
    pub fn begin_pass(&mut self, pass: EvaluationPass) {
        self.pass = pass;
        self.components.reset();
        self.interactions.reset();
        self.running_pre = self.base.clone();
    }

    pub fn set_base(&mut self, base: EnergyUse) {
        self.running_pre = base.clone();
        self.base = base;
    }

    pub fn base(&self) -> &EnergyUse {
        &self.base
    }

    /// Pre-retrofit energy for the next measure.
    pub fn pre_energy(&self) -> &EnergyUse {
        match self.pass {
            EvaluationPass::Cumulative => &self.running_pre,
            EvaluationPass::BaseCase | EvaluationPass::FirstPass => &self.base,
        }
    }

    /// Moves the running baseline to the post-energy of a committed measure.
    pub fn advance(&mut self, post: EnergyUse) {
        self.running_pre = post;
    }
}
