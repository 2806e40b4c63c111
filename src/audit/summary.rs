//! Package-level summary of a completed audit.

use std::fmt;

use serde::Serialize;

use crate::economics::savings_to_investment_ratio;
use crate::energy::EvaluationPass;

use super::orchestrator::AuditOutcome;

/// Aggregate figures over the accepted package.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditSummary {
    /// Annual energy of the unmodified dwelling (MMBtu).
    pub base_mmbtu: f64,
    /// Annual energy after the package (MMBtu).
    pub final_mmbtu: f64,
    pub savings_mmbtu: f64,
    /// First-year fuel bill reduction of the package ($).
    pub annual_dollar_savings: f64,
    /// Initial cost of the package ($).
    pub total_cost: f64,
    /// Present worth of the package savings ($).
    pub total_present_worth: f64,
    /// Package present worth over package cost.
    pub package_sir: f64,
    pub first_pass_results: usize,
    pub cumulative_results: usize,
    pub committed: usize,
    pub advisories: usize,
}

impl AuditSummary {
    pub fn from_outcome(outcome: &AuditOutcome) -> Self {
        let totals = outcome.totals();
        let base_mmbtu = totals.base.total_mmbtu();
        let final_mmbtu = totals.current.total_mmbtu();
        let ranked = outcome.ranked();
        let total_cost: f64 = ranked.iter().map(|r| r.initial_cost()).sum();
        let total_present_worth: f64 = ranked.iter().map(|r| r.present_worth_savings).sum();
        let count = |pass| outcome.results.by_pass(pass).count();

        Self {
            base_mmbtu,
            final_mmbtu,
            savings_mmbtu: base_mmbtu - final_mmbtu,
            annual_dollar_savings: ranked.iter().map(|r| r.annual_dollar_savings).sum(),
            total_cost,
            total_present_worth,
            package_sir: savings_to_investment_ratio(total_present_worth, total_cost),
            first_pass_results: count(EvaluationPass::FirstPass),
            cumulative_results: count(EvaluationPass::Cumulative),
            committed: ranked.len(),
            advisories: outcome.advisories().len(),
        }
    }
}

impl fmt::Display for AuditSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Audit Summary ---")?;
        writeln!(f, "Base energy:           {:.2} MMBtu", self.base_mmbtu)?;
        writeln!(f, "Final energy:          {:.2} MMBtu", self.final_mmbtu)?;
        writeln!(
            f,
            "Savings:               {:.2} MMBtu (${:.2}/yr)",
            self.savings_mmbtu, self.annual_dollar_savings
        )?;
        writeln!(f, "Package cost:          ${:.2}", self.total_cost)?;
        writeln!(f, "Present worth:         ${:.2}", self.total_present_worth)?;
        writeln!(f, "Package SIR:           {:.2}", self.package_sir)?;
        writeln!(
            f,
            "Results:               {} first pass, {} cumulative, {} accepted",
            self.first_pass_results, self.cumulative_results, self.committed
        )?;
        write!(f, "Advisories:            {}", self.advisories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::PassOrchestrator;
    use crate::config::AuditConfig;
    use crate::dwelling::{DwellingInput, DwellingState};

    fn summary() -> AuditSummary {
        PassOrchestrator::from_config(AuditConfig::default())
            .unwrap()
            .run(DwellingState::from(DwellingInput::sample()))
            .unwrap()
            .summary()
    }

    #[test]
    fn package_sir_is_present_worth_over_cost() {
        let s = summary();
        assert!(s.total_cost > 0.0);
        assert!((s.package_sir - s.total_present_worth / s.total_cost).abs() < 1e-9);
    }

    #[test]
    fn savings_match_base_minus_final() {
        let s = summary();
        assert!(s.savings_mmbtu > 0.0);
        assert!((s.base_mmbtu - s.final_mmbtu - s.savings_mmbtu).abs() < 1e-9);
        assert!(s.committed <= s.cumulative_results);
        assert!(s.cumulative_results <= s.first_pass_results);
    }

    #[test]
    fn display_lists_every_line() {
        let text = summary().to_string();
        assert!(text.starts_with("--- Audit Summary ---"));
        for label in ["Base energy:", "Package SIR:", "Advisories:"] {
            assert!(text.contains(label), "missing {label}");
        }
    }
}
