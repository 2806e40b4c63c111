//! Measure result records.

use std::fmt;

use serde::Serialize;

use crate::dwelling::ComponentSet;
use crate::economics::PriorityTier;
use crate::energy::{EnergyUse, EvaluationPass};
use crate::measures::{CostUnit, MeasureKind};

/// Initial cost of one measure instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBreakdown {
    /// Installed quantity in `unit`.
    pub quantity: f64,
    pub unit: CostUnit,
    /// Material cost ($).
    pub material: f64,
    /// Labor cost ($).
    pub labor: f64,
    /// Attached itemized costs ($).
    pub adders: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.material + self.labor + self.adders
    }
}

/// One evaluated measure instance.
///
/// Appended once to the accumulator in evaluation order; only the running
/// totals are filled in at append time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasureResult {
    pub kind: MeasureKind,
    pub components: ComponentSet,
    pub pass: EvaluationPass,
    /// Mandated by the auditor.
    pub required: bool,
    pub tier: PriorityTier,
    /// Chosen retrofit level, empty for single-level measures.
    pub option: String,
    /// Annual energy before the measure (running baseline in the cumulative pass).
    pub pre: EnergyUse,
    /// Annual energy after the measure.
    pub post: EnergyUse,
    /// Part of the gross savings withheld because component leakage measures
    /// already claimed it. Informational: `post` reflects it already.
    pub interaction_deduction: EnergyUse,
    pub cost: CostBreakdown,
    pub lifetime_years: u32,
    /// First-year fuel bill reduction ($).
    pub annual_dollar_savings: f64,
    /// Present worth of lifetime savings ($).
    pub present_worth_savings: f64,
    pub sir: f64,
    /// Kept as part of the cumulative package.
    pub committed: bool,
    /// Package cost through this result ($, committed results only).
    pub cumulative_cost: f64,
    /// Package credited savings through this result (MMBtu, committed results only).
    pub cumulative_savings_mmbtu: f64,
}

impl MeasureResult {
    /// Credited annual savings, `pre - post`.
    pub fn savings(&self) -> EnergyUse {
        self.pre.minus(&self.post)
    }

    pub fn savings_mmbtu(&self) -> f64 {
        self.savings().total_mmbtu()
    }

    pub fn initial_cost(&self) -> f64 {
        self.cost.total()
    }
}

impl fmt::Display for MeasureResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.option.is_empty() {
            self.components.to_string()
        } else {
            format!("{} {}", self.components, self.option)
        };
        write!(
            f,
            "[{:<10}] {:<26} {:<12} tier={:<22} cost=${:>9.2} save={:>7.2} MMBtu sir={:>7.2}",
            self.pass.to_string(),
            self.kind.key(),
            label,
            self.tier.key(),
            self.initial_cost(),
            self.savings_mmbtu(),
            self.sir
        )?;
        if self.committed {
            write!(f, " *")?;
        }
        Ok(())
    }
}
