//! API response and query types.
//!
//! Field names follow the CSV export columns.

use serde::{Deserialize, Serialize};

use crate::audit::MeasureResult;
use crate::economics::{PackageGroup, PriorityTier};
use crate::energy::EvaluationPass;
use crate::measures::MeasureKind;

/// Query for `GET /measures`.
#[derive(Debug, Deserialize)]
pub struct MeasuresQuery {
    /// `first` or `cumulative`.
    pub pass: Option<String>,
    /// Only committed results when `true`.
    pub accepted: Option<bool>,
}

/// One measure result in export-column terms.
#[derive(Debug, Serialize)]
pub struct MeasureRecord {
    /// Position in evaluation order.
    pub index: usize,
    pub pass: EvaluationPass,
    pub measure: MeasureKind,
    pub components: Vec<String>,
    pub option: String,
    pub required: bool,
    pub tier: PriorityTier,
    pub pre_mmbtu: f64,
    pub post_mmbtu: f64,
    pub deduction_mmbtu: f64,
    pub savings_mmbtu: f64,
    pub cost: f64,
    pub lifetime_years: u32,
    pub annual_dollars: f64,
    pub present_worth: f64,
    pub sir: f64,
    pub committed: bool,
}

impl MeasureRecord {
    pub fn new(index: usize, r: &MeasureResult) -> Self {
        Self {
            index,
            pass: r.pass,
            measure: r.kind,
            components: r.components.iter().map(|c| c.to_string()).collect(),
            option: r.option.clone(),
            required: r.required,
            tier: r.tier,
            pre_mmbtu: r.pre.total_mmbtu(),
            post_mmbtu: r.post.total_mmbtu(),
            deduction_mmbtu: r.interaction_deduction.total_mmbtu(),
            savings_mmbtu: r.savings_mmbtu(),
            cost: r.initial_cost(),
            lifetime_years: r.lifetime_years,
            annual_dollars: r.annual_dollar_savings,
            present_worth: r.present_worth_savings,
            sir: r.sir,
            committed: r.committed,
        }
    }
}

/// One reporting group of the ranked package.
#[derive(Debug, Serialize)]
pub struct GroupRecord {
    pub group: PackageGroup,
    pub measures: Vec<MeasureRecord>,
}

/// Error body for rejected requests.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
