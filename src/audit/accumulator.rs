//! Ordered store of measure results, running totals, and advisories.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::warn;

use crate::dwelling::ComponentSet;
use crate::economics::{PackageGroup, package_group};
use crate::energy::{EnergyUse, EvaluationPass};
use crate::error::EngineError;
use crate::measures::MeasureKind;

use super::result::MeasureResult;

/// Non-fatal condition noted during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advisory {
    /// Deduplication key.
    pub key: String,
    pub message: String,
}

/// Aggregates over the run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    /// Annual energy of the unmodified dwelling.
    pub base: EnergyUse,
    /// Annual energy after every committed measure.
    pub current: EnergyUse,
    pub committed_cost: f64,
    pub committed_present_worth: f64,
    pub committed_annual_dollars: f64,
    pub committed_savings_mmbtu: f64,
    pub committed_count: usize,
}

/// Append-only result list plus running totals.
///
/// Storage order is evaluation order and is never changed; [`ranking`]
/// computes the report order as a separate view.
///
/// [`ranking`]: ResultsAccumulator::ranking
#[derive(Debug, Clone, Default)]
pub struct ResultsAccumulator {
    results: Vec<MeasureResult>,
    advisories: Vec<Advisory>,
    advised: BTreeSet<String>,
    totals: Totals,
}

impl ResultsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a result and returns its index.
    ///
    /// Committed cumulative results advance the running totals and get them
    /// stamped into their `cumulative_*` fields.
    pub fn push(&mut self, mut result: MeasureResult) -> usize {
        if result.committed && result.pass == EvaluationPass::Cumulative {
            let t = &mut self.totals;
            t.committed_cost += result.initial_cost();
            t.committed_present_worth += result.present_worth_savings;
            t.committed_annual_dollars += result.annual_dollar_savings;
            t.committed_savings_mmbtu += result.savings_mmbtu();
            t.committed_count += 1;
            result.cumulative_cost = t.committed_cost;
            result.cumulative_savings_mmbtu = t.committed_savings_mmbtu;
        }
        self.results.push(result);
        self.results.len() - 1
    }

    /// Records an advisory once per key. Returns `false` for a repeat.
    pub fn advise(&mut self, key: impl Into<String>, message: impl Into<String>) -> bool {
        let key = key.into();
        if !self.advised.insert(key.clone()) {
            return false;
        }
        let message = message.into();
        warn!(advisory = %key, "{message}");
        self.advisories.push(Advisory { key, message });
        true
    }

    pub fn set_base(&mut self, base: EnergyUse) {
        self.totals.base = base;
    }

    pub fn set_current(&mut self, current: EnergyUse) {
        self.totals.current = current;
    }

    /// Every result in evaluation order.
    pub fn results(&self) -> &[MeasureResult] {
        &self.results
    }

    pub fn get(&self, index: usize) -> Option<&MeasureResult> {
        self.results.get(index)
    }

    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results of one pass, in evaluation order.
    pub fn by_pass(&self, pass: EvaluationPass) -> impl Iterator<Item = &MeasureResult> {
        self.results.iter().filter(move |r| r.pass == pass)
    }

    /// Indices of the accepted package in report order.
    ///
    /// Committed cumulative results, first occurrence per (kind, components),
    /// stable-sorted by tier and then by descending SIR.
    pub fn ranking(&self) -> Vec<usize> {
        let mut seen: BTreeSet<(MeasureKind, &ComponentSet)> = BTreeSet::new();
        let mut idx: Vec<usize> = self
            .results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.committed && r.pass == EvaluationPass::Cumulative)
            .filter(|(_, r)| seen.insert((r.kind, &r.components)))
            .map(|(i, _)| i)
            .collect();
        idx.sort_by(|&a, &b| {
            let (ra, rb) = (&self.results[a], &self.results[b]);
            ra.tier.cmp(&rb.tier).then(rb.sir.total_cmp(&ra.sir))
        });
        idx
    }

    /// The accepted package in report order.
    pub fn ranked(&self) -> Vec<&MeasureResult> {
        self.ranking().into_iter().map(|i| &self.results[i]).collect()
    }

    /// Result indices of the ranked package split by reporting group, each
    /// group in report order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnmappedTier`] if a ranked result carries a
    /// tier with no group.
    pub fn grouped(&self) -> Result<BTreeMap<PackageGroup, Vec<usize>>, EngineError> {
        let mut groups: BTreeMap<PackageGroup, Vec<usize>> = BTreeMap::new();
        for i in self.ranking() {
            groups
                .entry(package_group(self.results[i].tier)?)
                .or_default()
                .push(i);
        }
        Ok(groups)
    }
}
