//! Per-pass bookkeeping of committed measures and leakage credit.

use std::collections::{BTreeMap, BTreeSet};

use crate::dwelling::ComponentCode;
use crate::energy::{EndUse, EnergyUse};
use crate::measures::MeasureKind;

/// Which measures were committed on which components in the current pass.
///
/// A component may receive at most one leakage-affecting measure per pass;
/// the first one committed claims it.
#[derive(Debug, Clone, Default)]
pub struct ComponentLedger {
    committed: BTreeSet<(MeasureKind, ComponentCode)>,
    leakage_claims: BTreeMap<ComponentCode, MeasureKind>,
}

impl ComponentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.committed.clear();
        self.leakage_claims.clear();
    }

    /// Records a commit. Leakage-affecting kinds also claim the component
    /// unless another measure already holds it.
    pub fn record(&mut self, kind: MeasureKind, component: &ComponentCode) {
        self.committed.insert((kind, component.clone()));
        if kind.affects_component_leakage() {
            // first claim wins; a second one is rejected by `claim`
            let _ = self.claim(kind, component);
        }
    }

    /// Claims `component` for a leakage-affecting measure.
    ///
    /// # Errors
    ///
    /// Returns the kind that already holds the claim.
    pub fn claim(&mut self, kind: MeasureKind, component: &ComponentCode) -> Result<(), MeasureKind> {
        match self.leakage_claims.get(component) {
            Some(&holder) if holder != kind => Err(holder),
            Some(_) => Ok(()),
            None => {
                self.leakage_claims.insert(component.clone(), kind);
                Ok(())
            }
        }
    }

    pub fn is_committed(&self, kind: MeasureKind, component: &ComponentCode) -> bool {
        self.committed.contains(&(kind, component.clone()))
    }

    /// Leakage measure that holds `component`, if any.
    pub fn leakage_claimant(&self, component: &ComponentCode) -> Option<MeasureKind> {
        self.leakage_claims.get(component).copied()
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }
}

/// Energy credited to component leakage measures in the current pass.
///
/// Whole-house air sealing subtracts this from its gross audited-to-target
/// savings so the same cfm50 is not paid for twice.
#[derive(Debug, Clone, Default)]
pub struct InteractionLedger {
    credited: EnergyUse,
    entries: Vec<(MeasureKind, ComponentCode)>,
}

impl InteractionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.credited = EnergyUse::default();
        self.entries.clear();
    }

    /// Adds the leakage-only savings of a committed measure.
    pub fn add(&mut self, kind: MeasureKind, component: &ComponentCode, credit: &EnergyUse) {
        for end_use in EndUse::ALL {
            for (fuel, mmbtu) in credit.end_use(end_use).iter() {
                self.credited.end_use_mut(end_use).add(fuel, mmbtu);
            }
        }
        self.entries.push((kind, component.clone()));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn credited(&self) -> &EnergyUse {
        &self.credited
    }

    /// Measures that contributed credit, in commit order.
    pub fn entries(&self) -> &[(MeasureKind, ComponentCode)] {
        &self.entries
    }

    /// Deduction to apply to `savings`: the credited energy clipped per end
    /// use and fuel to `[0, savings]`.
    pub fn deduction_for(&self, savings: &EnergyUse) -> EnergyUse {
        let mut out = EnergyUse::default();
        for end_use in EndUse::ALL {
            for (fuel, credit) in self.credited.end_use(end_use).iter() {
                let available = savings.end_use(end_use).get(fuel).max(0.0);
                let d = credit.clamp(0.0, available);
                if d > 0.0 {
                    out.end_use_mut(end_use).add(fuel, d);
                }
            }
        }
        out
    }
}

/// Drops negative entries, keeping only savings.
pub(crate) fn positive_part(energy: &EnergyUse) -> EnergyUse {
    let mut out = EnergyUse::default();
    for end_use in EndUse::ALL {
        for (fuel, mmbtu) in energy.end_use(end_use).iter() {
            if mmbtu > 0.0 {
                out.end_use_mut(end_use).add(fuel, mmbtu);
            }
        }
    }
    out
}
