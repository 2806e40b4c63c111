//! Measure evaluators: one unit per retrofit type.
//!
//! A [`Measure`] knows which components it can apply to, when it is
//! applicable, and how it changes the dwelling. Trial isolation, energy
//! evaluation, pricing, and commit decisions live in [`crate::audit`], so each
//! measure here is only the guard and the mutation.

pub mod baseload;
pub mod catalog;
pub mod envelope;
pub mod leakage;
pub mod mechanical;

use crate::audit::ComponentLedger;
use crate::dwelling::{ComponentCode, DwellingState};
use crate::economics::MeasureClass;
use crate::energy::EvaluationPass;
use crate::error::EngineError;

pub use catalog::{Catalog, CatalogEntry, CostUnit, MeasureKind};

/// One physical component a measure may be applied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub component: ComponentCode,
    /// Position of the component in its collection (0 for singletons).
    pub index: usize,
}

impl Target {
    pub fn new(component: impl Into<ComponentCode>, index: usize) -> Self {
        Self {
            component: component.into(),
            index,
        }
    }

    /// Target for a dwelling-wide or single-system measure.
    pub fn single(code: &str) -> Self {
        Self::new(ComponentCode::new(code), 0)
    }
}

/// Applicability decision for one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Apply,
    Skip(&'static str),
}

/// Read-only view a guard decides from.
pub struct GuardView<'a> {
    pub state: &'a DwellingState,
    pub ledger: &'a ComponentLedger,
    pub pass: EvaluationPass,
}

impl GuardView<'_> {
    /// Whether `kind` was committed on `component` earlier in this pass.
    pub fn committed(&self, kind: MeasureKind, component: &ComponentCode) -> bool {
        self.ledger.is_committed(kind, component)
    }
}

/// One retrofit level a measure can install.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrofitOption {
    /// Report label (e.g. `R-38`), empty for single-level measures.
    pub label: String,
    /// Multiplier on the catalog material cost.
    pub cost_factor: f64,
    /// Measure-specific level (added R-value for insulation).
    pub level: f64,
}

impl RetrofitOption {
    pub fn standard() -> Self {
        Self {
            label: String::new(),
            cost_factor: 1.0,
            level: 0.0,
        }
    }
}

/// Guard and mutation of one retrofit type.
pub trait Measure {
    fn kind(&self) -> MeasureKind;

    /// Components the measure could apply to, in a stable order.
    fn targets(&self, state: &DwellingState) -> Vec<Target>;

    /// Decides applicability. Must not have side effects.
    fn guard(&self, target: &Target, view: &GuardView<'_>) -> Guard;

    /// Candidate levels; the audit keeps the one with the best SIR.
    fn options(&self, _target: &Target, _state: &DwellingState) -> Vec<RetrofitOption> {
        vec![RetrofitOption::standard()]
    }

    /// Applies the retrofit and returns the installed quantity in catalog units.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MissingRecord`] if the target no longer exists.
    fn apply(
        &self,
        target: &Target,
        option: &RetrofitOption,
        state: &mut DwellingState,
    ) -> Result<f64, EngineError>;

    /// Applies only the air-leakage part of the retrofit.
    ///
    /// Used for the interaction side computation of leakage-affecting
    /// measures; other measures leave the state untouched.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MissingRecord`] if the target no longer exists.
    fn apply_leakage_only(
        &self,
        _target: &Target,
        _state: &mut DwellingState,
    ) -> Result<(), EngineError> {
        Ok(())
    }

    /// Priority class of the measure on the pre-retrofit dwelling.
    fn class(&self, _state: &DwellingState) -> MeasureClass {
        MeasureClass::Standard(self.kind())
    }
}

/// Every oracle-evaluated measure in evaluation order.
///
/// Itemized costs are not in the registry; the audit evaluates them directly.
pub fn registry() -> Vec<Box<dyn Measure>> {
    vec![
        Box::new(envelope::AtticLooseFill),
        Box::new(envelope::AtticBatts),
        Box::new(envelope::WallInsulation),
        Box::new(envelope::FoundationInsulation),
        Box::new(leakage::WindowReplacement),
        Box::new(leakage::StormWindow),
        Box::new(leakage::DoorReplacement),
        Box::new(leakage::DoorWeatherstrip),
        Box::new(leakage::InfiltrationReduction),
        Box::new(mechanical::DuctSealing),
        Box::new(mechanical::HeatingReplacement),
        Box::new(mechanical::HeatingTuneUp),
        Box::new(mechanical::ProgrammableThermostat),
        Box::new(mechanical::CoolingReplacement),
        Box::new(baseload::WaterHeaterReplacement),
        Box::new(baseload::WaterHeaterWrap),
        Box::new(baseload::LowFlowShowerhead),
        Box::new(baseload::LightingRetrofit),
        Box::new(baseload::RefrigeratorReplacement),
    ]
}

pub(crate) fn missing(kind: MeasureKind, target: &Target) -> EngineError {
    EngineError::MissingRecord {
        what: format!("{kind} target {}", target.component),
    }
}
