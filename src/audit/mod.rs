//! Multi-pass measure evaluation and ranking.
//!
//! [`PassOrchestrator::run`] evaluates the unmodified dwelling once, screens
//! every measure alone against it, then re-evaluates the admitted measures
//! on top of each other, committing those that stay worthwhile. Results land
//! in a [`ResultsAccumulator`] in evaluation order; ranking is a view.

pub mod accumulator;
pub mod context;
pub mod evaluator;
pub mod ledger;
pub mod orchestrator;
pub mod result;
pub mod summary;

pub use accumulator::{Advisory, ResultsAccumulator, Totals};
pub use context::AuditContext;
pub use evaluator::{Admissions, Evaluated, evaluate_itemized, evaluate_measure};
pub use ledger::{ComponentLedger, InteractionLedger};
pub use orchestrator::{AuditOutcome, PassOrchestrator};
pub use result::{CostBreakdown, MeasureResult};
pub use summary::AuditSummary;
