//! Economics engine: prices, present worth, SIR, and priority classification.

pub mod fuel;
pub mod priority;
pub mod sir;

pub use fuel::{EscalationTable, FuelEconomics};
pub use priority::{
    MeasureClass, PackageGroup, PriorityTier, classify_priority, is_admitted, package_group,
};
pub use sir::{
    LifecycleSavings, SIR_SENTINEL, lifecycle_savings, present_worth, savings_to_investment_ratio,
};
