//! Retrofit measure evaluation for a single dwelling.
//!
//! Screens energy-conservation measures against the unmodified dwelling,
//! re-evaluates the survivors in combination, and ranks the accepted
//! package by priority tier and savings-to-investment ratio.

#[cfg(feature = "api")]
pub mod api;
/// Base case, first pass, and cumulative pass orchestration.
pub mod audit;
pub mod config;
pub mod dwelling;
pub mod economics;
pub mod energy;
pub mod error;
/// Result export.
pub mod io {
    pub mod export;
}
pub mod logging;
pub mod measures;
