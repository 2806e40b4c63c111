//! Engine error type and the `invariant!` guard macro.

use thiserror::Error;

use crate::config::ConfigError;

/// Fatal errors that abort an audit run.
///
/// Every variant describes malformed or self-contradictory input. None of
/// them is measure-scoped: a measure that hits one fails the whole run.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A formula precondition did not hold (zero divisor, negative area, ...).
    #[error("invariant violated at {location}: `{condition}` ({message})")]
    InvariantViolation {
        /// Stringified boolean condition that failed.
        condition: &'static str,
        /// Human-readable description of the offending input.
        message: String,
        /// `file:line` of the check.
        location: &'static str,
    },

    /// An enumerated category could not be recognized.
    #[error("unknown {field}: \"{value}\"")]
    UnknownCategory { field: &'static str, value: String },

    /// A record the engine requires is absent.
    #[error("missing record: {what}")]
    MissingRecord { what: String },

    /// A priority tier has no reporting group.
    #[error("priority tier {tier} has no package group")]
    UnmappedTier { tier: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Returns early with [`EngineError::InvariantViolation`] when `cond` is false.
///
/// ```
/// use retrofit_eval::error::EngineError;
/// use retrofit_eval::invariant;
///
/// fn ratio(a: f64, b: f64) -> Result<f64, EngineError> {
///     invariant!(b != 0.0, "denominator for ratio {a}/{b}");
///     Ok(a / b)
/// }
///
/// assert!(ratio(1.0, 0.0).is_err());
/// ```
#[macro_export]
macro_rules! invariant {
    ($cond:expr, $($msg:tt)+) => {
        if !($cond) {
            return Err($crate::error::EngineError::InvariantViolation {
                condition: stringify!($cond),
                message: format!($($msg)+),
                location: concat!(file!(), ":", line!()),
            });
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checked_div(a: f64, b: f64) -> Result<f64, EngineError> {
        invariant!(b > 0.0, "divisor must be positive, got {b}");
        Ok(a / b)
    }

    #[test]
    fn invariant_passes_through_when_condition_holds() {
        assert_eq!(checked_div(6.0, 3.0).ok(), Some(2.0));
    }

    #[test]
    fn invariant_carries_condition_message_and_location() {
        let err = checked_div(1.0, 0.0).unwrap_err();
        match err {
            EngineError::InvariantViolation {
                condition,
                message,
                location,
            } => {
                assert_eq!(condition, "b > 0.0");
                assert!(message.contains("got 0"));
                assert!(location.contains("error.rs"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn display_mentions_location() {
        let err = checked_div(1.0, -1.0).unwrap_err();
        assert!(err.to_string().contains("invariant violated at"));
    }
}
