//! Configuration-validation errors.
//!
//! Runtime stepping is infallible by design: a missed ground contact is a
//! normal outcome, not an error. The only failable surface is wheel
//! configuration, which is rejected at construction so the integrators never
//! divide by a non-positive inertia, radius, or relaxation length mid-step.

use rapier3d::prelude::Real;
use thiserror::Error;

/// Errors produced when validating a [`WheelConfig`](crate::wheel::WheelConfig).
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// A coefficient that the integrators divide by (or scale forces with)
    /// is zero or negative.
    #[error("{field} must be strictly positive, got {value}")]
    NonPositive {
        /// Name of the offending configuration field.
        field: &'static str,
        /// The rejected value.
        value: Real,
    },

    /// A coefficient is NaN or infinite.
    #[error("{field} must be finite, got {value}")]
    NonFinite {
        /// Name of the offending configuration field.
        field: &'static str,
        /// The rejected value.
        value: Real,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_field_and_value() {
        let err = ConfigError::NonPositive {
            field: "wheel_inertia",
            value: -1.5,
        };
        let msg = format!("{err}");
        assert!(msg.contains("wheel_inertia"));
        assert!(msg.contains("-1.5"));
    }
}
