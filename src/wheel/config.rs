// ==============================================================================
// config.rs — PER-WHEEL PARAMETER BUNDLE
// ------------------------------------------------------------------------------
// Immutable-per-step configuration for one wheel: suspension geometry,
// spring/damper coefficients, rotational properties, tire response constants,
// and role flags. Copied by value at attach time so no two wheels ever share
// a configuration.
//
// validate() is the only failable surface of the crate: every coefficient the
// step pipeline divides by must be strictly positive and finite, checked here
// once instead of guarded in the hot path.
// ==============================================================================

use rapier3d::prelude::Real;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Parameters of a single wheel.
///
/// `Copy` is deliberate: attaching a wheel clones the configuration, so
/// mutating one wheel's parameters never affects another wheel built from
/// the same template.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelConfig {
    // --- Suspension ---
    pub spring_rest_length: Real, // m, ride height at equilibrium
    pub spring_travel: Real,      // m, extra compression/extension range
    pub spring_stiffness: Real,   // N/m
    pub damper_stiffness: Real,   // N*s/m

    // --- Wheel ---
    pub wheel_radius: Real,  // m
    pub wheel_inertia: Real, // kg*m^2

    // --- Tire ---
    pub tire_relaxation_length: Real, // m, lateral response lag distance
    pub slip_angle_peak: Real,        // deg, lateral slip normalization

    // --- Role flags ---
    pub is_driving: bool,
    pub is_steering: bool,
    /// Affects only visual mirroring, never the force pipeline.
    pub is_left: bool,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            spring_rest_length: 0.4,
            spring_travel: 0.2,
            spring_stiffness: 30_000.0,
            damper_stiffness: 4_000.0,
            wheel_radius: 0.33,
            wheel_inertia: 1.5,
            tire_relaxation_length: 1.0,
            slip_angle_peak: 8.0,
            is_driving: false,
            is_steering: false,
            is_left: false,
        }
    }
}

impl WheelConfig {
    /// Total ray length for the ground probe: suspension at full extension
    /// plus the tire itself.
    #[inline]
    pub fn probe_distance(&self) -> Real {
        self.spring_rest_length + self.spring_travel + self.wheel_radius
    }

    /// Spring length when the wheel is airborne (full extension).
    #[inline]
    pub fn max_spring_length(&self) -> Real {
        self.spring_rest_length + self.spring_travel
    }

    /// Rejects configurations that would make the integrators undefined.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("spring_rest_length", self.spring_rest_length),
            ("spring_travel", self.spring_travel),
            ("spring_stiffness", self.spring_stiffness),
            ("damper_stiffness", self.damper_stiffness),
            ("wheel_radius", self.wheel_radius),
            ("wheel_inertia", self.wheel_inertia),
            ("tire_relaxation_length", self.tire_relaxation_length),
            ("slip_angle_peak", self.slip_angle_peak),
        ];

        for (field, value) in positive {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        Ok(())
    }
}
