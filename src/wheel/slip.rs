// ==============================================================================
// slip.rs — SLIP RATIO + LAGGED SLIP ANGLE
// ------------------------------------------------------------------------------
// Two independent computations, both gated on a valid contact:
//
// Longitudinal (slip.z): the friction torque demanded to cancel the slip
// velocity within one step, normalized by the maximum torque the normal load
// can sustain (a simplified Coulomb slip-ratio proxy):
//
//     w_target = v_long / r
//     tau_dem  = (w - w_target) / dt * I
//     tau_max  = F_n * r
//     slip.z   = clamp(tau_dem / tau_max, -1, 1), exactly 0 when F_n == 0
//
// Lateral (slip.x): kinematic slip angle, pinned toward the peak angle at low
// speed (raw angle is unreliable below ~3 m/s), then run through a
// relaxation-length low-pass to emulate tire-carcass compliance. The filter
// gain is |v_lat| / relaxation_length, NOT scaled by dt; reproduced as-is for
// behavioral parity and kept in relaxation_gain() so a dt-scaled formula can
// be swapped in without touching the pipeline.
// ==============================================================================

use rapier3d::prelude::{Real, Vector};

use crate::wheel::config::WheelConfig;

/// Speed band (m/s) over which the raw slip angle fades in; below it the
/// angle is pinned toward the peak value.
const SLIP_FADE_LOW: Real = 3.0;
const SLIP_FADE_HIGH: Real = 6.0;

#[inline]
fn lerp(a: Real, b: Real, t: Real) -> Real {
    a + (b - a) * t
}

/// Saturating linear map of `x` from [lo, hi] onto [0, 1].
#[inline]
fn remap01(x: Real, lo: Real, hi: Real) -> Real {
    ((x - lo) / (hi - lo)).clamp(0.0, 1.0)
}

/// Sign convention matching the reference model: zero maps to +1.
#[inline]
fn sign(v: Real) -> Real {
    if v >= 0.0 { 1.0 } else { -1.0 }
}

/// Gain of the lateral-slip low-pass filter.
///
/// Explicit-Euler approximation of a relaxation-length lag; the gain is not
/// scaled by dt, which ties the filter rate to the tick rate. Isolated here
/// so a corrected formula can replace it in one place.
#[inline]
pub fn relaxation_gain(lateral_speed: Real, relaxation_length: Real) -> Real {
    (lateral_speed.abs() / relaxation_length).clamp(0.0, 1.0)
}

/// Longitudinal slip ratio in [-1, 1]; exactly 0 under zero normal load.
pub fn longitudinal(
    cfg: &WheelConfig,
    v_long: Real,
    angular_velocity: Real,
    normal_force: Real,
    dt: Real,
) -> Real {
    if normal_force == 0.0 {
        return 0.0;
    }

    let target_angular_velocity = v_long / cfg.wheel_radius;
    let target_angular_acceleration = (angular_velocity - target_angular_velocity) / dt;
    let target_friction_torque = target_angular_acceleration * cfg.wheel_inertia;
    let max_friction_torque = normal_force * cfg.wheel_radius;

    (target_friction_torque / max_friction_torque).clamp(-1.0, 1.0)
}

/// Lateral slip output: normalized slip plus the updated filter state.
#[derive(Debug, Clone, Copy)]
pub struct LateralSlip {
    /// Normalized lateral slip in [-1, 1].
    pub slip: Real,
    /// Updated lagged slip angle, degrees, in [-90, 90].
    pub slip_angle_dynamic: Real,
}

/// Lateral slip from the wheel-local contact-point velocity.
/// `slip_angle_dynamic` is the filter state carried from the previous step.
pub fn lateral(
    cfg: &WheelConfig,
    velocity_local: &Vector<Real>,
    slip_angle_dynamic: Real,
) -> LateralSlip {
    // Kinematic slip angle, degrees. Exactly zero without longitudinal speed.
    let slip_angle = if velocity_local.z != 0.0 {
        (-velocity_local.x / velocity_local.z.abs()).atan().to_degrees()
    } else {
        0.0
    };

    // Below the fade band the raw angle is pinned toward the peak value.
    let fade = remap01(velocity_local.magnitude(), SLIP_FADE_LOW, SLIP_FADE_HIGH);
    let pinned = cfg.slip_angle_peak * sign(-velocity_local.x);
    let slip_angle_lerp = lerp(pinned, slip_angle, fade);

    let coeff = relaxation_gain(velocity_local.x, cfg.tire_relaxation_length);
    let slip_angle_dynamic =
        (slip_angle_dynamic + (slip_angle_lerp - slip_angle_dynamic) * coeff).clamp(-90.0, 90.0);

    LateralSlip {
        slip: (slip_angle_dynamic / cfg.slip_angle_peak).clamp(-1.0, 1.0),
        slip_angle_dynamic,
    }
}
