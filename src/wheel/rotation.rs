// ==============================================================================
// rotation.rs — WHEEL SPIN INTEGRATION
// ------------------------------------------------------------------------------
// Explicit-Euler integration of wheel angular velocity from drive torque and
// tire reaction torque:
//
//     tau   = tau_drive - F_long * r
//     alpha = tau / I
//     w    += alpha * dt
//
// F_long is the longitudinal tire force of the PREVIOUS step: tire force
// depends on the angular velocity this very integration updates, and the
// cycle is broken with a one-tick lag instead of solving the coupled system.
// ==============================================================================

use rapier3d::prelude::Real;

use crate::wheel::config::WheelConfig;

/// One explicit-Euler spin step. `reaction_long_force` is last step's
/// longitudinal tire force (N); positive traction slows the wheel down.
#[inline]
pub fn integrate(
    cfg: &WheelConfig,
    angular_velocity: Real,
    drive_torque: Real,
    reaction_long_force: Real,
    dt: Real,
) -> Real {
    let total_torque = drive_torque - reaction_long_force * cfg.wheel_radius;
    let angular_acceleration = total_torque / cfg.wheel_inertia;
    angular_velocity + angular_acceleration * dt
}
