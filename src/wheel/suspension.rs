// ==============================================================================
// suspension.rs — 1-D SPRING-DAMPER ALONG THE WHEEL UP AXIS
// ------------------------------------------------------------------------------
// Converts the ground-probe result plus the previous spring length into a
// normal-force magnitude:
//
//     length   = |mount - (hit + up * r)|        (wheel-center-equivalent point)
//     v_spring = (prev_length - length) / dt     (positive = compressing)
//     F_n      = (rest - length) * k + c * v_spring
//
// The backward difference of spring length keeps the damper stable under
// discrete-time raycasting without continuous contact tracking. F_n is NOT
// floored at zero here: on rapid extension it may transiently go negative and
// pull the chassis down. Only the tire stage floors the load at zero.
//
// With no contact the spring is pinned at full extension and no force is
// produced; the `grounded` flag gates the whole slip/tire pipeline downstream.
// ==============================================================================

use rapier3d::prelude::{Point, Real, Vector};

use crate::wheel::config::WheelConfig;
use crate::wheel::state::ContactHit;

/// Suspension output for one step.
#[derive(Debug, Clone, Copy)]
pub struct SuspensionResponse {
    pub spring_length: Real,   // m
    pub spring_velocity: Real, // m/s, positive = compressing
    pub normal_force: Real,    // N, unclamped
    /// False when the probe missed; slip and tire force must not run.
    pub grounded: bool,
}

/// One spring-damper step. `mount` is the wheel mount point (world) and
/// `wheel_up` the wheel's up axis (world, unit). `dt` must be positive.
pub fn update(
    cfg: &WheelConfig,
    contact: Option<&ContactHit>,
    mount: Point<Real>,
    wheel_up: Vector<Real>,
    prev_spring_length: Real,
    dt: Real,
) -> SuspensionResponse {
    let Some(hit) = contact else {
        return SuspensionResponse {
            spring_length: cfg.max_spring_length(),
            spring_velocity: 0.0,
            normal_force: 0.0,
            grounded: false,
        };
    };

    // Wheel-center-equivalent point: hit point pushed back up by one radius.
    let wheel_center = hit.point + wheel_up * cfg.wheel_radius;
    let spring_length = (mount - wheel_center).magnitude();
    let spring_velocity = (prev_spring_length - spring_length) / dt;

    let spring_force = (cfg.spring_rest_length - spring_length) * cfg.spring_stiffness;
    let damper_force = cfg.damper_stiffness * spring_velocity;

    SuspensionResponse {
        spring_length,
        spring_velocity,
        normal_force: spring_force + damper_force,
        grounded: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rapier3d::prelude::{point, vector};

    fn flat_hit(mount_y: Real, toi: Real) -> ContactHit {
        ContactHit {
            point: point![0.0, mount_y - toi, 0.0],
            normal: vector![0.0, 1.0, 0.0],
            distance: toi,
        }
    }

    #[test]
    fn static_compression_scenario() {
        // rest 0.4, k = 30000, spring held at 0.35 for two steps:
        // F = (0.4 - 0.35) * 30000 = 1500 N, zero damper contribution.
        let cfg = WheelConfig::default();
        let mount = point![0.0, 1.0, 0.0];
        let up = vector![0.0, 1.0, 0.0];
        let hit = flat_hit(1.0, 0.35 + cfg.wheel_radius);

        let r = update(&cfg, Some(&hit), mount, up, 0.35, 0.02);
        assert!(r.grounded);
        assert_relative_eq!(r.spring_length, 0.35, epsilon = 1e-6);
        assert_relative_eq!(r.spring_velocity, 0.0, epsilon = 1e-4);
        assert_relative_eq!(r.normal_force, 1500.0, epsilon = 0.5);
    }

    #[test]
    fn compression_adds_damper_force() {
        // Compressing from 0.40 to 0.35 in one 20 ms step:
        // v = 2.5 m/s, damper = 4000 * 2.5 = 10000 N on top of 1500 N.
        let cfg = WheelConfig::default();
        let mount = point![0.0, 1.0, 0.0];
        let up = vector![0.0, 1.0, 0.0];
        let hit = flat_hit(1.0, 0.35 + cfg.wheel_radius);

        let r = update(&cfg, Some(&hit), mount, up, 0.40, 0.02);
        assert_relative_eq!(r.spring_velocity, 2.5, epsilon = 1e-4);
        assert_relative_eq!(r.normal_force, 11_500.0, epsilon = 1.0);
    }

    #[test]
    fn rapid_extension_is_left_unclamped() {
        // Extending from 0.30 to 0.55 in one step: damper pull exceeds the
        // remaining spring push and the net force goes negative. Preserved
        // behavior; the tire stage floors the load at zero instead.
        let cfg = WheelConfig::default();
        let mount = point![0.0, 1.0, 0.0];
        let up = vector![0.0, 1.0, 0.0];
        let hit = flat_hit(1.0, 0.55 + cfg.wheel_radius);

        let r = update(&cfg, Some(&hit), mount, up, 0.30, 0.02);
        assert!(r.normal_force < 0.0);
    }

    #[test]
    fn airborne_pins_full_extension() {
        let cfg = WheelConfig::default();
        let r = update(
            &cfg,
            None,
            point![0.0, 5.0, 0.0],
            vector![0.0, 1.0, 0.0],
            0.35,
            0.02,
        );
        assert!(!r.grounded);
        assert_relative_eq!(r.spring_length, cfg.spring_rest_length + cfg.spring_travel);
        assert_eq!(r.normal_force, 0.0);
    }
}
