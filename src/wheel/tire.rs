// ==============================================================================
// tire.rs — SLIP-TO-FORCE MAPPING + GROUND-PLANE PROJECTION
// ------------------------------------------------------------------------------
// Maps the normal load and the normalized slip pair onto contact forces:
//
//     F_x = max(F_n, 0) * slip.x       (lateral)
//     F_z = max(F_n, 0) * slip.z       (longitudinal)
//
// A transiently negative suspension force never produces tire force; the
// floor at zero lives here, not in the suspension stage.
//
// The wheel's lateral and forward axes are projected onto the plane
// perpendicular to the contact normal before scaling, so the force stays
// tangent to the ground on slopes. The caller applies the resulting world
// vector at the contact point and carries F_z into the next step's torque
// balance.
// ==============================================================================

use rapier3d::prelude::{Real, Vector};

/// Tire force for one step.
#[derive(Debug, Clone, Copy)]
pub struct TireForce {
    /// World-space force to apply at the contact point.
    pub world: Vector<Real>,
    /// Lateral force magnitude along the projected wheel-x axis (N).
    pub lateral: Real,
    /// Longitudinal force magnitude along the projected wheel-z axis (N).
    /// Feeds back into the next step's spin integration.
    pub longitudinal: Real,
}

/// Projects `v` onto the plane perpendicular to `normal`, normalized.
/// Falls back to zero when the projection degenerates (axis parallel to the
/// contact normal).
#[inline]
fn project_on_plane(v: Vector<Real>, normal: Vector<Real>) -> Vector<Real> {
    let tangent = v - normal * v.dot(&normal);
    let m = tangent.magnitude();
    if m > 1e-6 { tangent / m } else { Vector::zeros() }
}

/// Computes the world-space tire force from the normal load and slip pair.
/// `wheel_right` / `wheel_forward` are the wheel's world axes; `normal` is
/// the contact normal (unit).
pub fn compute(
    normal_force: Real,
    slip: &Vector<Real>,
    wheel_right: Vector<Real>,
    wheel_forward: Vector<Real>,
    normal: Vector<Real>,
) -> TireForce {
    let load = normal_force.max(0.0);
    let lateral = load * slip.x;
    let longitudinal = load * slip.z;

    let world = project_on_plane(wheel_right, normal) * lateral
        + project_on_plane(wheel_forward, normal) * longitudinal;

    TireForce {
        world,
        lateral,
        longitudinal,
    }
}
