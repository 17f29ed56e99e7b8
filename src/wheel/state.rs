// ==============================================================================
// state.rs — RUNTIME STATE + BOUNDARY CONTRACTS
// ------------------------------------------------------------------------------
// WheelState is the only cross-step memory a wheel carries: spring extension,
// wheel spin, the lagged slip angle, and last step's tire force (which feeds
// the next step's torque balance). Everything else is recomputed from scratch
// each step.
//
// The two traits at the bottom are the crate's entire external surface:
// - RigidBodyInterface: the chassis body (apply force at point, point velocity)
// - GroundQuery: the raycast provider
// probe.rs implements both for rapier; unit tests use small mocks.
// ==============================================================================

use rapier3d::prelude::{Point, Real, Vector};

/// Result of one ground-probe ray. Valid for the current step only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactHit {
    /// World-space hit point on the ground geometry.
    pub point: Point<Real>,
    /// Ground surface normal at the hit point.
    pub normal: Vector<Real>,
    /// Distance from the ray origin to the hit point, in meters.
    pub distance: Real,
}

/// Per-wheel mutable state, owned exclusively by one wheel and mutated once
/// per fixed step.
#[derive(Debug, Clone, Copy)]
pub struct WheelState {
    pub spring_length: Real,      // m
    pub last_spring_length: Real, // m, previous step (backward difference)
    pub spring_velocity: Real,    // m/s, positive = compressing

    /// Wheel spin around its axle, rad/s. Persists across steps.
    pub angular_velocity: Real,

    /// Contact-point velocity in wheel-local axes
    /// (x = lateral, y = vertical, z = longitudinal). Recomputed each step.
    pub linear_velocity_local: Vector<Real>,

    /// Normalized slip: x = lateral (lagged), z = longitudinal. y unused.
    pub slip: Vector<Real>,
    /// Low-pass-filtered slip angle, degrees. Persists across steps.
    pub slip_angle_dynamic: Real,

    /// Wheel-local forces from the last step: x = lateral tire, y = suspension
    /// normal, z = longitudinal tire. `force.z` is the reaction torque input
    /// of the next step's spin integration (one-tick lag, by design).
    pub force: Vector<Real>,

    /// Ground contact of the current step, if any.
    pub last_contact: Option<ContactHit>,
}

impl WheelState {
    /// At-rest state for a freshly attached wheel.
    pub fn at_rest(spring_rest_length: Real) -> Self {
        Self {
            spring_length: spring_rest_length,
            last_spring_length: spring_rest_length,
            spring_velocity: 0.0,
            angular_velocity: 0.0,
            linear_velocity_local: Vector::zeros(),
            slip: Vector::zeros(),
            slip_angle_dynamic: 0.0,
            force: Vector::zeros(),
            last_contact: None,
        }
    }

    pub fn grounded(&self) -> bool {
        self.last_contact.is_some()
    }
}

/// Chassis rigid body as seen by one wheel: additive force application plus
/// point-velocity sampling. Force accumulation is commutative, so wheels may
/// be stepped in any order on a single simulation thread.
pub trait RigidBodyInterface {
    /// Accumulates `force` (N, world space) acting at `position` (world).
    fn apply_force_at_position(&mut self, force: Vector<Real>, position: Point<Real>);

    /// World-space velocity of the body-fixed point at `position`.
    fn point_velocity(&self, position: Point<Real>) -> Vector<Real>;
}

/// Ground-contact query: a single ray against world geometry. A miss is a
/// normal, expected outcome every step (wheel airborne), not an error.
pub trait GroundQuery {
    fn raycast(
        &self,
        origin: Point<Real>,
        direction: Vector<Real>,
        max_distance: Real,
    ) -> Option<ContactHit>;
}
