// ==============================================================================
// controller.rs — PER-WHEEL STEP ORCHESTRATION
// ------------------------------------------------------------------------------
// Sequences the stages once per fixed timestep; the ordering and the data
// threaded between stages are load-bearing:
//
// 1) spin integration, using LAST step's longitudinal tire force
// 2) ground probe (downward ray from the mount point)
// 3) suspension spring-damper -> normal force, applied at the mount point
// 4) if grounded: contact-point velocity sampled and rotated into wheel axes
// 5) slip ratio + lagged slip angle
// 6) tire force, applied at the contact point; its longitudinal component is
//    carried into the NEXT step's torque balance
//
// Airborne wheels skip 4-6 entirely: slip and tire forces are zeroed and the
// wheel coasts under drive torque alone. dt and the mount pose are explicit
// parameters; the orchestrator reads no ambient engine state.
// ==============================================================================

use rapier3d::prelude::{Isometry, Point, Real, Vector};

use crate::error::ConfigError;
use crate::wheel::config::WheelConfig;
use crate::wheel::state::{GroundQuery, RigidBodyInterface, WheelState};
use crate::wheel::visual::WheelVisual;
use crate::wheel::{rotation, slip, suspension, tire};

/// One wheel: validated configuration plus exclusively-owned runtime state.
#[derive(Debug, Clone)]
pub struct WheelController {
    config: WheelConfig,
    state: WheelState,
}

impl WheelController {
    /// Validates and copies `config`; the wheel starts at rest.
    pub fn new(config: WheelConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            state: WheelState::at_rest(config.spring_rest_length),
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &WheelConfig {
        &self.config
    }

    #[inline]
    pub fn state(&self) -> &WheelState {
        &self.state
    }

    /// Advances the wheel by one fixed timestep.
    ///
    /// `mount` is the wheel mount pose in world space (chassis pose composed
    /// with the local mount offset and any steering rotation); its local axes
    /// are x = lateral, y = up, z = forward. `dt` must be positive and
    /// constant across a run; a non-positive `dt` skips the step.
    pub fn step<B, G>(
        &mut self,
        body: &mut B,
        ground: &G,
        mount: &Isometry<Real>,
        drive_torque: Real,
        dt: Real,
    ) where
        B: RigidBodyInterface,
        G: GroundQuery,
    {
        debug_assert!(dt > 0.0, "fixed timestep must be positive");
        if dt <= 0.0 {
            return;
        }

        // 1) Spin integration against last step's longitudinal tire force.
        self.state.angular_velocity = rotation::integrate(
            &self.config,
            self.state.angular_velocity,
            drive_torque,
            self.state.force.z,
            dt,
        );

        // Per-step scratch state; only spring length, spin, and the lagged
        // slip angle survive across steps.
        self.state.linear_velocity_local = Vector::zeros();
        self.state.slip = Vector::zeros();
        self.state.force = Vector::zeros();

        let mount_position = Point::from(mount.translation.vector);
        let wheel_up = mount.rotation * Vector::y();

        // 2) Ground probe.
        let contact = ground.raycast(mount_position, -wheel_up, self.config.probe_distance());

        // 3) Suspension.
        let response = suspension::update(
            &self.config,
            contact.as_ref(),
            mount_position,
            wheel_up,
            self.state.spring_length,
            dt,
        );

        if response.grounded {
            self.state.last_spring_length = self.state.spring_length;
        }
        self.state.spring_length = response.spring_length;
        self.state.spring_velocity = response.spring_velocity;
        self.state.force.y = response.normal_force;
        self.state.last_contact = contact;

        let Some(hit) = contact else {
            return;
        };

        let normal = normalize_or_zero(hit.normal);
        body.apply_force_at_position(normal * response.normal_force, mount_position);

        // 4) Contact-point velocity in wheel-local axes.
        let point_velocity = body.point_velocity(hit.point);
        self.state.linear_velocity_local = mount.rotation.inverse_transform_vector(&point_velocity);

        // 5) Slip.
        self.state.slip.z = slip::longitudinal(
            &self.config,
            self.state.linear_velocity_local.z,
            self.state.angular_velocity,
            response.normal_force,
            dt,
        );
        let lateral = slip::lateral(
            &self.config,
            &self.state.linear_velocity_local,
            self.state.slip_angle_dynamic,
        );
        self.state.slip.x = lateral.slip;
        self.state.slip_angle_dynamic = lateral.slip_angle_dynamic;

        // 6) Tire force at the contact point.
        let wheel_right = mount.rotation * Vector::x();
        let wheel_forward = mount.rotation * Vector::z();
        let force = tire::compute(
            response.normal_force,
            &self.state.slip,
            wheel_right,
            wheel_forward,
            normal,
        );
        self.state.force.x = force.lateral;
        self.state.force.z = force.longitudinal;
        body.apply_force_at_position(force.world, hit.point);
    }

    /// Mesh pose increment for this step. Pure output.
    pub fn visual(&self, dt: Real) -> WheelVisual {
        WheelVisual {
            local_offset: [0.0, -self.state.spring_length, 0.0],
            spin_delta: self.state.angular_velocity * dt,
            mirror: if self.config.is_left { -1.0 } else { 1.0 },
        }
    }
}

#[inline]
fn normalize_or_zero(v: Vector<Real>) -> Vector<Real> {
    let m = v.magnitude();
    if m > 1e-6 { v / m } else { Vector::zeros() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wheel::state::ContactHit;
    use approx::assert_relative_eq;
    use rapier3d::prelude::{point, vector};

    const DT: Real = 0.02;

    /// Chassis mock: fixed point velocity, records applied forces.
    struct MockBody {
        velocity: Vector<Real>,
        applied: Vec<(Vector<Real>, Point<Real>)>,
    }

    impl MockBody {
        fn still() -> Self {
            Self {
                velocity: Vector::zeros(),
                applied: Vec::new(),
            }
        }

        fn moving(velocity: Vector<Real>) -> Self {
            Self {
                velocity,
                applied: Vec::new(),
            }
        }
    }

    impl RigidBodyInterface for MockBody {
        fn apply_force_at_position(&mut self, force: Vector<Real>, position: Point<Real>) {
            self.applied.push((force, position));
        }

        fn point_velocity(&self, _position: Point<Real>) -> Vector<Real> {
            self.velocity
        }
    }

    /// Flat ground plane at a fixed world height, or no ground at all.
    struct MockGround {
        height: Option<Real>,
    }

    impl GroundQuery for MockGround {
        fn raycast(
            &self,
            origin: Point<Real>,
            direction: Vector<Real>,
            max_distance: Real,
        ) -> Option<ContactHit> {
            let height = self.height?;
            // Downward ray against y = height.
            let distance = (origin.y - height) / -direction.y;
            (distance >= 0.0 && distance <= max_distance).then(|| ContactHit {
                point: origin + direction * distance,
                normal: vector![0.0, 1.0, 0.0],
                distance,
            })
        }
    }

    fn mount_at(y: Real) -> Isometry<Real> {
        Isometry::translation(0.0, y, 0.0)
    }

    fn wheel() -> WheelController {
        WheelController::new(WheelConfig::default()).unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let mut cfg = WheelConfig::default();
        cfg.wheel_inertia = 0.0;
        assert!(WheelController::new(cfg).is_err());
    }

    #[test]
    fn airborne_step_zeroes_slip_and_forces() {
        let mut w = wheel();
        let mut body = MockBody::still();
        let ground = MockGround { height: None };

        w.step(&mut body, &ground, &mount_at(5.0), 0.0, DT);

        let s = w.state();
        assert!(!s.grounded());
        assert_eq!(s.force, Vector::zeros());
        assert_eq!(s.slip, Vector::zeros());
        assert_relative_eq!(s.spring_length, 0.6); // rest + travel
        assert!(body.applied.is_empty());
    }

    #[test]
    fn airborne_wheel_coasts_under_drive_torque() {
        let mut w = wheel();
        let mut body = MockBody::still();
        let ground = MockGround { height: None };

        w.step(&mut body, &ground, &mount_at(5.0), 30.0, DT);
        w.step(&mut body, &ground, &mount_at(5.0), 30.0, DT);

        assert_relative_eq!(w.state().angular_velocity, 2.0 * 30.0 / 1.5 * DT);
    }

    #[test]
    fn static_contact_reaches_reference_normal_force() {
        // Mount held so the spring sits at 0.35: hit distance must be
        // 0.35 + radius, so ground at mount_y - 0.68.
        let mut w = wheel();
        let ground = MockGround { height: Some(0.0) };
        let mount = mount_at(0.68);

        // First step seeds the spring length, second has zero spring velocity.
        let mut body = MockBody::still();
        w.step(&mut body, &ground, &mount, 0.0, DT);
        let mut body = MockBody::still();
        w.step(&mut body, &ground, &mount, 0.0, DT);

        let s = w.state();
        assert!(s.grounded());
        assert_relative_eq!(s.spring_length, 0.35, epsilon = 1e-5);
        assert_relative_eq!(s.force.y, 1500.0, epsilon = 1.0);

        // Suspension force applied at the mount point, along the normal.
        let (force, position) = body.applied[0];
        assert_relative_eq!(force.y, 1500.0, epsilon = 1.0);
        assert_eq!(position, point![0.0, 0.68, 0.0]);
    }

    #[test]
    fn tire_force_lags_spin_integration_by_one_step() {
        // Drive a grounded wheel from rest: the first step integrates spin
        // with zero reaction force (nothing carried over yet), the second
        // step sees the first step's longitudinal force.
        let mut w = wheel();
        let ground = MockGround { height: Some(0.0) };
        let mount = mount_at(0.68);
        let torque = 60.0;

        let mut body = MockBody::still();
        w.step(&mut body, &ground, &mount, torque, DT);
        let free_spin = torque / 1.5 * DT;
        assert_relative_eq!(w.state().angular_velocity, free_spin, epsilon = 1e-5);
        let carried = w.state().force.z;
        assert!(carried > 0.0);

        let mut body = MockBody::still();
        w.step(&mut body, &ground, &mount, torque, DT);
        let expected = free_spin + (torque - carried * 0.33) / 1.5 * DT;
        assert_relative_eq!(w.state().angular_velocity, expected, epsilon = 1e-4);
        assert!(w.state().angular_velocity < 2.0 * free_spin);
    }

    #[test]
    fn driven_wheel_pushes_chassis_forward() {
        let mut w = wheel();
        let ground = MockGround { height: Some(0.0) };
        let mount = mount_at(0.68);

        let mut body = MockBody::still();
        w.step(&mut body, &ground, &mount, 100.0, DT);

        // Spin surplus demands forward friction: slip.z > 0, so the tire
        // force at the contact point points along local +z.
        assert!(w.state().slip.z > 0.0);
        let (force, position) = body.applied[1];
        assert!(force.z > 0.0);
        assert_relative_eq!(position.y, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn lateral_drift_produces_opposing_force() {
        // Chassis rolling forward while drifting along +x: slip angle is
        // negative, the lateral tire force opposes the drift.
        let mut w = wheel();
        let ground = MockGround { height: Some(0.0) };
        let mount = mount_at(0.68);

        let mut body = MockBody::moving(vector![8.0, 0.0, 6.0]);
        w.step(&mut body, &ground, &mount, 0.0, DT);

        assert!(w.state().slip.x < 0.0);
        let (force, _) = body.applied[1];
        assert!(force.x < 0.0);
    }

    #[test]
    fn slip_bounds_hold_over_arbitrary_sequences() {
        let mut w = wheel();
        let ground = MockGround { height: Some(0.0) };

        // Alternating hops, drifts, and torque spikes.
        for i in 0..400 {
            let airborne = i % 7 == 0;
            let mount = mount_at(if airborne { 5.0 } else { 0.55 + 0.05 * ((i % 5) as Real) });
            let vx = ((i % 11) as Real - 5.0) * 4.0;
            let vz = ((i % 13) as Real - 6.0) * 5.0;
            let torque = ((i % 17) as Real - 8.0) * 200.0;

            let mut body = MockBody::moving(vector![vx, 0.0, vz]);
            w.step(&mut body, &ground, &mount, torque, DT);

            let s = w.state();
            assert!(s.slip.x.abs() <= 1.0);
            assert!(s.slip.z.abs() <= 1.0);
            assert!(s.slip_angle_dynamic.abs() <= 90.0);
            for (force, _) in &body.applied {
                assert!(force.magnitude().is_finite());
            }
        }
    }

    #[test]
    fn visual_pose_tracks_spring_and_spin() {
        let mut cfg = WheelConfig::default();
        cfg.is_left = true;
        let mut w = WheelController::new(cfg).unwrap();
        let mut body = MockBody::still();
        let ground = MockGround { height: None };

        w.step(&mut body, &ground, &mount_at(5.0), 15.0, DT);

        let v = w.visual(DT);
        assert_relative_eq!(v.local_offset[1], -0.6);
        assert_relative_eq!(v.spin_delta, w.state().angular_velocity * DT);
        assert_eq!(v.mirror, -1.0);
    }
}
