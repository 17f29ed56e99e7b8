// ==============================================================================
// world.rs — RAPIER WORLD HARNESS (CHASSIS + WHEELS + FIXED-STEP LOOP)
// ------------------------------------------------------------------------------
// Owns the rapier scene (pipeline, body/collider sets, query pipeline), a
// static ground, and the vehicles built on top of the wheel core. Each fixed
// step:
//
// 1) refresh the query pipeline
// 2) per vehicle: snapshot the chassis kinematics, step every wheel against
//    that snapshot (forces are collected, then applied to the real body —
//    wheels only accumulate additive forces, so per-wheel order is free)
// 3) step the rapier pipeline
// 4) clear the accumulated wheel forces (they are per-tick inputs) and reset
//    any body that escaped to non-finite or absurd coordinates
//
// Wheel forces are sampled against the beginning-of-tick chassis velocity;
// the one-step staleness is an accepted approximation of the body interface.
// ==============================================================================

use nalgebra::UnitQuaternion;
use rapier3d::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::probe::GroundProbe;
use crate::wheel::{RigidBodyInterface, WheelConfig, WheelController};

const GROUP_GROUND: Group = Group::from_bits_truncate(0b0001);
const GROUP_CHASSIS: Group = Group::from_bits_truncate(0b0010);

/// Chassis rigid-body parameters.
#[derive(Debug, Clone, Copy)]
pub struct ChassisConfig {
    pub mass: Real,               // kg
    pub half_extents: [Real; 3],  // m
    pub com_offset: [Real; 3],    // m, local offset from collider center
    pub linear_damping: Real,
    pub angular_damping: Real,
}

impl Default for ChassisConfig {
    fn default() -> Self {
        Self {
            mass: 1350.0,
            half_extents: [1.0, 0.35, 2.1],
            com_offset: [0.0, -0.15, 0.0],
            linear_damping: 0.08,
            angular_damping: 0.6,
        }
    }
}

/// A wheel attachment: chassis-local mount point plus wheel parameters.
#[derive(Debug, Clone, Copy)]
pub struct WheelMount {
    pub offset: Point<Real>,
    pub config: WheelConfig,
}

/// Four-wheel layout with steered front and driven rear axle.
pub fn default_wheel_mounts() -> Vec<WheelMount> {
    let mut mounts = Vec::with_capacity(4);
    for (x, z, steering, driving) in [
        (-0.8, 1.5, true, false),
        (0.8, 1.5, true, false),
        (-0.8, -1.5, false, true),
        (0.8, -1.5, false, true),
    ] {
        let config = WheelConfig {
            is_steering: steering,
            is_driving: driving,
            is_left: x < 0.0,
            ..WheelConfig::default()
        };
        mounts.push(WheelMount {
            offset: point![x, -0.3, z],
            config,
        });
    }
    mounts
}

struct VehicleWheel {
    offset: Point<Real>,
    controller: WheelController,
}

/// A chassis body plus its wheels and the current per-tick inputs.
pub struct Vehicle {
    pub body: RigidBodyHandle,
    pub chassis: ChassisConfig,
    wheels: Vec<VehicleWheel>,
    /// Torque routed to each wheel flagged `is_driving`, N*m.
    pub drive_torque: Real,
    /// Yaw applied to each wheel flagged `is_steering`, radians.
    pub steer_angle: Real,
}

impl Vehicle {
    /// Read access to the wheel controllers, in mount order.
    pub fn wheel_controllers(&self) -> impl Iterator<Item = &WheelController> {
        self.wheels.iter().map(|w| &w.controller)
    }
}

/// Beginning-of-tick chassis snapshot. Collects wheel forces so the rapier
/// body set stays free for ray queries while the wheels step.
struct ChassisProxy {
    linvel: Vector<Real>,
    angvel: Vector<Real>,
    com: Point<Real>,
    pending: Vec<(Vector<Real>, Point<Real>)>,
}

impl ChassisProxy {
    fn capture(body: &RigidBody) -> Self {
        Self {
            linvel: *body.linvel(),
            angvel: *body.angvel(),
            // Already world-space on the rapier body.
            com: *body.center_of_mass(),
            pending: Vec::new(),
        }
    }
}

impl RigidBodyInterface for ChassisProxy {
    fn apply_force_at_position(&mut self, force: Vector<Real>, position: Point<Real>) {
        self.pending.push((force, position));
    }

    fn point_velocity(&self, position: Point<Real>) -> Vector<Real> {
        // v(p) = v_com + w x (p - com)
        self.linvel + self.angvel.cross(&(position - self.com))
    }
}

// ----------------------------------------------------------------------------
// Debug overlay (pure output, rebuilt every step)
// ----------------------------------------------------------------------------

#[derive(Clone, Serialize)]
pub struct DebugRay {
    pub origin: [Real; 3],
    pub direction: [Real; 3],
    pub length: Real,
    pub hit: Option<[Real; 3]>,
}

#[derive(Clone, Serialize)]
pub struct DebugWheel {
    pub center: [Real; 3],
    pub radius: Real,
    pub grounded: bool,
    pub spring_length: Real,
    pub normal_force: Real,
    pub angular_velocity: Real,
    /// Normalized slip, `[lateral, longitudinal]`.
    pub slip: [Real; 2],
}

#[derive(Clone, Serialize)]
pub struct DebugChassis {
    pub position: [Real; 3],
    pub rotation: [Real; 4], // quaternion (i, j, k, w)
    pub half_extents: [Real; 3],
}

/// One entry per vehicle in `chassis`, one per wheel in the other lists, in
/// spawn order.
#[derive(Clone, Default, Serialize)]
pub struct DebugOverlay {
    pub chassis: Vec<DebugChassis>,
    pub suspension_rays: Vec<DebugRay>,
    pub wheels: Vec<DebugWheel>,
}

impl DebugOverlay {
    pub fn clear(&mut self) {
        self.chassis.clear();
        self.suspension_rays.clear();
        self.wheels.clear();
    }
}

// ----------------------------------------------------------------------------
// World
// ----------------------------------------------------------------------------

pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    query_pipeline: QueryPipeline,
    pub vehicles: Vec<Vehicle>,
    pub debug_overlay: DebugOverlay,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Empty world with a large static ground slab whose top surface is y = 0.
    pub fn new() -> Self {
        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        let ground = RigidBodyBuilder::fixed()
            .translation(vector![0.0, -1.0, 0.0])
            .build();
        let ground_handle = bodies.insert(ground);

        let ground_collider = ColliderBuilder::cuboid(500.0, 1.0, 500.0)
            .collision_groups(InteractionGroups::new(GROUP_GROUND, GROUP_CHASSIS))
            .friction(1.0)
            .restitution(0.0)
            .build();
        colliders.insert_with_parent(ground_collider, ground_handle, &mut bodies);

        Self {
            gravity: vector![0.0, -9.81, 0.0],
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            vehicles: Vec::new(),
            debug_overlay: DebugOverlay::default(),
        }
    }

    /// Spawns a chassis box with one wheel controller per mount. Every wheel
    /// configuration is validated and copied; no two wheels share state.
    pub fn spawn_vehicle(
        &mut self,
        position: [Real; 3],
        chassis: ChassisConfig,
        mounts: &[WheelMount],
    ) -> Result<RigidBodyHandle, ConfigError> {
        let [hx, hy, hz] = chassis.half_extents;
        let [cx, cy, cz] = chassis.com_offset;
        let volume = 8.0 * hx * hy * hz;
        let density = chassis.mass / volume;

        let body = RigidBodyBuilder::dynamic()
            .translation(vector![position[0], position[1], position[2]])
            .linear_damping(chassis.linear_damping)
            .angular_damping(chassis.angular_damping)
            .ccd_enabled(true)
            .build();

        let collider = ColliderBuilder::cuboid(hx, hy, hz)
            .translation(vector![cx, cy, cz])
            .collision_groups(InteractionGroups::new(GROUP_CHASSIS, GROUP_GROUND))
            .density(density)
            .friction(0.0) // all ground interaction goes through the wheels
            .restitution(0.0)
            .build();

        let handle = self.bodies.insert(body);
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);

        let mut wheels = Vec::with_capacity(mounts.len());
        for mount in mounts {
            wheels.push(VehicleWheel {
                offset: mount.offset,
                controller: WheelController::new(mount.config)?,
            });
        }

        debug!(?handle, wheels = wheels.len(), "spawned vehicle");

        self.vehicles.push(Vehicle {
            body: handle,
            chassis,
            wheels,
            drive_torque: 0.0,
            steer_angle: 0.0,
        });

        Ok(handle)
    }

    pub fn vehicle(&self, body: RigidBodyHandle) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.body == body)
    }

    pub fn vehicle_mut(&mut self, body: RigidBodyHandle) -> Option<&mut Vehicle> {
        self.vehicles.iter_mut().find(|v| v.body == body)
    }

    /// Advances the world by one fixed timestep.
    pub fn step(&mut self, dt: Real) {
        self.query_pipeline.update(&self.colliders);
        self.debug_overlay.clear();

        for vehicle in &mut self.vehicles {
            let Some(body) = self.bodies.get(vehicle.body) else {
                continue;
            };
            let pose = *body.position();
            let mut proxy = ChassisProxy::capture(body);

            self.debug_overlay.chassis.push(DebugChassis {
                position: pose.translation.vector.into(),
                rotation: [
                    pose.rotation.i,
                    pose.rotation.j,
                    pose.rotation.k,
                    pose.rotation.w,
                ],
                half_extents: vehicle.chassis.half_extents,
            });

            {
                let probe = GroundProbe {
                    query: &self.query_pipeline,
                    bodies: &self.bodies,
                    colliders: &self.colliders,
                    filter: QueryFilter::default().exclude_rigid_body(vehicle.body),
                };

                for wheel in &mut vehicle.wheels {
                    let config = *wheel.controller.config();
                    let steer = if config.is_steering {
                        vehicle.steer_angle
                    } else {
                        0.0
                    };
                    let local = Isometry::from_parts(
                        wheel.offset.coords.into(),
                        UnitQuaternion::from_axis_angle(&Vector::y_axis(), steer),
                    );
                    let mount = pose * local;
                    let torque = if config.is_driving {
                        vehicle.drive_torque
                    } else {
                        0.0
                    };

                    wheel.controller.step(&mut proxy, &probe, &mount, torque, dt);

                    let state = wheel.controller.state();
                    let mount_position = Point::from(mount.translation.vector);
                    let up = mount.rotation * Vector::y();
                    self.debug_overlay.suspension_rays.push(DebugRay {
                        origin: mount_position.into(),
                        direction: (-up).into(),
                        length: config.probe_distance(),
                        hit: state.last_contact.map(|c| c.point.into()),
                    });
                    self.debug_overlay.wheels.push(DebugWheel {
                        center: (mount_position - up * state.spring_length).into(),
                        radius: config.wheel_radius,
                        grounded: state.grounded(),
                        spring_length: state.spring_length,
                        normal_force: state.force.y,
                        angular_velocity: state.angular_velocity,
                        slip: [state.slip.x, state.slip.z],
                    });
                }
            }

            if let Some(body) = self.bodies.get_mut(vehicle.body) {
                for (force, position) in proxy.pending.drain(..) {
                    body.add_force_at_point(force, position, true);
                }
            }
        }

        let hooks = ();
        let mut events = ();
        self.pipeline.step(
            &self.gravity,
            &IntegrationParameters {
                dt,
                ..IntegrationParameters::default()
            },
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            Some(&mut self.query_pipeline),
            &hooks,
            &mut events,
        );

        // Wheel forces are per-tick inputs, not persistent force fields.
        for vehicle in &self.vehicles {
            if let Some(body) = self.bodies.get_mut(vehicle.body) {
                body.reset_forces(true);
            }
        }

        // Safety net: a diverging body is reset instead of propagating NaNs.
        for (_, body) in self.bodies.iter_mut() {
            let position = *body.translation();
            let bad = !position.x.is_finite()
                || !position.y.is_finite()
                || !position.z.is_finite()
                || position.x.abs() > 1_000.0
                || position.y.abs() > 1_000.0
                || position.z.abs() > 1_000.0;

            if bad {
                warn!(?position, "resetting runaway body");
                body.set_translation(vector![0.0, 1.0, 0.0], true);
                body.set_linvel(vector![0.0, 0.0, 0.0], true);
                body.set_angvel(vector![0.0, 0.0, 0.0], true);
            }
        }
    }
}
