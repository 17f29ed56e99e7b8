//! raywheel — per-wheel raycast vehicle dynamics on top of rapier3d.
//!
//! Each wheel is a self-contained fixed-timestep model: a downward ray finds
//! the ground, a spring-damper along the wheel's up axis produces the normal
//! force, wheel spin is integrated from drive torque and tire reaction, and a
//! slip-ratio / lagged-slip-angle tire model turns the contact load into
//! longitudinal and lateral forces applied back onto the chassis.
//!
//! The model itself lives in [`wheel`] and is engine-agnostic: it talks to
//! the outside world only through [`wheel::RigidBodyInterface`] and
//! [`wheel::GroundQuery`]. [`probe`] implements both for rapier, and
//! [`world`] is a ready-made rapier harness (scene + vehicles + step loop).

pub mod error;
pub mod probe;
pub mod wheel;
pub mod world;

pub use error::ConfigError;
pub use probe::GroundProbe;
pub use wheel::{
    ContactHit, GroundQuery, RigidBodyInterface, WheelConfig, WheelController, WheelState,
    WheelVisual,
};
pub use world::{ChassisConfig, PhysicsWorld, WheelMount, default_wheel_mounts};
