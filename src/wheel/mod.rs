//! wheel — engine-agnostic per-wheel dynamics (pure types + step pipeline)

pub mod config;
pub mod controller;
pub mod rotation;
pub mod slip;
pub mod state;
pub mod suspension;
pub mod tire;
pub mod visual;

pub use config::WheelConfig;
pub use controller::WheelController;
pub use state::{ContactHit, GroundQuery, RigidBodyInterface, WheelState};
pub use visual::WheelVisual;
