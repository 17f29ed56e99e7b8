//! Per-step pose output for a wheel mesh. Pure output; nothing here feeds
//! back into the force pipeline.

use rapier3d::prelude::Real;

/// Incremental visual transform for one fixed step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelVisual {
    /// Mesh offset below the mount point, mount-local: `(0, -spring_length, 0)`.
    pub local_offset: [Real; 3],
    /// Rotation increment about the spin axis this step, radians.
    pub spin_delta: Real,
    /// `-1.0` for left-side wheels (mesh mirrored across the spin axis),
    /// `1.0` otherwise.
    pub mirror: Real,
}
