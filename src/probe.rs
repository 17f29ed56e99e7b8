// ==============================================================================
// probe.rs — RAPIER ADAPTERS FOR THE WHEEL-CORE BOUNDARY TRAITS
// ------------------------------------------------------------------------------
// GroundProbe wraps rapier's QueryPipeline into the GroundQuery contract:
// one solid ray cast, chassis excluded via the query filter, hit normal taken
// from the intersection. No retries; a miss is reported as None.
//
// RigidBodyInterface is implemented directly on rapier's RigidBody: forces
// accumulate via add_force_at_point (cleared by the world harness after the
// pipeline integrates) and point velocity comes from velocity_at_point.
// ==============================================================================

use rapier3d::prelude::{
    ColliderSet, Point, QueryFilter, QueryPipeline, Ray, Real, RigidBody, RigidBodySet, Vector,
};

use crate::wheel::{ContactHit, GroundQuery, RigidBodyInterface};

/// Read-only ray query over a rapier scene.
pub struct GroundProbe<'a> {
    pub query: &'a QueryPipeline,
    pub bodies: &'a RigidBodySet,
    pub colliders: &'a ColliderSet,
    /// Must exclude the chassis body so the ray never hits the vehicle itself.
    pub filter: QueryFilter<'a>,
}

impl GroundQuery for GroundProbe<'_> {
    fn raycast(
        &self,
        origin: Point<Real>,
        direction: Vector<Real>,
        max_distance: Real,
    ) -> Option<ContactHit> {
        let ray = Ray::new(origin, direction);
        let (_, intersection) = self.query.cast_ray_and_get_normal(
            self.bodies,
            self.colliders,
            &ray,
            max_distance,
            true,
            self.filter,
        )?;

        Some(ContactHit {
            point: ray.point_at(intersection.time_of_impact),
            normal: intersection.normal,
            distance: intersection.time_of_impact,
        })
    }
}

impl RigidBodyInterface for RigidBody {
    fn apply_force_at_position(&mut self, force: Vector<Real>, position: Point<Real>) {
        self.add_force_at_point(force, position, true);
    }

    fn point_velocity(&self, position: Point<Real>) -> Vector<Real> {
        self.velocity_at_point(&position)
    }
}
