use super::filter::{CollisionGroup, QueryFilter};
use super::types::{Collider, ColliderHandle, CollisionType, EntityId, Hit, Point3, Transform, Vec3};

/// Scene queries and metadata the controller needs from the host.
///
/// Semantics every implementation must follow:
/// - Directions need not be normalized; a zero direction never hits.
/// - Sweeps ignore colliders that already overlap the swept shape at its start
///   position. The pushback resolver relies on this to tell which side of a
///   surface a sphere is on.
/// - Rays that start inside a solid report no hit for that solid.
/// - Filtered queries only see colliders accepted by `filter`.
pub trait CollisionBackend {
    fn raycast(
        &self,
        origin: Point3,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter,
    ) -> Option<Hit>;

    fn sphere_sweep(
        &self,
        center: Point3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter,
    ) -> Option<Hit>;

    /// Sweep a sphere against `handle` alone. Groups, masks and filters do not apply.
    fn sphere_sweep_collider(
        &self,
        handle: ColliderHandle,
        center: Point3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<Hit>;

    /// Sweep a capsule whose segment runs from `a` to `b`.
    fn capsule_sweep(
        &self,
        a: Point3,
        b: Point3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter,
    ) -> Option<Hit>;

    /// Every collider touching the sphere, in a stable order.
    fn overlap_sphere(&self, center: Point3, radius: f32, filter: &QueryFilter) -> Vec<ColliderHandle>;

    fn collider(&self, handle: ColliderHandle) -> Option<&Collider>;

    /// World pose of a collider (owning entity transform composed with the local pose).
    fn collider_pose(&self, handle: ColliderHandle) -> Option<Transform>;

    fn collider_group(&self, handle: ColliderHandle) -> Option<CollisionGroup>;

    fn set_collider_group(&mut self, handle: ColliderHandle, group: CollisionGroup);

    fn entity_transform(&self, entity: EntityId) -> Option<Transform>;

    /// Registered collision type of `entity`, or the default.
    fn collision_type(&self, entity: EntityId) -> CollisionType;
}
