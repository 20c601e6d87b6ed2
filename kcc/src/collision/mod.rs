/*!
Collision root module.

The controller talks to geometry only through [`CollisionBackend`]. This module
defines that seam and ships one implementation, [`CollisionWorld`], built on
parry3d (through the `rapier3d` re-export) with a BVH broad phase:

- types:        shared data types (Transform, ColliderShape, Hit, CollisionType)
- settings:     controller tolerances and default tuning
- filter:       collision groups, query filters, scoped group override
- backend:      the `CollisionBackend` trait
- mesh:         static triangle meshes with a lazily built BSP tree
- broad:        broad-phase helpers (world AABBs, swept AABBs, candidate queries)
- narrow_phase: thin wrappers over parry3d queries (rays, shape casts, intersections)
- world:        `CollisionWorld`, the in-process backend
*/

pub mod backend;
pub mod broad;
pub mod filter;
pub mod mesh;
pub mod narrow_phase;
pub mod settings;
pub mod types;
pub mod world;

// Re-export commonly used types.
pub use backend::CollisionBackend;
pub use filter::{CollisionGroup, GroupMask, GroupOverride, QueryFilter};
pub use mesh::TriangleMesh;
pub use types::{
    Collider, ColliderHandle, ColliderShape, CollisionType, EntityId, Hit, Point3, Quat, Transform, Vec3,
};
pub use world::CollisionWorld;

/// Convenience: a transform with the given translation and a rotation of
/// `angle_deg` degrees about world `axis`.
#[inline]
pub fn pose_from_axis_angle(translation: Vec3, axis: Vec3, angle_deg: f32) -> Transform {
    Transform::new(translation, crate::geometry::angle_axis(angle_deg, &axis))
}
