/*!
Core collision types and math aliases shared by the collision submodules.

This module contains no algorithms. It defines the data exchanged between:
- the collision world (broad phase + narrow phase queries)
- the surface query dispatcher (closest point on collider)
- the ground prober and pushback resolver in `controller`

Entities own a world transform. Colliders are attached to an entity with a local
pose, so moving an entity (e.g. a platform) moves every collider attached to it.
*/

use std::sync::Arc;

use nalgebra as na;

use super::filter::{CollisionGroup, GroupMask};
use super::mesh::TriangleMesh;
use super::settings::{DEFAULT_SLOPE_LIMIT_DEG, DEFAULT_STAND_ANGLE_DEG};

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Point3 = na::Point3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// A rigid transform (isometry) in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    #[inline]
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    #[inline]
    pub fn identity() -> Self {
        Self::new(Vec3::zeros(), Quat::identity())
    }

    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self::new(translation, Quat::identity())
    }

    /// Convert to nalgebra `Isometry3` for use with parry3d queries.
    #[inline]
    pub fn iso(&self) -> Iso {
        Iso::from_parts(na::Translation3::from(self.translation), self.rotation)
    }

    /// Local → world.
    #[inline]
    pub fn transform_point(&self, local: &Point3) -> Point3 {
        self.iso().transform_point(local)
    }

    /// World → local.
    #[inline]
    pub fn inverse_transform_point(&self, world: &Point3) -> Point3 {
        self.iso().inverse_transform_point(world)
    }

    #[inline]
    pub fn transform_vector(&self, local: &Vec3) -> Vec3 {
        self.rotation * local
    }

    /// `self ∘ local`: place a child pose expressed in this transform's frame.
    #[inline]
    pub fn compose(&self, local: &Transform) -> Transform {
        Transform {
            translation: self.translation + self.rotation * local.translation,
            rotation: self.rotation * local.rotation,
        }
    }
}

/// Opaque scene entity identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

/// Opaque collider handle, stable for the lifetime of the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColliderHandle(pub u32);

/// Collider shapes supported by the world.
///
/// All shapes are expressed in the collider's local frame; capsules and cylinders
/// are aligned with local +Y, planes are the half-space below local +Y.
#[derive(Clone, Debug)]
pub enum ColliderShape {
    Cuboid {
        /// Local-space half-extents (hx, hy, hz).
        half_extents: Vec3,
    },
    Sphere {
        radius: f32,
    },
    Capsule {
        /// Radius of the spherical caps and cylinder.
        radius: f32,
        /// Half of the cylinder length along the local +Y axis.
        half_height: f32,
    },
    /// Static triangle mesh. Shared so a mesh asset can back many colliders.
    TriMesh(Arc<TriangleMesh>),
    /// Infinite plane through the local origin with normal local +Y.
    Plane,
    Cylinder {
        radius: f32,
        half_height: f32,
    },
}

impl ColliderShape {
    pub fn kind(&self) -> &'static str {
        match self {
            ColliderShape::Cuboid { .. } => "cuboid",
            ColliderShape::Sphere { .. } => "sphere",
            ColliderShape::Capsule { .. } => "capsule",
            ColliderShape::TriMesh(_) => "trimesh",
            ColliderShape::Plane => "plane",
            ColliderShape::Cylinder { .. } => "cylinder",
        }
    }
}

/// A collider attached to an entity.
#[derive(Clone, Debug)]
pub struct Collider {
    pub entity: EntityId,
    /// Pose relative to the owning entity.
    pub local_pose: Transform,
    pub shape: ColliderShape,
    /// The single group this collider belongs to.
    pub group: CollisionGroup,
    /// Groups whose queries may see this collider.
    pub mask: GroupMask,
}

/// Result of a ray cast or shape sweep.
///
/// For sweeps, `distance` is how far the swept shape's center travelled before
/// touching, and `point` is the contact point on the hit collider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub collider: ColliderHandle,
    pub entity: EntityId,
    pub point: Point3,
    /// World-space surface normal of the hit collider.
    pub normal: Vec3,
    pub distance: f32,
}

/// Per-entity walkability metadata. Entities without one use the defaults.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionType {
    /// Max normal-vs-up angle (degrees) still counted as ground rather than wall.
    pub stand_angle: f32,
    /// Max normal-vs-up angle (degrees) the agent may ascend.
    pub slope_limit: f32,
}

impl Default for CollisionType {
    fn default() -> Self {
        Self {
            stand_angle: DEFAULT_STAND_ANGLE_DEG,
            slope_limit: DEFAULT_SLOPE_LIMIT_DEG,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn transform_point_round_trips_through_inverse() {
        let t = Transform::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_axis_angle(&Vec3::y_axis(), 0.7),
        );
        let p = Point3::new(-0.5, 4.0, 2.0);
        let back = t.inverse_transform_point(&t.transform_point(&p));
        assert_relative_eq!(back, p, epsilon = 1.0e-5);
    }

    #[test]
    fn compose_matches_iso_multiplication() {
        let parent = Transform::new(
            Vec3::new(0.0, 1.0, 0.0),
            Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_2),
        );
        let child = Transform::from_translation(Vec3::new(2.0, 0.0, 0.0));
        let composed = parent.compose(&child);
        // +X rotated 90° about Z becomes +Y.
        assert_relative_eq!(composed.translation, Vec3::new(0.0, 3.0, 0.0), epsilon = 1.0e-5);
        assert_relative_eq!(
            composed.iso().to_homogeneous(),
            (parent.iso() * child.iso()).to_homogeneous(),
            epsilon = 1.0e-5
        );
    }

    #[test]
    fn default_collision_type_is_forty_degrees() {
        let ct = CollisionType::default();
        assert_eq!(ct.stand_angle, 40.0);
        assert_eq!(ct.slope_limit, 40.0);
    }
}
