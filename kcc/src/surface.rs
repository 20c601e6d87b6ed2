//! Closest point on a collider's surface.
//!
//! Boxes, spheres and capsules use closed-form projections in the collider's
//! local frame. Triangle meshes go through their BSP tree. Planes and cylinders
//! have no closest-point implementation; callers treat `None` as "skip this contact".

use crate::collision::types::{ColliderShape, Point3, Transform, Vec3};

/// A point on a collider's surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfacePoint {
    pub point: Point3,
    /// Winding normal of the mesh face holding `point`; `None` for solid shapes.
    /// Meshes are hollow, so the side a point is on comes from this normal.
    pub face_normal: Option<Vec3>,
}

/// Closest point on `shape` (placed at `pose`) to `target`, in world space.
///
/// `probe_radius` bounds the mesh tree search and is ignored by closed-form shapes.
pub fn closest_point_on_surface(
    shape: &ColliderShape,
    pose: &Transform,
    target: &Point3,
    probe_radius: f32,
) -> Option<Point3> {
    closest_surface_point(shape, pose, target, probe_radius).map(|surface| surface.point)
}

/// [`closest_point_on_surface`] plus the face normal for meshes.
pub fn closest_surface_point(
    shape: &ColliderShape,
    pose: &Transform,
    target: &Point3,
    probe_radius: f32,
) -> Option<SurfacePoint> {
    let solid = |point: Point3| SurfacePoint {
        point,
        face_normal: None,
    };
    match shape {
        ColliderShape::Cuboid { half_extents } => {
            let local = pose.inverse_transform_point(target);
            Some(solid(pose.transform_point(&closest_point_on_box(half_extents, &local))))
        }
        ColliderShape::Sphere { radius } => {
            let local = pose.inverse_transform_point(target);
            Some(solid(pose.transform_point(&closest_point_on_sphere(*radius, &local))))
        }
        ColliderShape::Capsule {
            radius,
            half_height,
        } => {
            let local = pose.inverse_transform_point(target);
            Some(solid(pose.transform_point(&closest_point_on_capsule(*radius, *half_height, &local))))
        }
        ColliderShape::TriMesh(mesh) => mesh
            .closest_face(pose, target, probe_radius)
            .map(|(point, normal)| SurfacePoint {
                point,
                face_normal: Some(normal),
            }),
        ColliderShape::Plane | ColliderShape::Cylinder { .. } => {
            log::warn!("no closest point for {} colliders", shape.kind());
            None
        }
    }
}

/// Box centered at the local origin.
///
/// The point is clamped into the box, then the coordinate nearest to a face is
/// pushed onto that face so interior points land on the surface. Ties go to the
/// first axis in X, Y, Z order; a coordinate of exactly zero snaps to the positive face.
pub fn closest_point_on_box(half_extents: &Vec3, local: &Point3) -> Point3 {
    let mut p = Point3::new(
        local.x.clamp(-half_extents.x, half_extents.x),
        local.y.clamp(-half_extents.y, half_extents.y),
        local.z.clamp(-half_extents.z, half_extents.z),
    );

    let mut axis = 0;
    let mut nearest = f32::INFINITY;
    for i in 0..3 {
        let to_face = half_extents[i] - p[i].abs();
        if to_face < nearest {
            nearest = to_face;
            axis = i;
        }
    }
    p[axis] = if p[axis] >= 0.0 {
        half_extents[axis]
    } else {
        -half_extents[axis]
    };
    p
}

/// Sphere centered at the local origin. A target exactly at the center resolves to local +Y.
pub fn closest_point_on_sphere(radius: f32, local: &Point3) -> Point3 {
    let dir = local.coords.try_normalize(1.0e-12).unwrap_or_else(Vec3::y);
    Point3::from(dir * radius)
}

/// Y-aligned capsule centered at the local origin.
///
/// A target on the core segment resolves along local +X.
pub fn closest_point_on_capsule(radius: f32, half_height: f32, local: &Point3) -> Point3 {
    let on_segment = Point3::new(0.0, local.y.clamp(-half_height, half_height), 0.0);
    let dir = (local - on_segment).try_normalize(1.0e-12).unwrap_or_else(Vec3::x);
    on_segment + dir * radius
}
