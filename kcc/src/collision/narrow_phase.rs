use rapier3d::parry::{
    query::{self, Ray, RayCast, ShapeCastOptions},
    shape::{self as pshape, Shape},
};

use super::types::{ColliderShape, Iso, Point3, Vec3};

/// Contact produced by a single-collider ray cast or sweep.
#[derive(Clone, Copy, Debug)]
pub struct NarrowHit {
    /// Distance travelled along the (unit) direction.
    pub distance: f32,
    /// World-space contact point on the static collider.
    pub point: Point3,
    /// World-space surface normal, oriented against the direction of travel.
    pub normal: Vec3,
}

/// Run `f` with the parry shape for `shape`.
///
/// Primitive shapes are built on the stack; meshes lend their prebuilt `TriMesh`.
pub fn with_parry_shape<R>(shape: &ColliderShape, f: impl FnOnce(&dyn Shape) -> R) -> R {
    match shape {
        ColliderShape::Cuboid { half_extents } => f(&pshape::Cuboid::new(*half_extents)),
        ColliderShape::Sphere { radius } => f(&pshape::Ball::new(*radius)),
        ColliderShape::Capsule {
            radius,
            half_height,
        } => f(&pshape::Capsule::new_y(*half_height, *radius)),
        ColliderShape::Cylinder {
            radius,
            half_height,
        } => f(&pshape::Cylinder::new(*half_height, *radius)),
        ColliderShape::TriMesh(mesh) => f(mesh.shape()),
        ColliderShape::Plane => f(&pshape::HalfSpace::new(Vec3::y_axis())),
    }
}

/// Flip `normal` so it faces against `dir`. Mesh triangles can be hit from either side.
#[inline]
fn oppose(normal: Vec3, dir: &Vec3) -> Vec3 {
    if normal.dot(dir) > 0.0 { -normal } else { normal }
}

/// Cast a ray (unit `dir`) against one collider. Rays starting inside a solid do not hit it.
pub fn cast_ray(
    shape: &ColliderShape,
    iso: &Iso,
    origin: &Point3,
    dir: &Vec3,
    max_distance: f32,
) -> Option<NarrowHit> {
    let ray = Ray::new(*origin, *dir);
    let hit = with_parry_shape(shape, |s| s.cast_ray_and_get_normal(iso, &ray, max_distance, true))?;
    if hit.time_of_impact <= 0.0 {
        return None;
    }
    Some(NarrowHit {
        distance: hit.time_of_impact,
        point: ray.point_at(hit.time_of_impact),
        normal: oppose(hit.normal, dir),
    })
}

/// Sweep `moving` from `start` along unit `dir` against one collider.
///
/// Colliders already intersecting `moving` at `start` are ignored.
pub fn cast_shape(
    moving: &dyn Shape,
    start: &Iso,
    dir: &Vec3,
    max_distance: f32,
    shape: &ColliderShape,
    iso: &Iso,
) -> Option<NarrowHit> {
    with_parry_shape(shape, |target| {
        if query::intersection_test(start, moving, iso, target).unwrap_or(false) {
            return None;
        }
        let mut opts = ShapeCastOptions::with_max_time_of_impact(max_distance);
        opts.stop_at_penetration = true;
        match query::cast_shapes(start, dir, moving, iso, &Vec3::zeros(), target, opts) {
            Ok(Some(hit)) => Some(NarrowHit {
                distance: hit.time_of_impact,
                point: iso * hit.witness2,
                normal: oppose(iso * hit.normal2.into_inner(), dir),
            }),
            Ok(None) => None,
            Err(err) => {
                log::warn!("shape cast unsupported against {}: {err:?}", shape.kind());
                None
            }
        }
    })
}

/// True when `moving` placed at `at` touches the collider.
pub fn intersects(moving: &dyn Shape, at: &Iso, shape: &ColliderShape, iso: &Iso) -> bool {
    with_parry_shape(shape, |target| match query::intersection_test(at, moving, iso, target) {
        Ok(hit) => hit,
        Err(err) => {
            log::warn!("intersection test unsupported against {}: {err:?}", shape.kind());
            false
        }
    })
}

/// Isometry of a Y-aligned capsule spanning segment `a`-`b`, plus its half height.
pub fn capsule_between(a: &Point3, b: &Point3) -> (Iso, f32) {
    let axis = b - a;
    let half_height = axis.norm() * 0.5;
    let center = nalgebra::center(a, b);
    let rotation = nalgebra::UnitQuaternion::rotation_between(&Vec3::y(), &axis)
        .unwrap_or_else(|| {
            // Anti-parallel (or degenerate) axis: any half-turn about X works for a capsule.
            nalgebra::UnitQuaternion::from_axis_angle(&Vec3::x_axis(), std::f32::consts::PI)
        });
    (
        Iso::from_parts(nalgebra::Translation3::from(center.coords), rotation),
        half_height,
    )
}
