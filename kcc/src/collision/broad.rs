use rapier3d::parry::{
    bounding_volume::{Aabb, BoundingVolume},
    partitioning::{Bvh, BvhBuildStrategy},
    shape as pshape,
};

use super::types::{ColliderShape, Iso, Point3, Vec3};

/// Acceleration structure for broad-phase queries over the collision world.
///
/// Notes:
/// - Finite shapes get a world-space AABB stored in a BVH.
/// - Planes are infinite and kept in `plane_indices`; every query tests them.
/// - `finite_indices` maps each BVH leaf back to its slot in the world's collider list.
pub struct WorldAccel {
    /// BVH over finite collider shapes (AABBs).
    pub bvh: Bvh,
    /// Collider slots for the AABBs above.
    pub finite_indices: Vec<usize>,
    /// Collider slots for planes.
    pub plane_indices: Vec<usize>,
}

impl WorldAccel {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.finite_indices.is_empty() && self.plane_indices.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.finite_indices.len() + self.plane_indices.len()
    }
}

/// Build the accelerator from `(slot, shape, world pose)` triples.
pub fn build_world_accel<'a, I>(colliders: I) -> WorldAccel
where
    I: IntoIterator<Item = (usize, &'a ColliderShape, Iso)>,
{
    let mut aabbs: Vec<Aabb> = Vec::new();
    let mut finite_indices: Vec<usize> = Vec::new();
    let mut plane_indices: Vec<usize> = Vec::new();

    for (slot, shape, iso) in colliders {
        match shape_aabb_world(shape, &iso) {
            Some(aabb) => {
                aabbs.push(aabb);
                finite_indices.push(slot);
            }
            None => plane_indices.push(slot),
        }
    }

    WorldAccel {
        bvh: Bvh::from_leaves(BvhBuildStrategy::Binned, &aabbs),
        finite_indices,
        plane_indices,
    }
}

/// World-space AABB of a finite shape; `None` for planes.
pub fn shape_aabb_world(shape: &ColliderShape, iso: &Iso) -> Option<Aabb> {
    let aabb = match shape {
        ColliderShape::Cuboid { half_extents } => pshape::Cuboid::new(*half_extents).aabb(iso),
        ColliderShape::Sphere { radius } => pshape::Ball::new(*radius).aabb(iso),
        ColliderShape::Capsule {
            radius,
            half_height,
        } => pshape::Capsule::new_y(*half_height, *radius).aabb(iso),
        ColliderShape::Cylinder {
            radius,
            half_height,
        } => pshape::Cylinder::new(*half_height, *radius).aabb(iso),
        ColliderShape::TriMesh(mesh) => mesh.shape().aabb(iso),
        ColliderShape::Plane => return None,
    };
    Some(aabb)
}

/// AABB swept by a sphere moving from `start` along `dir * distance`.
pub fn swept_sphere_aabb(start: &Point3, radius: f32, dir: &Vec3, distance: f32) -> Aabb {
    let end = start + dir * distance;
    let begin = Aabb::from_half_extents(*start, Vec3::repeat(radius));
    begin.merged(&Aabb::from_half_extents(end, Vec3::repeat(radius)))
}

/// AABB swept by a capsule segment `a`-`b` moving along `dir * distance`.
pub fn swept_capsule_aabb(a: &Point3, b: &Point3, radius: f32, dir: &Vec3, distance: f32) -> Aabb {
    swept_sphere_aabb(a, radius, dir, distance).merged(&swept_sphere_aabb(b, radius, dir, distance))
}

/// Candidate collider slots whose AABB intersects `region`, planes included.
///
/// The result is sorted so narrow-phase tie-breaks are deterministic.
pub fn query_candidates(accel: &WorldAccel, region: &Aabb) -> Vec<usize> {
    let mut out: Vec<usize> = accel
        .bvh
        .intersect_aabb(region)
        .filter_map(|leaf| accel.finite_indices.get(leaf as usize).copied())
        .collect();
    out.extend_from_slice(&accel.plane_indices);
    out.sort_unstable();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::types::Transform;

    fn accel() -> WorldAccel {
        let shapes = [
            ColliderShape::Sphere { radius: 1.0 },
            ColliderShape::Plane,
            ColliderShape::Cuboid {
                half_extents: Vec3::new(1.0, 1.0, 1.0),
            },
        ];
        let poses = [
            Transform::from_translation(Vec3::new(0.0, 0.0, 0.0)),
            Transform::identity(),
            Transform::from_translation(Vec3::new(20.0, 0.0, 0.0)),
        ];
        build_world_accel(
            shapes
                .iter()
                .zip(poses.iter())
                .enumerate()
                .map(|(i, (s, p))| (i, s, p.iso())),
        )
    }

    #[test]
    fn planes_are_kept_out_of_the_bvh() {
        let accel = accel();
        assert_eq!(accel.plane_indices, vec![1]);
        assert_eq!(accel.finite_indices, vec![0, 2]);
        assert_eq!(accel.len(), 3);
    }

    #[test]
    fn candidates_include_planes_and_nearby_shapes_only() {
        let accel = accel();
        let region = swept_sphere_aabb(&Point3::new(0.0, 3.0, 0.0), 0.5, &(-Vec3::y()), 5.0);
        assert_eq!(query_candidates(&accel, &region), vec![0, 1]);

        let far = swept_sphere_aabb(&Point3::new(20.0, 3.0, 0.0), 0.5, &(-Vec3::y()), 5.0);
        assert_eq!(query_candidates(&accel, &far), vec![1, 2]);
    }

    #[test]
    fn swept_capsule_covers_both_ends() {
        let aabb = swept_capsule_aabb(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(0.0, 2.0, 0.0),
            0.5,
            &Vec3::x(),
            3.0,
        );
        assert_eq!(aabb.mins, Point3::new(-0.5, -0.5, -0.5));
        assert_eq!(aabb.maxs, Point3::new(3.5, 2.5, 0.5));
    }
}
