//! Pushback: moves the agent out of every walkable collider its spheres overlap.
//!
//! Each pass visits the spheres in order and resolves their overlaps one collider
//! at a time, applying every push immediately so later spheres see the corrected
//! position. Passes repeat while something was pushed, up to the depth cap.

use crate::collision::backend::CollisionBackend;
use crate::collision::filter::{CollisionGroup, GroupOverride, QueryFilter};
use crate::collision::settings::{CAST_DISTANCE, TINY_TOLERANCE};
use crate::collision::types::{ColliderHandle, CollisionType, EntityId, Point3, Vec3};
use crate::geometry::normalize_or_zero;
use crate::surface::{SurfacePoint, closest_surface_point};

use super::config::CollisionSphere;

/// One resolved overlap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionContact {
    pub sphere: CollisionSphere,
    pub collision_type: CollisionType,
    pub entity: EntityId,
    pub collider: ColliderHandle,
    /// Closest point on the collider's surface before the push.
    pub point: Point3,
    pub normal: Vec3,
}

/// The agent as the resolver sees it.
#[derive(Clone, Copy, Debug)]
pub struct PushbackAgent<'a> {
    pub spheres: &'a [CollisionSphere],
    pub up: Vec3,
    pub radius: f32,
    pub height_scale: f32,
    pub filter: &'a QueryFilter,
    /// Hidden from every overlap for the duration of the resolve.
    pub ignored: &'a [ColliderHandle],
    pub max_depth: u32,
}

/// Push the agent at `position` out of overlapping geometry and record every
/// resolved overlap in `contacts`. Returns how many passes ran.
pub fn resolve<B: CollisionBackend + ?Sized>(
    backend: &mut B,
    agent: &PushbackAgent,
    position: &mut Point3,
    contacts: &mut Vec<CollisionContact>,
) -> u32 {
    let mut depth = 0;
    loop {
        let pushed = pass(backend, agent, position, contacts);
        if !pushed || depth >= agent.max_depth {
            return depth + 1;
        }
        depth += 1;
    }
}

fn pass<B: CollisionBackend + ?Sized>(
    backend: &mut B,
    agent: &PushbackAgent,
    position: &mut Point3,
    contacts: &mut Vec<CollisionContact>,
) -> bool {
    let scoped = GroupOverride::new(backend, agent.ignored.iter().copied(), CollisionGroup::Scratch);
    let mut unsupported: Vec<ColliderHandle> = Vec::new();
    let mut pushed = false;

    for sphere in agent.spheres {
        let center = sphere.world_position(position, &agent.up, agent.height_scale);
        let overlaps = scoped.overlap_sphere(center, agent.radius, agent.filter);

        for handle in overlaps {
            // Earlier contacts in this pass may already have moved the agent.
            let center = sphere.world_position(position, &agent.up, agent.height_scale);

            let Some((entity, closest)) = scoped.collider(handle).and_then(|collider| {
                let pose = scoped.collider_pose(handle)?;
                Some((
                    collider.entity,
                    closest_surface_point(&collider.shape, &pose, &center, agent.radius),
                ))
            }) else {
                log::warn!("overlap reported unknown collider {handle:?}");
                continue;
            };

            let Some(SurfacePoint {
                point: contact_point,
                face_normal,
            }) = closest
            else {
                if !unsupported.contains(&handle) {
                    log::warn!("pushback skipped collider {handle:?}: no closest point");
                    unsupported.push(handle);
                }
                continue;
            };

            let to_contact = contact_point - center;
            let distance = to_contact.norm();
            if distance <= f32::EPSILON {
                continue;
            }
            let direction = to_contact / distance;

            // Solids: a sweep toward the contact only hits from outside the surface.
            // Meshes are hollow and answer from the face winding instead.
            let facing = match face_normal {
                Some(normal) => normal.dot(&to_contact) <= 0.0,
                None => scoped
                    .sphere_sweep_collider(handle, center, TINY_TOLERANCE, direction, distance + TINY_TOLERANCE)
                    .is_some(),
            };

            let push = if facing {
                if distance >= agent.radius {
                    continue;
                }
                direction * -(agent.radius - distance)
            } else {
                direction * (agent.radius + distance)
            };

            *position += push;
            pushed = true;

            let pushed_center = center + push;
            let normal = scoped
                .sphere_sweep_collider(
                    handle,
                    pushed_center,
                    TINY_TOLERANCE,
                    contact_point - pushed_center,
                    CAST_DISTANCE,
                )
                .map(|hit| hit.normal)
                .unwrap_or_else(|| normalize_or_zero(&push));

            contacts.push(CollisionContact {
                sphere: *sphere,
                collision_type: scoped.collision_type(entity),
                entity,
                collider: handle,
                point: contact_point,
                normal,
            });
        }
    }

    pushed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::mesh::box_mesh;
    use crate::collision::types::{ColliderShape, Transform};
    use crate::collision::world::CollisionWorld;
    use crate::controller::config::SphereSet;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    const RADIUS: f32 = 0.5;

    fn run(world: &mut CollisionWorld, start: Point3, ignored: &[ColliderHandle]) -> (Point3, Vec<CollisionContact>) {
        let spheres = SphereSet::default();
        let filter = QueryFilter::walkable();
        let agent = PushbackAgent {
            spheres: spheres.spheres(),
            up: Vec3::y(),
            radius: RADIUS,
            height_scale: 1.0,
            filter: &filter,
            ignored,
            max_depth: 3,
        };
        let mut position = start;
        let mut contacts = Vec::new();
        resolve(world, &agent, &mut position, &mut contacts);
        (position, contacts)
    }

    fn ball_world() -> (CollisionWorld, ColliderHandle) {
        let mut world = CollisionWorld::new();
        let (_, handle) = world.add_static(
            Transform::identity(),
            ColliderShape::Sphere { radius: 1.0 },
            CollisionGroup::Static,
        );
        (world, handle)
    }

    #[test]
    fn feet_penetrating_a_sphere_are_pushed_out_by_the_depth() {
        let (mut world, handle) = ball_world();
        // Feet center at 1.2, 0.3 inside a unit sphere at the origin.
        let (position, contacts) = run(&mut world, Point3::new(0.0, 0.7, 0.0), &[]);
        assert_relative_eq!(position.y - 0.7, 0.3, epsilon = 1.0e-4);
        assert!(position.x.abs() < 1.0e-5 && position.z.abs() < 1.0e-5);

        let first = contacts.first().unwrap();
        assert!(first.sphere.is_feet);
        assert_eq!(first.collider, handle);
        assert_relative_eq!(first.point, Point3::new(0.0, 1.0, 0.0), epsilon = 1.0e-5);
        assert_relative_eq!(first.normal, Vec3::y(), epsilon = 1.0e-3);
    }

    #[test]
    fn pushback_is_idempotent() {
        let (mut world, _) = ball_world();
        let (once, _) = run(&mut world, Point3::new(0.1, 0.7, -0.05), &[]);
        let (twice, _) = run(&mut world, once, &[]);
        assert!((twice - once).norm() < 1.0e-4);
    }

    #[test]
    fn resolved_spheres_do_not_penetrate_a_box() {
        let mut world = CollisionWorld::new();
        world.add_static(
            Transform::identity(),
            ColliderShape::Cuboid {
                half_extents: Vec3::new(1.0, 1.0, 1.0),
            },
            CollisionGroup::Static,
        );
        // Body sphere overlapping the +x face.
        let (position, contacts) = run(&mut world, Point3::new(1.3, -0.5, 0.0), &[]);
        assert!(!contacts.is_empty());
        for sphere in SphereSet::default().spheres() {
            let center = sphere.world_position(&position, &Vec3::y(), 1.0);
            let surface = crate::surface::closest_point_on_surface(
                &ColliderShape::Cuboid {
                    half_extents: Vec3::new(1.0, 1.0, 1.0),
                },
                &Transform::identity(),
                &center,
                RADIUS,
            )
            .unwrap();
            let inside = center.x.abs() < 1.0 && center.y.abs() < 1.0 && center.z.abs() < 1.0;
            assert!(!inside);
            assert!((center - surface).norm() >= RADIUS - 1.0e-3);
        }
        assert_relative_eq!(position.x, 1.5, epsilon = 1.0e-3);
    }

    #[test]
    fn center_inside_a_box_is_pushed_through_the_nearest_face() {
        let mut world = CollisionWorld::new();
        world.add_static(
            Transform::identity(),
            ColliderShape::Cuboid {
                half_extents: Vec3::new(1.0, 0.25, 1.0),
            },
            CollisionGroup::Static,
        );
        // Feet center 0.1 below the top face.
        let (position, _) = run(&mut world, Point3::new(0.0, -0.35, 0.0), &[]);
        assert_relative_eq!(position.y, 0.25, epsilon = 1.0e-3);
    }

    #[test]
    fn mesh_colliders_use_the_tree() {
        let mut world = CollisionWorld::new();
        let mesh = Arc::new(box_mesh([2.0, 0.5, 2.0]).unwrap());
        world.add_static(Transform::identity(), ColliderShape::TriMesh(mesh), CollisionGroup::Static);
        // Feet 0.2 into the top face from above.
        let (position, contacts) = run(&mut world, Point3::new(0.3, 0.2, 0.1), &[]);
        assert_relative_eq!(position.y, 0.5, epsilon = 1.0e-3);
        assert!(contacts.iter().all(|c| c.normal.y > 0.9));
    }

    #[test]
    fn sunken_feet_leave_a_mesh_box_like_a_solid_box() {
        let mut solid = CollisionWorld::new();
        solid.add_static(
            Transform::identity(),
            ColliderShape::Cuboid {
                half_extents: Vec3::new(2.0, 0.5, 2.0),
            },
            CollisionGroup::Static,
        );
        let mut hollow = CollisionWorld::new();
        let mesh = Arc::new(box_mesh([2.0, 0.5, 2.0]).unwrap());
        hollow.add_static(Transform::identity(), ColliderShape::TriMesh(mesh), CollisionGroup::Static);

        // Feet center 0.1 below the top face.
        let start = Point3::new(0.3, -0.1, 0.1);
        let (from_solid, _) = run(&mut solid, start, &[]);
        let (from_mesh, contacts) = run(&mut hollow, start, &[]);
        assert_relative_eq!(from_solid.y, 0.5, epsilon = 1.0e-3);
        assert_relative_eq!(from_mesh, from_solid, epsilon = 1.0e-3);
        assert!(contacts.first().is_some_and(|c| c.normal.y > 0.9));
    }

    #[test]
    fn ignored_collider_between_center_and_contact_does_not_flip_the_push() {
        let (mut world, _) = ball_world();
        let (_, slab) = world.add_static(
            Transform::from_translation(Vec3::new(0.0, 0.9, 0.0)),
            ColliderShape::Cuboid {
                half_extents: Vec3::new(0.3, 0.02, 0.3),
            },
            CollisionGroup::Static,
        );
        // Feet center at 0.8, inside the unit ball, with the slab right above it.
        let (position, contacts) = run(&mut world, Point3::new(0.0, 0.3, 0.0), &[slab]);
        assert_relative_eq!(position, Point3::new(0.0, 1.0, 0.0), epsilon = 1.0e-3);
        assert!(contacts.iter().all(|c| c.collider != slab));
        assert_eq!(world.collider_group(slab), Some(CollisionGroup::Static));
    }

    #[test]
    fn ignored_colliders_are_skipped_and_restored() {
        let (mut world, handle) = ball_world();
        let start = Point3::new(0.0, 0.7, 0.0);
        let (position, contacts) = run(&mut world, start, &[handle]);
        assert_eq!(position, start);
        assert!(contacts.is_empty());
        assert_eq!(world.collider_group(handle), Some(CollisionGroup::Static));
    }

    #[test]
    fn unsupported_shapes_are_skipped() {
        let mut world = CollisionWorld::new();
        world.add_static(
            Transform::identity(),
            ColliderShape::Cylinder {
                radius: 1.0,
                half_height: 1.0,
            },
            CollisionGroup::Static,
        );
        let start = Point3::new(0.0, 0.7, 0.0);
        let (position, contacts) = run(&mut world, start, &[]);
        assert_eq!(position, start);
        assert!(contacts.is_empty());
    }
}
