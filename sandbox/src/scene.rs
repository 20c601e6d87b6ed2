use std::sync::Arc;

use kcc::collision::mesh::grid_mesh;
use kcc::collision::pose_from_axis_angle;
use kcc::{
    ColliderShape, CollisionGroup, CollisionType, CollisionWorld, EntityId, KccError, Transform, Vec3,
};

/// Floor, ramp, wall and a platform sliding back and forth along X.
pub struct Scene {
    pub world: CollisionWorld,
    pub platform: EntityId,
    platform_home: Vec3,
}

const PLATFORM_SWING: f32 = 3.0;
const PLATFORM_PERIOD_S: f32 = 4.0;

impl Scene {
    pub fn build() -> Result<Self, KccError> {
        let mut world = CollisionWorld::new();

        world.add_static(Transform::identity(), ColliderShape::Plane, CollisionGroup::Static);

        // 20° ramp rising toward +x, its low edge buried in the floor.
        let ramp = Arc::new(grid_mesh(6.0, 6)?);
        let (ramp_entity, _) = world.add_static(
            pose_from_axis_angle(Vec3::new(9.0, 1.0, 0.0), Vec3::z(), 20.0),
            ColliderShape::TriMesh(ramp),
            CollisionGroup::Static,
        );
        world.set_collision_type(
            ramp_entity,
            CollisionType {
                stand_angle: 45.0,
                slope_limit: 30.0,
            },
        );

        world.add_static(
            Transform::from_translation(Vec3::new(0.0, 1.5, -6.0)),
            ColliderShape::Cuboid {
                half_extents: Vec3::new(8.0, 1.5, 0.25),
            },
            CollisionGroup::Static,
        );

        let platform_home = Vec3::new(-6.0, 0.5, 0.0);
        let platform = world.spawn_entity(Transform::from_translation(platform_home));
        world.add_collider(
            platform,
            Transform::identity(),
            ColliderShape::Cuboid {
                half_extents: Vec3::new(1.5, 0.25, 1.5),
            },
            CollisionGroup::Kinematic,
        );

        log::info!("scene built with {} colliders", world.collider_count());
        Ok(Self {
            world,
            platform,
            platform_home,
        })
    }

    /// Move the platform to where it should be `time_s` seconds in.
    pub fn advance_platform(&mut self, time_s: f32) {
        let phase = time_s / PLATFORM_PERIOD_S * std::f32::consts::TAU;
        let offset = Vec3::new(phase.sin() * PLATFORM_SWING, 0.0, 0.0);
        self.world
            .set_entity_transform(self.platform, Transform::from_translation(self.platform_home + offset));
    }
}
