/*!
Kinematic character controller.

A [`Controller`] owns one agent: its position, sphere stack, ground state and
the contacts found by the last tick. It never owns the scene; every tick borrows
a [`CollisionBackend`] and runs, in order:

1. follow the clamp target if it moved since the last tick
2. probe the ground
3. the caller's movement hook
4. pushback
5. probe, optional slope limiting, probe, optional ground clamping
6. the fast-motion safeguard

Submodules:
- config:   sphere stack, update mode and per-agent settings
- ground:   the ground prober
- pushback: the overlap resolver
*/

pub mod config;
pub mod ground;
pub mod pushback;

pub use config::{CollisionSphere, ControllerSettings, SphereSet, UpdateMode};
pub use ground::{GroundHit, GroundProbe, ProbeInput};
pub use pushback::{CollisionContact, PushbackAgent};

use crate::collision::backend::CollisionBackend;
use crate::collision::filter::{CollisionGroup, GroupOverride};
use crate::collision::settings::{TINY_TOLERANCE, TUNNEL_SNAP_EXTENT};
use crate::collision::types::{ColliderHandle, EntityId, Point3, Vec3};
use crate::error::KccError;
use crate::geometry::{angle_deg, normalize_or_zero, project_point_on_line, project_vector_on_plane};
use crate::timestep::FixedStepper;

pub struct Controller {
    settings: ControllerSettings,
    position: Point3,
    up: Vec3,
    ground: GroundProbe,
    contacts: Vec<CollisionContact>,
    ignored: Vec<ColliderHandle>,
    clamping: bool,
    slope_limiting: bool,
    clamped_to: Option<EntityId>,
    /// Clamp target and its translation at the end of the last tick.
    last_ground: Option<(EntityId, Vec3)>,
    initial_position: Point3,
    /// Vertical center one tick ago, for the fast-motion safeguard.
    previous_center: Point3,
    stepper: Option<FixedStepper>,
    delta_time: f32,
}

impl Controller {
    pub fn new(settings: ControllerSettings, position: Point3) -> Result<Self, KccError> {
        settings.validate()?;
        let stepper = match settings.update_mode {
            UpdateMode::Fixed { updates_per_second } => Some(FixedStepper::new(updates_per_second)?),
            UpdateMode::Variable | UpdateMode::Manual => None,
        };
        let mut controller = Self {
            clamping: settings.ground_clamping,
            slope_limiting: settings.slope_limiting,
            settings,
            position,
            up: Vec3::y(),
            ground: GroundProbe::new(),
            contacts: Vec::new(),
            ignored: Vec::new(),
            clamped_to: None,
            last_ground: None,
            initial_position: position,
            previous_center: position,
            stepper,
            delta_time: 0.0,
        };
        controller.set_previous_position();
        log::info!(
            "controller created at {:?} (height {:.2}, radius {:.2}, {:?})",
            position,
            controller.height(),
            controller.radius(),
            controller.settings.update_mode
        );
        Ok(controller)
    }

    /// Advance the controller by one frame according to its `UpdateMode`.
    ///
    /// Returns how many ticks ran. `Manual` never ticks here.
    pub fn update<B, H>(&mut self, backend: &mut B, frame_delta: f32, mut hook: H) -> u32
    where
        B: CollisionBackend + ?Sized,
        H: FnMut(&mut Controller, f32),
    {
        match (self.settings.update_mode, self.stepper) {
            (UpdateMode::Manual, _) => 0,
            (UpdateMode::Fixed { .. }, Some(stepper)) => {
                let mut ticks = 0;
                for delta in stepper.split(frame_delta) {
                    self.tick(backend, delta, &mut hook);
                    ticks += 1;
                }
                ticks
            }
            _ => {
                self.tick(backend, frame_delta, hook);
                1
            }
        }
    }

    /// Run one full controller tick. `hook` is where game logic moves the agent.
    pub fn tick<B, H>(&mut self, backend: &mut B, delta_time: f32, hook: H)
    where
        B: CollisionBackend + ?Sized,
        H: FnOnce(&mut Controller, f32),
    {
        self.delta_time = delta_time;

        self.follow_clamp_target(backend);
        self.initial_position = self.position;

        self.probe_ground(backend);

        hook(self, delta_time);

        self.contacts.clear();
        self.pushback(backend);

        self.probe_ground(backend);

        if self.slope_limiting && self.ground.is_grounded(&self.position, TINY_TOLERANCE).is_some() {
            self.slope_limit(backend);
        }

        self.probe_ground(backend);

        if self.clamping {
            self.clamp_to_ground();
        }

        self.remember_clamp_target(backend);
        self.guard_fast_motion(backend);
    }

    fn clamp_target(&self) -> Option<EntityId> {
        if self.clamping || self.clamped_to.is_some() {
            self.clamped_to.or(self.ground.ground_entity())
        } else {
            None
        }
    }

    fn follow_clamp_target<B: CollisionBackend + ?Sized>(&mut self, backend: &B) {
        if !self.settings.clamp_to_moving_ground {
            return;
        }
        let (Some(target), Some((last_entity, last_translation))) = (self.clamp_target(), self.last_ground) else {
            return;
        };
        // A different entity means the agent changed ground; there is nothing to follow.
        if target != last_entity {
            return;
        }
        if let Some(transform) = backend.entity_transform(target) {
            let moved = transform.translation - last_translation;
            if moved != Vec3::zeros() {
                self.position += moved;
            }
        }
    }

    fn remember_clamp_target<B: CollisionBackend + ?Sized>(&mut self, backend: &B) {
        self.last_ground = self
            .clamp_target()
            .and_then(|entity| backend.entity_transform(entity).map(|t| (entity, t.translation)));
    }

    fn probe_ground<B: CollisionBackend + ?Sized>(&mut self, backend: &mut B) {
        let input = ProbeInput {
            feet: self.feet(),
            position: self.position,
            up: self.up,
            radius: self.settings.radius,
            filter: &self.settings.walkable,
        };
        let scoped = GroupOverride::new(backend, self.ignored.iter().copied(), CollisionGroup::Scratch);
        self.ground.probe(&*scoped, &input);
    }

    fn pushback<B: CollisionBackend + ?Sized>(&mut self, backend: &mut B) {
        let agent = PushbackAgent {
            spheres: self.settings.spheres.spheres(),
            up: self.up,
            radius: self.settings.radius,
            height_scale: self.settings.height_scale,
            filter: &self.settings.walkable,
            ignored: &self.ignored,
            max_depth: self.settings.max_pushback_depth,
        };
        pushback::resolve(backend, &agent, &mut self.position, &mut self.contacts);
    }

    /// Undo uphill movement on ground steeper than its slope limit.
    ///
    /// Returns true when the movement was limited.
    fn slope_limit<B: CollisionBackend + ?Sized>(&mut self, backend: &B) -> bool {
        let n = self.ground.primary_normal();
        let angle = angle_deg(&n, &self.up);
        if angle <= self.ground.collision_type().slope_limit {
            return false;
        }

        let movement = project_vector_on_plane(&n, &(self.position - self.initial_position));
        let across = normalize_or_zero(&n.cross(&self.down()));
        let down_slope = across.cross(&n);
        if angle_deg(&movement, &down_slope) <= 90.0 {
            return false;
        }

        let resolved = project_point_on_line(&self.initial_position, &across, &self.position);
        let direction = project_vector_on_plane(&n, &(resolved - self.position));
        let length = direction.norm();
        let unit = normalize_or_zero(&direction);

        let filter = &self.settings.walkable;
        let hit = if self.settings.slope_limit_capsule_sweep {
            backend.capsule_sweep(self.feet(), self.head(), self.settings.radius, unit, length, filter)
        } else {
            backend.sphere_sweep(self.feet(), self.settings.radius, unit, length, filter)
        };

        match hit {
            Some(hit) => self.position += unit * hit.distance,
            None => self.position += direction,
        }
        log::debug!("slope limited on {angle:.1}° ground, moved back {:.3}", length);
        true
    }

    fn clamp_to_ground(&mut self) {
        self.position -= self.up * self.ground.distance();
    }

    /// Catch movement large enough to tunnel through thin geometry between ticks.
    fn guard_fast_motion<B: CollisionBackend + ?Sized>(&mut self, backend: &mut B) {
        let half_height = self.up * (self.height() * 0.5);
        let center = self.position + half_height;
        let movement = center - self.previous_center;
        let radius = self.settings.radius;

        if movement.norm_squared() > radius * radius {
            let length = movement.norm();
            let direction = movement / length;
            let scoped = GroupOverride::new(backend, self.ignored.iter().copied(), CollisionGroup::Scratch);
            if let Some(hit) = scoped.raycast(self.previous_center, direction, length, &self.settings.walkable) {
                let snapped = hit.point - direction * (radius * TUNNEL_SNAP_EXTENT) - half_height;
                log::warn!("fast motion blocked: snapping {:?} back to {:?}", self.position, snapped);
                self.position = snapped;
            }
        }

        self.previous_center = self.position + half_height;
    }

    /// Reset the fast-motion safeguard's reference to the current position.
    pub fn set_previous_position(&mut self) {
        self.previous_center = self.position + self.up * (self.height() * 0.5);
    }

    /// Move without the safeguard treating the jump as motion.
    pub fn teleport(&mut self, position: Point3) {
        self.position = position;
        self.last_ground = None;
        self.set_previous_position();
    }

    pub fn position(&self) -> Point3 {
        self.position
    }

    pub fn set_position(&mut self, position: Point3) {
        self.position = position;
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Delta of the tick in progress (or the last one).
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn down(&self) -> Vec3 {
        -self.up
    }

    /// Change the agent's up axis. Unit length is enforced.
    pub fn set_up(&mut self, up: Vec3) {
        let up = normalize_or_zero(&up);
        if up != Vec3::zeros() {
            self.up = up;
        }
    }

    pub fn radius(&self) -> f32 {
        self.settings.radius
    }

    pub fn height_scale(&self) -> f32 {
        self.settings.height_scale
    }

    pub fn set_height_scale(&mut self, height_scale: f32) {
        self.settings.height_scale = height_scale;
    }

    /// World center of `sphere`.
    pub fn sphere_position(&self, sphere: &CollisionSphere) -> Point3 {
        sphere.world_position(&self.position, &self.up, self.settings.height_scale)
    }

    pub fn feet(&self) -> Point3 {
        self.sphere_position(&self.settings.spheres.feet())
    }

    pub fn head(&self) -> Point3 {
        self.sphere_position(&self.settings.spheres.head())
    }

    /// Distance between the feet and head sphere centers.
    pub fn length(&self) -> f32 {
        (self.head() - self.feet()).norm()
    }

    pub fn half_length(&self) -> f32 {
        self.length() * 0.5
    }

    /// Bottom of the feet sphere to the top of the head sphere.
    pub fn height(&self) -> f32 {
        self.length() + self.settings.radius * 2.0
    }

    /// True when `point` is level with or below the head sphere center.
    pub fn point_below_head(&self, point: &Point3) -> bool {
        angle_deg(&(point - self.head()), &self.up) > 89.0
    }

    /// True when `point` is level with or above the feet sphere center.
    pub fn point_above_feet(&self, point: &Point3) -> bool {
        angle_deg(&(point - self.feet()), &self.down()) > 89.0
    }

    pub fn enable_clamping(&mut self) {
        self.clamping = true;
    }

    pub fn disable_clamping(&mut self) {
        self.clamping = false;
    }

    pub fn is_clamping(&self) -> bool {
        self.clamping
    }

    pub fn enable_slope_limit(&mut self) {
        self.slope_limiting = true;
    }

    pub fn disable_slope_limit(&mut self) {
        self.slope_limiting = false;
    }

    pub fn is_slope_limiting(&self) -> bool {
        self.slope_limiting
    }

    /// Follow `entity` instead of the probed ground, even with clamping disabled.
    pub fn set_clamped_to(&mut self, entity: EntityId) {
        self.clamped_to = Some(entity);
    }

    pub fn clear_clamped_to(&mut self) {
        self.clamped_to = None;
    }

    pub fn clamped_to(&self) -> Option<EntityId> {
        self.clamped_to
    }

    pub fn ignore_collider(&mut self, handle: ColliderHandle) {
        if !self.ignored.contains(&handle) {
            self.ignored.push(handle);
        }
    }

    pub fn remove_ignored_collider(&mut self, handle: ColliderHandle) {
        self.ignored.retain(|h| *h != handle);
    }

    pub fn clear_ignored_colliders(&mut self) {
        self.ignored.clear();
    }

    pub fn ignored_colliders(&self) -> &[ColliderHandle] {
        &self.ignored
    }

    pub fn ground(&self) -> &GroundProbe {
        &self.ground
    }

    /// Ground normal if the agent stands on walkable ground within `threshold`.
    pub fn is_grounded(&self, threshold: f32) -> Option<Vec3> {
        self.ground.is_grounded(&self.position, threshold)
    }

    /// Contacts resolved by the last tick's pushback.
    pub fn collision_data(&self) -> &[CollisionContact] {
        &self.contacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::types::{ColliderShape, Transform};
    use crate::collision::world::CollisionWorld;
    use crate::collision::{CollisionType, pose_from_axis_angle};
    use approx::assert_relative_eq;

    fn idle(_: &mut Controller, _: f32) {}

    fn floor_world() -> CollisionWorld {
        let mut world = CollisionWorld::new();
        world.add_static(Transform::identity(), ColliderShape::Plane, CollisionGroup::Static);
        world
    }

    fn controller_at(position: Point3) -> Controller {
        Controller::new(ControllerSettings::default(), position).unwrap()
    }

    #[test]
    fn default_dimensions() {
        let controller = controller_at(Point3::origin());
        assert_relative_eq!(controller.length(), 1.0);
        assert_relative_eq!(controller.half_length(), 0.5);
        assert_relative_eq!(controller.height(), 2.0);
        assert_eq!(controller.feet(), Point3::new(0.0, 0.5, 0.0));
        assert_eq!(controller.head(), Point3::new(0.0, 1.5, 0.0));
        assert!(controller.point_below_head(&Point3::new(1.0, 1.0, 0.0)));
        assert!(!controller.point_below_head(&Point3::new(0.0, 2.0, 0.0)));
        assert!(controller.point_above_feet(&Point3::new(1.0, 1.0, 0.0)));
        assert!(!controller.point_above_feet(&Point3::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn height_scale_stretches_everything_but_the_feet() {
        let mut controller = controller_at(Point3::origin());
        controller.set_height_scale(2.0);
        assert_eq!(controller.feet(), Point3::new(0.0, 0.5, 0.0));
        assert_eq!(controller.head(), Point3::new(0.0, 3.0, 0.0));
        assert_relative_eq!(controller.height(), 3.5);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let settings = ControllerSettings {
            radius: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            Controller::new(settings, Point3::origin()),
            Err(KccError::InvalidRadius(_))
        ));
    }

    #[test]
    fn clamping_snaps_down_to_the_floor() {
        let mut world = floor_world();
        let mut controller = controller_at(Point3::new(0.0, 0.3, 0.0));
        controller.tick(&mut world, 0.02, idle);
        assert!(controller.position().y.abs() < 2.0 * TINY_TOLERANCE);
        // Ground state is probed before the clamp, so grounding shows up next tick.
        controller.tick(&mut world, 0.02, idle);
        assert!(controller.position().y.abs() < 2.0 * TINY_TOLERANCE);
        assert!(controller.is_grounded(TINY_TOLERANCE).is_some());

        let mut floating = controller_at(Point3::new(0.0, 0.3, 0.0));
        floating.disable_clamping();
        assert!(!floating.is_clamping());
        floating.tick(&mut world, 0.02, idle);
        assert_relative_eq!(floating.position().y, 0.3);
        assert!(floating.is_grounded(TINY_TOLERANCE).is_none());
    }

    #[test]
    fn hook_movement_is_pushed_out_of_walls() {
        let mut world = floor_world();
        world.add_static(
            Transform::from_translation(Vec3::new(2.0, 1.0, 0.0)),
            ColliderShape::Cuboid {
                half_extents: Vec3::new(0.5, 1.0, 2.0),
            },
            CollisionGroup::Static,
        );
        let mut controller = controller_at(Point3::new(0.0, TINY_TOLERANCE, 0.0));
        controller.tick(&mut world, 0.02, |c, _| c.translate(Vec3::new(1.2, 0.0, 0.0)));
        // The wall face is at x = 1.5.
        assert_relative_eq!(controller.position().x, 1.0, epsilon = 1.0e-3);
        assert!(!controller.collision_data().is_empty());
        assert!(controller.collision_data().iter().all(|c| c.normal.x < -0.9));
    }

    #[test]
    fn agent_rides_a_moving_platform() {
        let mut world = CollisionWorld::new();
        let platform = world.spawn_entity(Transform::from_translation(Vec3::new(0.0, -0.25, 0.0)));
        world.add_collider(
            platform,
            Transform::identity(),
            ColliderShape::Cuboid {
                half_extents: Vec3::new(3.0, 0.25, 3.0),
            },
            CollisionGroup::Static,
        );
        let mut controller = controller_at(Point3::new(0.0, 0.02, 0.0));
        controller.tick(&mut world, 0.02, idle);
        assert_eq!(controller.ground().ground_entity(), Some(platform));
        let before = controller.position();

        world.translate_entity(platform, Vec3::new(1.0, 0.0, 0.5));
        controller.tick(&mut world, 0.02, idle);
        let moved = controller.position() - before;
        assert_relative_eq!(moved.x, 1.0, epsilon = 1.0e-3);
        assert_relative_eq!(moved.z, 0.5, epsilon = 1.0e-3);
        assert!(moved.y.abs() < 1.0e-3);
    }

    #[test]
    fn without_moving_ground_the_platform_slides_away() {
        let mut world = CollisionWorld::new();
        let platform = world.spawn_entity(Transform::from_translation(Vec3::new(0.0, -0.25, 0.0)));
        world.add_collider(
            platform,
            Transform::identity(),
            ColliderShape::Cuboid {
                half_extents: Vec3::new(3.0, 0.25, 3.0),
            },
            CollisionGroup::Static,
        );
        let settings = ControllerSettings {
            clamp_to_moving_ground: false,
            ..Default::default()
        };
        let mut controller = Controller::new(settings, Point3::new(0.0, 0.02, 0.0)).unwrap();
        controller.tick(&mut world, 0.02, idle);
        let before = controller.position();
        world.translate_entity(platform, Vec3::new(1.0, 0.0, 0.0));
        controller.tick(&mut world, 0.02, idle);
        assert_relative_eq!(controller.position().x, before.x, epsilon = 1.0e-4);
    }

    #[test]
    fn explicit_clamp_target_is_followed_without_ground_clamping() {
        let mut world = floor_world();
        let anchor = world.spawn_entity(Transform::identity());
        let mut controller = controller_at(Point3::new(0.0, 5.0, 0.0));
        controller.disable_clamping();
        controller.set_clamped_to(anchor);
        controller.tick(&mut world, 0.02, idle);

        world.set_entity_transform(anchor, Transform::from_translation(Vec3::new(0.0, 0.0, -2.0)));
        controller.tick(&mut world, 0.02, idle);
        assert_relative_eq!(controller.position(), Point3::new(0.0, 5.0, -2.0), epsilon = 1.0e-4);

        controller.clear_clamped_to();
        world.set_entity_transform(anchor, Transform::identity());
        controller.tick(&mut world, 0.02, idle);
        assert_relative_eq!(controller.position().z, -2.0, epsilon = 1.0e-4);
    }

    #[test]
    fn fast_motion_through_a_thin_wall_is_snapped_back() {
        let mut world = CollisionWorld::new();
        world.add_static(
            Transform::from_translation(Vec3::new(2.0, 0.0, 0.0)),
            ColliderShape::Cuboid {
                half_extents: Vec3::new(0.05, 5.0, 5.0),
            },
            CollisionGroup::Static,
        );
        let mut controller = controller_at(Point3::origin());
        controller.disable_clamping();
        controller.tick(&mut world, 0.02, |c, _| c.translate(Vec3::new(5.0, 0.0, 0.0)));
        let expected_x = 1.95 - 0.5 * TUNNEL_SNAP_EXTENT;
        assert_relative_eq!(controller.position(), Point3::new(expected_x, 0.0, 0.0), epsilon = 1.0e-4);
    }

    #[test]
    fn teleport_skips_the_safeguard() {
        let mut world = CollisionWorld::new();
        world.add_static(
            Transform::from_translation(Vec3::new(2.0, 0.0, 0.0)),
            ColliderShape::Cuboid {
                half_extents: Vec3::new(0.05, 5.0, 5.0),
            },
            CollisionGroup::Static,
        );
        let mut controller = controller_at(Point3::origin());
        controller.disable_clamping();
        controller.teleport(Point3::new(5.0, 0.0, 0.0));
        controller.tick(&mut world, 0.02, idle);
        assert_eq!(controller.position(), Point3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn ignored_colliders_do_not_push() {
        let mut world = floor_world();
        let (_, boulder) = world.add_static(
            Transform::from_translation(Vec3::new(0.8, 1.0, 0.0)),
            ColliderShape::Sphere { radius: 0.6 },
            CollisionGroup::Static,
        );
        let start = Point3::new(0.0, TINY_TOLERANCE, 0.0);
        let mut controller = controller_at(start);
        controller.ignore_collider(boulder);
        controller.ignore_collider(boulder);
        assert_eq!(controller.ignored_colliders(), &[boulder]);
        controller.tick(&mut world, 0.02, idle);
        assert!(controller.collision_data().is_empty());
        assert!((controller.position() - start).norm() < 1.0e-3);
        assert_eq!(world.collider_group(boulder), Some(CollisionGroup::Static));

        controller.remove_ignored_collider(boulder);
        controller.tick(&mut world, 0.02, idle);
        assert!(!controller.collision_data().is_empty());
    }

    /// Steep 50° plane rising toward +x, with the agent a little above it.
    fn steep_slope() -> (CollisionWorld, Controller, Point3, Vec3) {
        let mut world = CollisionWorld::new();
        world.add_static(
            pose_from_axis_angle(Vec3::zeros(), Vec3::z(), 50.0),
            ColliderShape::Plane,
            CollisionGroup::Static,
        );
        let start = Point3::new(0.0, 1.0, 0.0);
        let controller = controller_at(start);
        let along = Vec3::new(50.0f32.to_radians().cos(), 50.0f32.to_radians().sin(), 0.0) * 0.5;
        (world, controller, start, along)
    }

    #[test]
    fn slope_limit_undoes_uphill_movement() {
        let (mut world, mut controller, start, uphill) = steep_slope();
        controller.initial_position = start;
        controller.translate(uphill);
        controller.probe_ground(&mut world);
        assert!(angle_deg(&controller.ground().primary_normal(), &Vec3::y()) > 45.0);

        assert!(controller.slope_limit(&world));
        assert_relative_eq!(controller.position(), start, epsilon = 1.0e-3);
    }

    #[test]
    fn slope_limit_keeps_motion_across_the_slope() {
        let (mut world, mut controller, start, uphill) = steep_slope();
        let sideways = Vec3::new(0.0, 0.0, 1.0);
        controller.initial_position = start;
        controller.translate(uphill + sideways);
        controller.probe_ground(&mut world);

        assert!(controller.slope_limit(&world));
        assert_relative_eq!(controller.position(), start + sideways, epsilon = 1.0e-3);
    }

    #[test]
    fn slope_limit_allows_downhill_and_gentle_ground() {
        let (mut world, mut controller, start, uphill) = steep_slope();
        controller.initial_position = start;
        controller.translate(-uphill);
        controller.probe_ground(&mut world);
        assert!(!controller.slope_limit(&world));
        assert_relative_eq!(controller.position(), start - uphill);

        let (mut world, mut controller, start, uphill) = steep_slope();
        let slope_entity = EntityId(0);
        world.set_collision_type(
            slope_entity,
            CollisionType {
                stand_angle: 60.0,
                slope_limit: 60.0,
            },
        );
        controller.initial_position = start;
        controller.translate(uphill);
        controller.probe_ground(&mut world);
        assert_eq!(controller.ground().ground_entity(), Some(slope_entity));
        assert!(!controller.slope_limit(&world));
    }

    #[test]
    fn capsule_sweep_stops_at_obstacles() {
        let (mut world, mut controller, start, uphill) = steep_slope();
        controller.settings.slope_limit_capsule_sweep = true;
        // A post between the start and the agent blocks part of the way back.
        world.add_static(
            Transform::from_translation(Vec3::new(0.3, 1.0, 0.0)),
            ColliderShape::Cuboid {
                half_extents: Vec3::new(0.1, 3.0, 3.0),
            },
            CollisionGroup::Static,
        );
        controller.initial_position = start;
        controller.translate(uphill * 4.0);
        controller.probe_ground(&mut world);
        let before = controller.position();
        assert!(controller.slope_limit(&world));
        let moved = controller.position() - before;
        // Moved back down the slope, but not all the way to the start.
        assert!(moved.x < 0.0);
        assert!(controller.position().x > start.x);
    }

    #[test]
    fn update_modes() {
        let mut world = floor_world();
        let settings = ControllerSettings {
            update_mode: UpdateMode::Fixed { updates_per_second: 40 },
            ..Default::default()
        };
        let mut fixed = Controller::new(settings, Point3::origin()).unwrap();
        let mut deltas = Vec::new();
        let ticks = fixed.update(&mut world, 0.06, |c, dt| {
            deltas.push(dt);
            assert_eq!(c.delta_time(), dt);
        });
        assert_eq!(ticks, 3);
        assert_eq!(deltas.len(), 3);

        let settings = ControllerSettings {
            update_mode: UpdateMode::Manual,
            ..Default::default()
        };
        let mut manual = Controller::new(settings, Point3::origin()).unwrap();
        assert_eq!(manual.update(&mut world, 0.06, idle), 0);

        let mut variable = controller_at(Point3::origin());
        assert_eq!(variable.update(&mut world, 0.06, idle), 1);
        assert_relative_eq!(variable.delta_time(), 0.06);
    }
}
