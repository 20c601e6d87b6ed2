//! In-process collision world used by the sandbox and the tests.
//!
//! Entities carry world transforms; colliders hang off entities with a local
//! pose. Moving an entity rebuilds the broad phase, which keeps queries exact for
//! moving platforms at the cost of an O(n log n) rebuild per move.
//!
//! Determinism
//! - Collider handles are assigned in insertion order.
//! - Candidates are visited in handle order and the first of equally distant hits wins.

use std::collections::{BTreeMap, HashMap};

use rapier3d::parry::shape::{self as pshape, Shape};

use super::backend::CollisionBackend;
use super::broad::{WorldAccel, build_world_accel, query_candidates, swept_capsule_aabb, swept_sphere_aabb};
use super::filter::{CollisionGroup, GroupMask, QueryFilter};
use super::narrow_phase::{self, NarrowHit};
use super::types::{
    Collider, ColliderHandle, ColliderShape, CollisionType, EntityId, Hit, Iso, Point3, Transform, Vec3,
};

pub struct CollisionWorld {
    entities: BTreeMap<EntityId, Transform>,
    collision_types: HashMap<EntityId, CollisionType>,
    colliders: Vec<Collider>,
    accel: WorldAccel,
    next_entity: u32,
}

impl Default for CollisionWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionWorld {
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            collision_types: HashMap::new(),
            colliders: Vec::new(),
            accel: build_world_accel(std::iter::empty()),
            next_entity: 0,
        }
    }

    pub fn spawn_entity(&mut self, transform: Transform) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        self.entities.insert(id, transform);
        id
    }

    /// Attach a collider that every group may query.
    pub fn add_collider(
        &mut self,
        entity: EntityId,
        local_pose: Transform,
        shape: ColliderShape,
        group: CollisionGroup,
    ) -> ColliderHandle {
        self.add_collider_with_mask(entity, local_pose, shape, group, GroupMask::all())
    }

    pub fn add_collider_with_mask(
        &mut self,
        entity: EntityId,
        local_pose: Transform,
        shape: ColliderShape,
        group: CollisionGroup,
        mask: GroupMask,
    ) -> ColliderHandle {
        if !self.entities.contains_key(&entity) {
            log::warn!("collider attached to unknown entity {entity:?}, using identity transform");
            self.entities.insert(entity, Transform::identity());
        }
        let handle = ColliderHandle(self.colliders.len() as u32);
        self.colliders.push(Collider {
            entity,
            local_pose,
            shape,
            group,
            mask,
        });
        self.rebuild_accel();
        handle
    }

    /// Spawn an entity with a single collider, the common case for static props.
    pub fn add_static(
        &mut self,
        transform: Transform,
        shape: ColliderShape,
        group: CollisionGroup,
    ) -> (EntityId, ColliderHandle) {
        let entity = self.spawn_entity(transform);
        let handle = self.add_collider(entity, Transform::identity(), shape, group);
        (entity, handle)
    }

    pub fn set_entity_transform(&mut self, entity: EntityId, transform: Transform) {
        match self.entities.get_mut(&entity) {
            Some(current) => *current = transform,
            None => {
                log::warn!("set_entity_transform on unknown entity {entity:?}");
                return;
            }
        }
        self.rebuild_accel();
    }

    pub fn translate_entity(&mut self, entity: EntityId, delta: Vec3) {
        if let Some(mut transform) = self.entities.get(&entity).copied() {
            transform.translation += delta;
            self.set_entity_transform(entity, transform);
        }
    }

    pub fn set_collision_type(&mut self, entity: EntityId, collision_type: CollisionType) {
        self.collision_types.insert(entity, collision_type);
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    fn slot_iso(&self, slot: usize) -> Option<Iso> {
        let collider = self.colliders.get(slot)?;
        let entity = self.entities.get(&collider.entity)?;
        Some(entity.compose(&collider.local_pose).iso())
    }

    fn rebuild_accel(&mut self) {
        let entries: Vec<(usize, &ColliderShape, Iso)> = self
            .colliders
            .iter()
            .enumerate()
            .filter_map(|(slot, c)| self.slot_iso(slot).map(|iso| (slot, &c.shape, iso)))
            .collect();
        self.accel = build_world_accel(entries);
    }

    /// Closest narrow-phase hit among `candidates` that pass `filter`.
    fn closest_hit(
        &self,
        candidates: Vec<usize>,
        filter: &QueryFilter,
        mut test: impl FnMut(&ColliderShape, &Iso) -> Option<NarrowHit>,
    ) -> Option<Hit> {
        let mut best: Option<Hit> = None;
        for slot in candidates {
            let collider = &self.colliders[slot];
            if !filter.matches(collider) {
                continue;
            }
            let Some(iso) = self.slot_iso(slot) else {
                continue;
            };
            let Some(hit) = test(&collider.shape, &iso) else {
                continue;
            };
            if best.is_none_or(|b| hit.distance < b.distance) {
                best = Some(Hit {
                    collider: ColliderHandle(slot as u32),
                    entity: collider.entity,
                    point: hit.point,
                    normal: hit.normal,
                    distance: hit.distance,
                });
            }
        }
        best
    }

    fn sweep(
        &self,
        moving: &dyn Shape,
        start: &Iso,
        region_start: (&Point3, &Point3),
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter,
    ) -> Option<Hit> {
        let dir = direction.try_normalize(1.0e-12)?;
        if max_distance <= 0.0 {
            return None;
        }
        let region = swept_capsule_aabb(region_start.0, region_start.1, radius, &dir, max_distance);
        let candidates = query_candidates(&self.accel, &region);
        self.closest_hit(candidates, filter, |shape, iso| {
            narrow_phase::cast_shape(moving, start, &dir, max_distance, shape, iso)
        })
    }
}

impl CollisionBackend for CollisionWorld {
    fn raycast(&self, origin: Point3, direction: Vec3, max_distance: f32, filter: &QueryFilter) -> Option<Hit> {
        let dir = direction.try_normalize(1.0e-12)?;
        if max_distance <= 0.0 {
            return None;
        }
        let region = swept_sphere_aabb(&origin, 0.0, &dir, max_distance);
        let candidates = query_candidates(&self.accel, &region);
        self.closest_hit(candidates, filter, |shape, iso| {
            narrow_phase::cast_ray(shape, iso, &origin, &dir, max_distance)
        })
    }

    fn sphere_sweep(
        &self,
        center: Point3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter,
    ) -> Option<Hit> {
        let ball = pshape::Ball::new(radius);
        let start = Transform::from_translation(center.coords).iso();
        self.sweep(&ball, &start, (&center, &center), radius, direction, max_distance, filter)
    }

    fn sphere_sweep_collider(
        &self,
        handle: ColliderHandle,
        center: Point3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<Hit> {
        let dir = direction.try_normalize(1.0e-12)?;
        if max_distance <= 0.0 {
            return None;
        }
        let slot = handle.0 as usize;
        let collider = self.colliders.get(slot)?;
        let iso = self.slot_iso(slot)?;
        let ball = pshape::Ball::new(radius);
        let start = Transform::from_translation(center.coords).iso();
        let hit = narrow_phase::cast_shape(&ball, &start, &dir, max_distance, &collider.shape, &iso)?;
        Some(Hit {
            collider: handle,
            entity: collider.entity,
            point: hit.point,
            normal: hit.normal,
            distance: hit.distance,
        })
    }

    fn capsule_sweep(
        &self,
        a: Point3,
        b: Point3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter,
    ) -> Option<Hit> {
        let (start, half_height) = narrow_phase::capsule_between(&a, &b);
        let capsule = pshape::Capsule::new_y(half_height, radius);
        self.sweep(&capsule, &start, (&a, &b), radius, direction, max_distance, filter)
    }

    fn overlap_sphere(&self, center: Point3, radius: f32, filter: &QueryFilter) -> Vec<ColliderHandle> {
        let ball = pshape::Ball::new(radius);
        let at = Transform::from_translation(center.coords).iso();
        let region = swept_sphere_aabb(&center, radius, &Vec3::zeros(), 0.0);
        query_candidates(&self.accel, &region)
            .into_iter()
            .filter(|&slot| {
                let collider = &self.colliders[slot];
                filter.matches(collider)
                    && self
                        .slot_iso(slot)
                        .is_some_and(|iso| narrow_phase::intersects(&ball, &at, &collider.shape, &iso))
            })
            .map(|slot| ColliderHandle(slot as u32))
            .collect()
    }

    fn collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.colliders.get(handle.0 as usize)
    }

    fn collider_pose(&self, handle: ColliderHandle) -> Option<Transform> {
        let collider = self.collider(handle)?;
        let entity = self.entities.get(&collider.entity)?;
        Some(entity.compose(&collider.local_pose))
    }

    fn collider_group(&self, handle: ColliderHandle) -> Option<CollisionGroup> {
        self.collider(handle).map(|c| c.group)
    }

    fn set_collider_group(&mut self, handle: ColliderHandle, group: CollisionGroup) {
        match self.colliders.get_mut(handle.0 as usize) {
            Some(collider) => collider.group = group,
            None => log::warn!("set_collider_group on unknown collider {handle:?}"),
        }
    }

    fn entity_transform(&self, entity: EntityId) -> Option<Transform> {
        self.entities.get(&entity).copied()
    }

    fn collision_type(&self, entity: EntityId) -> CollisionType {
        self.collision_types.get(&entity).copied().unwrap_or_default()
    }
}
