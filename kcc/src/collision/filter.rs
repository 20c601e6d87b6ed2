//! Collision groups, query filters and the scoped group override.
//!
//! A collider belongs to exactly one [`CollisionGroup`] and carries a mask of the
//! groups allowed to query it. A [`QueryFilter`] names the querying agent's own
//! group plus the set of groups it wants to see.
//!
//! Ignored colliders are hidden from walkable queries by moving them into the
//! [`CollisionGroup::Scratch`] group for the duration of a query. [`GroupOverride`]
//! performs that swap and restores the previous groups when it is dropped, on
//! every exit path.

use std::ops::{Deref, DerefMut};

use crate::mask::Mask;
use crate::mask_flags;

use super::backend::CollisionBackend;
use super::types::{Collider, ColliderHandle};

mask_flags! {
    /// Collider category. `Scratch` is reserved for temporarily hidden colliders.
    pub enum CollisionGroup: u32 {
        Default,
        Static,
        Kinematic,
        Debris,
        SensorTrigger,
        Character,
        Custom1,
        Custom2,
        Custom3,
        Custom4,
        Custom5,
        Custom6,
        Custom7,
        Custom8,
        Custom9,
        Scratch,
    }
}

/// A set of collision groups.
pub type GroupMask = Mask<CollisionGroup>;

/// Group/flag pair used by every backend query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryFilter {
    /// The querying agent's own category.
    pub group: CollisionGroup,
    /// Categories the query interacts with.
    pub flags: GroupMask,
}

impl QueryFilter {
    pub fn new(group: CollisionGroup, flags: GroupMask) -> Self {
        Self { group, flags }
    }

    /// Walkable geometry: default and static colliders.
    pub fn walkable() -> Self {
        Self::new(
            CollisionGroup::Default,
            GroupMask::of(&[CollisionGroup::Default, CollisionGroup::Static]),
        )
    }

    /// Only colliders currently parked in `group`.
    pub fn only(group: CollisionGroup) -> Self {
        Self::new(CollisionGroup::Default, GroupMask::of(&[group]))
    }

    #[inline]
    pub fn matches(&self, collider: &Collider) -> bool {
        self.flags.contains(collider.group) && collider.mask.contains(self.group)
    }
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self::walkable()
    }
}

/// Moves a set of colliders into another group until dropped.
///
/// Dereferences to the wrapped backend so queries can run while the override is
/// active. Overrides nest: an inner override on the same collider restores the
/// outer override's group, the outer one restores the original.
pub struct GroupOverride<'a, B: CollisionBackend + ?Sized> {
    backend: &'a mut B,
    saved: Vec<(ColliderHandle, CollisionGroup)>,
}

impl<'a, B: CollisionBackend + ?Sized> GroupOverride<'a, B> {
    pub fn new<I>(backend: &'a mut B, handles: I, group: CollisionGroup) -> Self
    where
        I: IntoIterator<Item = ColliderHandle>,
    {
        let mut saved = Vec::new();
        for handle in handles {
            match backend.collider_group(handle) {
                Some(previous) => {
                    backend.set_collider_group(handle, group);
                    saved.push((handle, previous));
                }
                None => log::warn!("group override skipped unknown collider {handle:?}"),
            }
        }
        Self { backend, saved }
    }

}

impl<B: CollisionBackend + ?Sized> Deref for GroupOverride<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        &*self.backend
    }
}

impl<B: CollisionBackend + ?Sized> DerefMut for GroupOverride<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        &mut *self.backend
    }
}

impl<B: CollisionBackend + ?Sized> Drop for GroupOverride<'_, B> {
    fn drop(&mut self) {
        for (handle, previous) in self.saved.drain(..).rev() {
            self.backend.set_collider_group(handle, previous);
        }
    }
}
