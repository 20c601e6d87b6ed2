use crate::collision::filter::QueryFilter;
use crate::collision::types::{Point3, Vec3};
use crate::collision::settings::{
    DEFAULT_FIXED_UPDATES_PER_SECOND, DEFAULT_RADIUS, DEFAULT_SPHERE_OFFSETS, MAX_PUSHBACK_DEPTH,
};
use crate::error::KccError;

/// One sphere of the agent's collision stack.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionSphere {
    /// Distance along the agent's up axis from its origin (meters).
    pub offset: f32,
    pub is_feet: bool,
    pub is_head: bool,
}

impl CollisionSphere {
    pub const fn new(offset: f32, is_feet: bool, is_head: bool) -> Self {
        Self {
            offset,
            is_feet,
            is_head,
        }
    }

    /// World center of this sphere for an agent at `origin`. Every sphere except
    /// the feet is scaled by `height_scale`.
    #[inline]
    pub fn world_position(&self, origin: &Point3, up: &Vec3, height_scale: f32) -> Point3 {
        let scale = if self.is_feet { 1.0 } else { height_scale };
        origin + up * (self.offset * scale)
    }
}

/// Validated, ordered sphere stack with the feet and head located.
#[derive(Clone, Debug, PartialEq)]
pub struct SphereSet {
    spheres: Vec<CollisionSphere>,
    feet: usize,
    head: usize,
}

impl SphereSet {
    pub fn new(spheres: Vec<CollisionSphere>) -> Result<Self, KccError> {
        if spheres.is_empty() {
            return Err(KccError::NoSpheres);
        }
        let mut feet = None;
        let mut head = None;
        for (i, sphere) in spheres.iter().enumerate() {
            if sphere.is_feet {
                if feet.replace(i).is_some() {
                    return Err(KccError::DuplicateFeet);
                }
            }
            if sphere.is_head {
                if head.replace(i).is_some() {
                    return Err(KccError::DuplicateHead);
                }
            }
        }
        Ok(Self {
            feet: feet.ok_or(KccError::MissingFeet)?,
            head: head.ok_or(KccError::MissingHead)?,
            spheres,
        })
    }

    pub fn spheres(&self) -> &[CollisionSphere] {
        &self.spheres
    }

    pub fn feet(&self) -> CollisionSphere {
        self.spheres[self.feet]
    }

    pub fn head(&self) -> CollisionSphere {
        self.spheres[self.head]
    }
}

impl Default for SphereSet {
    fn default() -> Self {
        let [feet, body, head] = DEFAULT_SPHERE_OFFSETS;
        Self {
            spheres: vec![
                CollisionSphere::new(feet, true, false),
                CollisionSphere::new(body, false, false),
                CollisionSphere::new(head, false, true),
            ],
            feet: 0,
            head: 2,
        }
    }
}

/// How `Controller::update` turns frame time into ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateMode {
    /// One tick per frame with the frame's delta.
    Variable,
    /// Whole fixed steps, then one partial step for what is left.
    Fixed { updates_per_second: u32 },
    /// `update` does nothing; the host calls `tick` itself.
    Manual,
}

impl UpdateMode {
    /// Fixed mode at the default rate.
    pub const fn fixed_default() -> Self {
        UpdateMode::Fixed {
            updates_per_second: DEFAULT_FIXED_UPDATES_PER_SECOND,
        }
    }
}

/// Per-agent controller configuration.
///
/// Notes
/// - Values are expressed in meters and degrees.
/// - `Default` matches the constants in `collision::settings`.
#[derive(Clone, Debug, PartialEq)]
pub struct ControllerSettings {
    /// Radius shared by every collision sphere (meters).
    pub radius: f32,

    /// Scale applied to the offsets of every non-feet sphere.
    pub height_scale: f32,

    /// Ordered sphere stack; exactly one feet and one head.
    pub spheres: SphereSet,

    /// Which colliders count as walkable for probing and pushback.
    pub walkable: QueryFilter,

    /// Snap the agent down onto the probed ground every tick.
    pub ground_clamping: bool,

    /// Carry the agent along with the ground (or explicit clamp target) when it moves.
    pub clamp_to_moving_ground: bool,

    /// Stop the agent from walking up slopes steeper than the ground's slope limit.
    pub slope_limiting: bool,

    /// Use a feet-to-head capsule (instead of a feet sphere) for the slope-limit sweep.
    pub slope_limit_capsule_sweep: bool,

    /// Pushback recursion cap.
    pub max_pushback_depth: u32,

    pub update_mode: UpdateMode,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            height_scale: 1.0,
            spheres: SphereSet::default(),
            walkable: QueryFilter::walkable(),
            ground_clamping: true,
            clamp_to_moving_ground: true,
            slope_limiting: false,
            slope_limit_capsule_sweep: false,
            max_pushback_depth: MAX_PUSHBACK_DEPTH,
            update_mode: UpdateMode::Variable,
        }
    }
}

impl ControllerSettings {
    pub fn validate(&self) -> Result<(), KccError> {
        if !(self.radius > 0.0) {
            return Err(KccError::InvalidRadius(self.radius));
        }
        if let UpdateMode::Fixed { updates_per_second: 0 } = self.update_mode {
            return Err(KccError::InvalidFixedRate);
        }
        Ok(())
    }
}
