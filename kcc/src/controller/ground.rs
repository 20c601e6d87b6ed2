/*!
Ground probing.

Each probe casts one shrunk sphere sweep plus up to four rays below the agent and
stores up to five independent ground samples:

- primary: directly below the feet, corrected to where a full-radius sphere would land
- near:    just inside the primary contact, toward the agent's center
- far:     just outside the primary contact
- flush:   the base of a wall the agent is pressed against
- step:    the landing below a ledge

Every sample is reset at the start of a probe, and absent samples are normal.
[`GroundProbe::is_grounded`] turns the stored samples into a single decision.
*/

use crate::collision::backend::CollisionBackend;
use crate::collision::filter::QueryFilter;
use crate::collision::settings::{
    CAST_DISTANCE, FAR_SAMPLE_ROTATION_DEG, FAR_SAMPLE_SCALE, STEADY_GROUND_MAX_ANGLE_DEG,
    STEADY_GROUND_MAX_RATIO, STEADY_GROUND_MIN_RATIO, TINY_TOLERANCE, TOLERANCE, shrunk_sweep_radius,
};
use crate::collision::types::{ColliderHandle, CollisionType, EntityId, Hit, Point3, Vec3};
use crate::geometry::{
    angle_axis, angle_deg, angle_rad, approximately, lerp_clamped, normalize_or_zero, project_point_on_plane,
    project_vector_on_plane,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundHit {
    pub point: Point3,
    pub normal: Vec3,
    pub distance: f32,
}

impl GroundHit {
    fn from_ray(origin: &Point3, hit: &Hit) -> Self {
        Self {
            point: hit.point,
            normal: hit.normal,
            distance: (hit.point - origin).norm(),
        }
    }
}

/// Everything a probe needs to know about the agent.
#[derive(Clone, Copy, Debug)]
pub struct ProbeInput<'a> {
    /// World position of the feet sphere center.
    pub feet: Point3,
    /// Agent origin (bottom of the sphere stack).
    pub position: Point3,
    pub up: Vec3,
    pub radius: f32,
    pub filter: &'a QueryFilter,
}

impl ProbeInput<'_> {
    #[inline]
    fn down(&self) -> Vec3 {
        -self.up
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroundProbe {
    primary: Option<GroundHit>,
    near: Option<GroundHit>,
    far: Option<GroundHit>,
    step: Option<GroundHit>,
    flush: Option<GroundHit>,
    entity: Option<EntityId>,
    collider: Option<ColliderHandle>,
    collision_type: CollisionType,
    up: Vec3,
    radius: f32,
}

impl Default for GroundProbe {
    fn default() -> Self {
        Self {
            primary: None,
            near: None,
            far: None,
            step: None,
            flush: None,
            entity: None,
            collider: None,
            collision_type: CollisionType::default(),
            up: Vec3::y(),
            radius: 0.0,
        }
    }
}

impl GroundProbe {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self, input: &ProbeInput) {
        self.primary = None;
        self.near = None;
        self.far = None;
        self.step = None;
        self.flush = None;
        self.up = input.up;
        self.radius = input.radius;
    }

    /// Scan the surface below the agent and classify it.
    pub fn probe<B: CollisionBackend + ?Sized>(&mut self, backend: &B, input: &ProbeInput) {
        self.reset(input);
        let up = input.up;
        let down = input.down();
        let sweep_origin = input.feet + up * TOLERANCE;

        // Shrinking the radius keeps the sweep from failing on walls the agent is touching.
        let sweep = backend.sphere_sweep(
            sweep_origin,
            shrunk_sweep_radius(input.radius),
            down,
            CAST_DISTANCE,
            input.filter,
        );

        if let Some(sweep_hit) = sweep {
            self.record_ground(backend, &sweep_hit);
            let collision_type = self.collision_type;

            // The shrunk sphere no longer matches the agent; rebuild the contact at full radius.
            let hit = match simulate_sphere_cast(backend, input, &sweep_hit.normal) {
                Some((hit, distance)) => {
                    self.primary = Some(GroundHit {
                        point: hit.point,
                        normal: hit.normal,
                        distance,
                    });
                    hit
                }
                None => {
                    self.primary = Some(GroundHit {
                        point: sweep_hit.point,
                        normal: sweep_hit.normal,
                        distance: sweep_hit.distance - TOLERANCE,
                    });
                    sweep_hit
                }
            };

            // Perfectly flat ground: no edge, slope or ledge to classify.
            let below = project_point_on_plane(&up, &input.position, &hit.point);
            if (below - input.position).norm() < TINY_TOLERANCE {
                return;
            }

            let to_center = project_vector_on_plane(
                &up,
                &(normalize_or_zero(&(input.position - hit.point)) * TINY_TOLERANCE),
            );
            let away_from_center = angle_axis(FAR_SAMPLE_ROTATION_DEG, &to_center.cross(&up)) * -to_center;

            let near_origin = hit.point + to_center + up * TINY_TOLERANCE;
            let far_origin = hit.point + away_from_center * FAR_SAMPLE_SCALE;

            let near_hit = backend.raycast(near_origin, down, CAST_DISTANCE, input.filter);
            let far_hit = backend.raycast(far_origin, down, CAST_DISTANCE, input.filter);
            self.near = near_hit.as_ref().map(|h| GroundHit::from_ray(&near_origin, h));
            self.far = far_hit.as_ref().map(|h| GroundHit::from_ray(&far_origin, h));

            // Standing on something that counts as a wall: find the ground at its base.
            if angle_deg(&hit.normal, &up) > collision_type.stand_angle {
                let down_slope = down_slope(&hit.normal, &down);
                let flush_origin = hit.point + hit.normal * TINY_TOLERANCE;
                if let Some(flush_hit) = backend.raycast(flush_origin, down_slope, CAST_DISTANCE, input.filter) {
                    if let Some((landing, distance)) = simulate_sphere_cast(backend, input, &flush_hit.normal) {
                        self.flush = Some(GroundHit {
                            point: landing.point,
                            normal: landing.normal,
                            distance,
                        });
                    }
                }
            }

            // On a ledge the face nearest the center is a wall or far below; find the landing.
            if let (Some(near_hit), Some(near)) = (near_hit, self.near) {
                let near_angle = angle_deg(&near.normal, &up);
                if near_angle > collision_type.stand_angle || near.distance > TOLERANCE {
                    let near_type = backend.collision_type(near_hit.entity);
                    if near_angle > near_type.stand_angle {
                        let down_slope = down_slope(&near.normal, &down);
                        self.step = backend
                            .raycast(near_origin, down_slope, CAST_DISTANCE, input.filter)
                            .map(|h| GroundHit::from_ray(&near_origin, &h));
                    } else {
                        self.step = Some(near);
                    }
                }
            }
        } else if let Some(ray_hit) = backend.raycast(sweep_origin, down, CAST_DISTANCE, input.filter) {
            // Usually the agent is clipping a wall; fall back to a ray dressed up as a sweep.
            self.record_ground(backend, &ray_hit);
            self.primary = Some(match simulate_sphere_cast(backend, input, &ray_hit.normal) {
                Some((hit, distance)) => GroundHit {
                    point: hit.point,
                    normal: hit.normal,
                    distance,
                },
                None => GroundHit {
                    point: ray_hit.point,
                    normal: ray_hit.normal,
                    distance: ray_hit.distance - TOLERANCE,
                },
            });
        } else {
            log::error!("no ground found below the agent at {:?}", input.position);
            self.entity = None;
            self.collider = None;
            self.collision_type = CollisionType::default();
        }
    }

    fn record_ground<B: CollisionBackend + ?Sized>(&mut self, backend: &B, hit: &Hit) {
        self.entity = Some(hit.entity);
        self.collider = Some(hit.collider);
        self.collision_type = backend.collision_type(hit.entity);
    }

    /// Ground normal if the agent counts as grounded within `threshold`.
    ///
    /// `position` is the agent's current origin.
    pub fn is_grounded(&self, position: &Point3, threshold: f32) -> Option<Vec3> {
        let primary = self.primary.filter(|p| p.distance <= threshold)?;
        let stand_angle = self.collision_type.stand_angle;

        // Flush against a wall.
        if let Some(far) = self.far {
            if self.angle_to_up(&far.normal) > stand_angle {
                return self
                    .flush
                    .filter(|f| self.angle_to_up(&f.normal) < stand_angle && f.distance < threshold)
                    .map(|f| f.normal);
            }
        }

        // On the edge of a ledge, or on a steep slope.
        if let Some(far) = self.far {
            if !self.on_steady_ground(position, &far.normal, &primary.point) {
                if let Some(near) = self.near {
                    if near.distance < threshold
                        && self.angle_to_up(&near.normal) < stand_angle
                        && !self.on_steady_ground(position, &near.normal, &near.point)
                    {
                        return Some(near.normal);
                    }
                }
                return self
                    .step
                    .filter(|s| s.distance < threshold && self.angle_to_up(&s.normal) < stand_angle)
                    .map(|s| s.normal);
            }
        }

        Some(self.far.map_or(primary.normal, |far| far.normal))
    }

    /// True when `point` is close enough to the agent's center for a surface with
    /// `normal` to hold it. Steeper surfaces allow a wider footprint.
    pub fn on_steady_ground(&self, position: &Point3, normal: &Vec3, point: &Point3) -> bool {
        let angle_ratio = self.angle_to_up(normal) / STEADY_GROUND_MAX_ANGLE_DEG;
        let distance_ratio = lerp_clamped(STEADY_GROUND_MIN_RATIO, STEADY_GROUND_MAX_RATIO, angle_ratio);
        let on_plane = project_point_on_plane(&self.up, position, point);
        (on_plane - position).norm() <= distance_ratio * self.radius
    }

    #[inline]
    fn angle_to_up(&self, v: &Vec3) -> f32 {
        angle_deg(v, &self.up)
    }

    /// Primary ground normal, or up when nothing was found.
    pub fn primary_normal(&self) -> Vec3 {
        self.primary.map_or(self.up, |p| p.normal)
    }

    /// Distance to the primary ground, 0 when nothing was found.
    pub fn distance(&self) -> f32 {
        self.primary.map_or(0.0, |p| p.distance)
    }

    pub fn primary(&self) -> Option<GroundHit> {
        self.primary
    }

    pub fn near(&self) -> Option<GroundHit> {
        self.near
    }

    pub fn far(&self) -> Option<GroundHit> {
        self.far
    }

    pub fn step(&self) -> Option<GroundHit> {
        self.step
    }

    pub fn flush(&self) -> Option<GroundHit> {
        self.flush
    }

    /// Entity owning the ground collider from the last successful probe.
    pub fn ground_entity(&self) -> Option<EntityId> {
        self.entity
    }

    pub fn collider(&self) -> Option<ColliderHandle> {
        self.collider
    }

    pub fn collision_type(&self) -> CollisionType {
        self.collision_type
    }
}

/// Direction pointing down a surface with `normal`.
#[inline]
fn down_slope(normal: &Vec3, down: &Vec3) -> Vec3 {
    normal.cross(down).cross(normal)
}

/// Where a full-radius sphere swept down from the agent would touch a surface
/// with `normal`, approximated with a single ray.
///
/// The ray starts at the agent origin, shifted up-slope by `sin(angle) * radius`
/// and up by `(1 - cos(angle)) * radius`. The returned distance excludes the
/// probe tolerances.
pub fn simulate_sphere_cast<B: CollisionBackend + ?Sized>(
    backend: &B,
    input: &ProbeInput,
    normal: &Vec3,
) -> Option<(Hit, f32)> {
    let up = input.up;
    let down = input.down();
    let angle = angle_rad(normal, &up);
    let mut origin = input.position + up * TOLERANCE;

    if !approximately(angle, 0.0) {
        let horizontal = angle.sin() * input.radius;
        let vertical = (1.0 - angle.cos()) * input.radius;
        let up_slope = -down_slope(normal, &down);
        origin += normalize_or_zero(&project_vector_on_plane(&up, &up_slope)) * horizontal + up * vertical;
    }

    let hit = backend.raycast(origin, down, CAST_DISTANCE, input.filter)?;
    let distance = (hit.point - origin).norm() - (TOLERANCE + TINY_TOLERANCE);
    Some((hit, distance))
}
