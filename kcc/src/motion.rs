//! Desired-translation helpers for movement hooks.
//!
//! These compute how far an agent *wants* to move this tick. They do not collide;
//! apply the result with `Controller::translate` inside the tick's movement hook
//! and let pushback and the ground probe handle the world.

use crate::collision::settings::{DIST_EPS, acceptance_from_radius};
use crate::collision::types::{Point3, Vec3};
use crate::controller::Controller;
use crate::geometry::project_vector_on_plane;

/// Input for [`compute_desired_translation`].
///
/// - Movement stops on the surface of the acceptance sphere around the target.
/// - Within acceptance the translation is zero and `finished` is true.
#[derive(Clone, Copy, Debug)]
pub struct MoveTowardParams {
    /// Current world position of the mover (meters).
    pub current: Point3,
    /// Target world position (meters).
    pub target: Point3,
    /// When set, only motion perpendicular to this axis counts (walking).
    pub planar_up: Option<Vec3>,
    /// Linear speed in meters per second.
    pub speed_mps: f32,
    /// Delta time in seconds.
    pub dt_seconds: f32,
    /// Distance from the target at which the mover is done (meters).
    pub acceptance_radius: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveTowardResult {
    /// Translation to apply this tick, never past the acceptance boundary.
    pub desired_translation: Vec3,
    /// True when the mover is (or will be after this step) within acceptance.
    pub finished: bool,
    /// Distance to the target before moving (planar when `planar_up` is set).
    pub distance_to_target: f32,
}

impl MoveTowardResult {
    fn stay(finished: bool, distance_to_target: f32) -> Self {
        Self {
            desired_translation: Vec3::zeros(),
            finished,
            distance_to_target,
        }
    }
}

/// Translation toward `target` at `speed_mps` over `dt_seconds`, stopping on the
/// acceptance sphere boundary.
pub fn compute_desired_translation(params: MoveTowardParams) -> MoveTowardResult {
    let MoveTowardParams {
        current,
        target,
        planar_up,
        speed_mps,
        dt_seconds,
        acceptance_radius,
    } = params;

    let delta = match planar_up {
        Some(up) => project_vector_on_plane(&up, &(target - current)),
        None => target - current,
    };
    let dist = delta.norm();

    let acceptance = acceptance_radius.max(0.0);
    if dist <= acceptance + DIST_EPS {
        return MoveTowardResult::stay(true, dist);
    }

    let max_step = speed_mps.max(0.0) * dt_seconds.max(0.0);
    if max_step <= DIST_EPS {
        return MoveTowardResult::stay(false, dist);
    }

    let to_boundary = dist - acceptance;
    let step = to_boundary.min(max_step);

    MoveTowardResult {
        desired_translation: delta / dist * step,
        finished: (to_boundary - step).abs() <= DIST_EPS,
        distance_to_target: dist,
    }
}

/// Walk the controller toward `target` on its ground plane, accepting at its radius.
pub fn walk_toward(controller: &Controller, target: Point3, speed_mps: f32, dt_seconds: f32) -> MoveTowardResult {
    compute_desired_translation(MoveTowardParams {
        current: controller.position(),
        target,
        planar_up: Some(controller.up()),
        speed_mps,
        dt_seconds,
        acceptance_radius: acceptance_from_radius(controller.radius()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ControllerSettings;
    use approx::assert_relative_eq;

    fn params(current: Point3, target: Point3) -> MoveTowardParams {
        MoveTowardParams {
            current,
            target,
            planar_up: None,
            speed_mps: 2.0,
            dt_seconds: 0.5,
            acceptance_radius: 0.5,
        }
    }

    #[test]
    fn moves_at_speed_when_far() {
        let result = compute_desired_translation(params(Point3::origin(), Point3::new(10.0, 0.0, 0.0)));
        assert_relative_eq!(result.desired_translation, Vec3::new(1.0, 0.0, 0.0));
        assert!(!result.finished);
        assert_relative_eq!(result.distance_to_target, 10.0);
    }

    #[test]
    fn stops_on_the_acceptance_boundary() {
        let result = compute_desired_translation(params(Point3::origin(), Point3::new(1.2, 0.0, 0.0)));
        assert_relative_eq!(result.desired_translation, Vec3::new(0.7, 0.0, 0.0), epsilon = 1.0e-6);
        assert!(result.finished);
    }

    #[test]
    fn within_acceptance_or_without_speed_stays_put() {
        let inside = compute_desired_translation(params(Point3::origin(), Point3::new(0.3, 0.0, 0.0)));
        assert_eq!(inside.desired_translation, Vec3::zeros());
        assert!(inside.finished);

        let stalled = compute_desired_translation(MoveTowardParams {
            speed_mps: 0.0,
            ..params(Point3::origin(), Point3::new(5.0, 0.0, 0.0))
        });
        assert_eq!(stalled.desired_translation, Vec3::zeros());
        assert!(!stalled.finished);
    }

    #[test]
    fn planar_motion_ignores_height() {
        let result = compute_desired_translation(MoveTowardParams {
            planar_up: Some(Vec3::y()),
            ..params(Point3::origin(), Point3::new(0.0, 7.0, 4.0))
        });
        assert_relative_eq!(result.desired_translation, Vec3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(result.distance_to_target, 4.0);
    }

    #[test]
    fn walk_toward_accepts_at_the_agent_radius() {
        let controller = Controller::new(ControllerSettings::default(), Point3::origin()).unwrap();
        let result = walk_toward(&controller, Point3::new(0.5, 3.0, 0.0), 5.0, 1.0);
        assert!(result.finished);
        assert_eq!(result.desired_translation, Vec3::zeros());
    }
}
