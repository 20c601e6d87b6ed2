//! Geometry primitives used by the surface queries and the controller.
//!
//! All functions are pure. Angles are returned in degrees unless the function
//! name ends in `_rad`.

use nalgebra as na;

use crate::collision::types::{Point3, Quat, Vec3};

/// Closest point on triangle `(a, b, c)` to `p`.
///
/// Ericson, *Real-Time Collision Detection* §5.1.5. Regions are tested in the order
/// A, B, AB, C, AC, BC, face with inclusive comparisons, so a point exactly on a
/// region boundary resolves to the earlier region.
pub fn closest_point_on_triangle(a: &Point3, b: &Point3, c: &Point3, p: &Point3) -> Point3 {
    let ab = b - a;
    let ac = c - a;

    let ap = p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return *a;
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return *b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return *c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

/// Signed distance from `point` to the plane through `plane_point` with `normal`.
#[inline]
pub fn signed_distance_plane_point(normal: &Vec3, plane_point: &Point3, point: &Point3) -> f32 {
    normal.dot(&(point - plane_point))
}

/// True when `point` lies on or above the plane (`>= 0`).
#[inline]
pub fn point_above_plane(normal: &Vec3, plane_point: &Point3, point: &Point3) -> bool {
    signed_distance_plane_point(normal, plane_point, point) >= 0.0
}

/// Orthogonal projection of `point` onto a plane. `normal` must be unit length.
#[inline]
pub fn project_point_on_plane(normal: &Vec3, plane_point: &Point3, point: &Point3) -> Point3 {
    point - normal * signed_distance_plane_point(normal, plane_point, point)
}

/// Projection of `point` onto the infinite line through `line_point` along `line_dir`.
///
/// `line_dir` is used as given; pass a unit vector for a true orthogonal projection.
#[inline]
pub fn project_point_on_line(line_point: &Point3, line_dir: &Vec3, point: &Point3) -> Point3 {
    let t = (point - line_point).dot(line_dir);
    line_point + line_dir * t
}

/// Removes the component of `v` along `normal`. `normal` must be unit length.
#[inline]
pub fn project_vector_on_plane(normal: &Vec3, v: &Vec3) -> Vec3 {
    v - normal * v.dot(normal)
}

/// Angle between two vectors in radians, 0 for degenerate input.
///
/// The cosine is clamped to [-1, 1] so drift past ±1 never produces NaN.
pub fn angle_rad(a: &Vec3, b: &Vec3) -> f32 {
    let denom = (a.norm_squared() * b.norm_squared()).sqrt();
    if denom < 1.0e-15 {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}

/// Angle between two vectors in degrees, 0 for degenerate input.
#[inline]
pub fn angle_deg(a: &Vec3, b: &Vec3) -> f32 {
    angle_rad(a, b).to_degrees()
}

/// Rotation of `angle_deg` degrees about `axis`; identity for a zero axis.
pub fn angle_axis(angle_deg: f32, axis: &Vec3) -> Quat {
    match na::Unit::try_new(*axis, 1.0e-12) {
        Some(axis) => Quat::from_axis_angle(&axis, angle_deg.to_radians()),
        None => Quat::identity(),
    }
}

/// Normalizes `v`, returning zero for a zero-length vector.
#[inline]
pub fn normalize_or_zero(v: &Vec3) -> Vec3 {
    v.try_normalize(1.0e-12).unwrap_or_else(Vec3::zeros)
}

#[inline]
pub fn lerp_clamped(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t.clamp(0.0, 1.0)
}

/// Float comparison tolerant to both absolute and relative error.
#[inline]
pub fn approximately(a: f32, b: f32) -> bool {
    (b - a).abs() < (1.0e-6 * a.abs().max(b.abs())).max(f32::EPSILON * 8.0)
}

/// Step-curve lookup: `values[i]` for the first `bounds[i]` above `t`, else the
/// last value. `values` should be one longer than `bounds`; `None` when it is empty.
pub fn bounded_interpolation(bounds: &[f32], values: &[f32], t: f32) -> Option<f32> {
    bounds
        .iter()
        .zip(values)
        .find(|(bound, _)| t < **bound)
        .map(|(_, value)| *value)
        .or_else(|| values.last().copied())
}

/// Initial vertical speed needed to reach `height` under `gravity`.
#[inline]
pub fn jump_speed(height: f32, gravity: f32) -> f32 {
    (2.0 * height * gravity).max(0.0).sqrt()
}
