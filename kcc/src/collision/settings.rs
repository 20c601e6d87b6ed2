/*!
Controller tolerances and default tuning.

These constants centralize the parameters used by the ground prober, the
pushback resolver and the tick orchestrator. `ControllerSettings::default()`
is built from them; per-agent overrides go through that struct.

Notes
- Distances are in meters, angles in degrees unless the name says otherwise.
- Favor practical world-space tolerances over machine epsilon for robust behavior.
*/

/// Offset applied to probe origins and subtracted from probe distances (meters).
pub const TOLERANCE: f32 = 0.05;

/// Smaller epsilon used for flat-ground detection and auxiliary ray offsets (meters).
pub const TINY_TOLERANCE: f32 = 0.01;

/// Maximum length of "unbounded" probe rays and normal re-sweeps (meters).
pub const CAST_DISTANCE: f32 = 10_000.0;

/// Recursion cap for the pushback resolver.
pub const MAX_PUSHBACK_DEPTH: u32 = 3;

/// Stand angle applied to entities without a registered collision type.
pub const DEFAULT_STAND_ANGLE_DEG: f32 = 40.0;

/// Slope limit applied to entities without a registered collision type.
pub const DEFAULT_SLOPE_LIMIT_DEG: f32 = 40.0;

/// Surface angle at which the allowed steady-ground ratio saturates.
pub const STEADY_GROUND_MAX_ANGLE_DEG: f32 = 60.0;

/// Allowed center-distance ratio (of radius) on perfectly flat ground.
pub const STEADY_GROUND_MIN_RATIO: f32 = 0.50;

/// Allowed center-distance ratio (of radius) at the saturation angle.
pub const STEADY_GROUND_MAX_RATIO: f32 = 0.85;

/// Rotation applied to the near-sample direction to get the far sample (degrees).
pub const FAR_SAMPLE_ROTATION_DEG: f32 = -80.0;

/// Scale applied to the rotated near-sample direction for the far sample.
pub const FAR_SAMPLE_SCALE: f32 = 3.0;

/// Fraction of the radius kept between the agent and a tunnelling hit.
pub const TUNNEL_SNAP_EXTENT: f32 = 0.95;

/// Default agent radius (meters).
pub const DEFAULT_RADIUS: f32 = 0.5;

/// Default sphere offsets along the up axis: feet, body, head (meters).
pub const DEFAULT_SPHERE_OFFSETS: [f32; 3] = [0.5, 1.0, 1.5];

/// Default fixed updates per second when running a fixed time step.
pub const DEFAULT_FIXED_UPDATES_PER_SECOND: u32 = 40;

/// Practical small distance for comparisons (meters).
pub const DIST_EPS: f32 = 1.0e-6;

/// Additional acceptance buffer added to an agent's radius (meters).
/// Keeps `motion` helpers from jittering when extremely close to a target.
pub const ACCEPTANCE_BUFFER: f32 = 0.05;

/// Gravity magnitude in meters per second squared (positive value).
pub const GRAVITY_MPS2: f32 = 9.81;

/// Default walking speed in meters per second.
pub const DEFAULT_MOVEMENT_SPEED: f32 = 5.0;

/// Distance from an agent's center at which it has "reached" a target.
#[inline]
pub const fn acceptance_from_radius(radius: f32) -> f32 {
    if radius + ACCEPTANCE_BUFFER < 0.0 {
        0.0
    } else {
        radius + ACCEPTANCE_BUFFER
    }
}

/// Radius of the shrunk ground sweep, see `controller::ground`.
#[inline]
pub const fn shrunk_sweep_radius(radius: f32) -> f32 {
    radius - TOLERANCE * TOLERANCE
}
