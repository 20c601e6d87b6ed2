pub mod bsp;
pub mod collision;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod mask;
pub mod motion;
pub mod state_machine;
pub mod surface;
pub mod timestep;

pub use collision::{
    CollisionBackend, CollisionGroup, CollisionType, CollisionWorld, ColliderHandle, ColliderShape, EntityId,
    GroupMask, Point3, QueryFilter, Transform, TriangleMesh, Vec3,
};
pub use controller::{
    CollisionContact, CollisionSphere, Controller, ControllerSettings, GroundHit, GroundProbe, SphereSet,
    UpdateMode,
};
pub use error::KccError;
pub use motion::{MoveTowardParams, MoveTowardResult, compute_desired_translation, walk_toward};
pub use state_machine::{StateHandlers, StateMachine, StateTag};
pub use timestep::FixedStepper;
