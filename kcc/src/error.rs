use thiserror::Error;

/// Construction-time failures. Runtime degradations (no ground, unsupported
/// collider shape, malformed tree) are logged instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KccError {
    #[error("controller has no collision spheres")]
    NoSpheres,
    #[error("no collision sphere is marked as feet")]
    MissingFeet,
    #[error("no collision sphere is marked as head")]
    MissingHead,
    #[error("more than one collision sphere is marked as feet")]
    DuplicateFeet,
    #[error("more than one collision sphere is marked as head")]
    DuplicateHead,
    #[error("radius must be positive, got {0}")]
    InvalidRadius(f32),
    #[error("mesh index buffer length {0} is not a multiple of 3")]
    MeshIndexCount(usize),
    #[error("mesh index {index} out of range for {vertex_count} vertices")]
    MeshIndexOutOfRange { index: u32, vertex_count: usize },
    #[error("mesh rejected by collision backend: {0}")]
    MeshRejected(String),
    #[error("fixed updates per second must be positive")]
    InvalidFixedRate,
}
