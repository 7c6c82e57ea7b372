use thiserror::Error;

/// Top-level error type for the nurbline tessellation engine.
#[derive(Debug, Error)]
pub enum NurblineError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Tessellation(#[from] TessellationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors related to curve definitions and their evaluation.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("{what} index {index} is out of range (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("homogeneous weight vanishes at u = {parameter}")]
    ZeroWeight { parameter: f64 },
}

/// Errors related to tessellation.
#[derive(Debug, Error)]
pub enum TessellationError {
    #[error("invalid tessellation parameters: {0}")]
    InvalidParameters(String),

    #[error("screen-space subdivision requires a view transform")]
    MissingViewTransform,

    #[error("failed to allocate {requested} tessellation slots")]
    AllocationFailed { requested: usize },

    #[error("tessellation exceeded the vertex limit of {limit}")]
    VertexLimitExceeded { limit: usize },
}

/// Errors related to the geometry store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("geometry is not a {expected}")]
    TypeMismatch { expected: &'static str },
}

/// Convenience type alias for results using [`NurblineError`].
pub type Result<T> = std::result::Result<T, NurblineError>;
