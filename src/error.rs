use thiserror::Error;

use crate::model::{IntersectionId, WallId};

/// Top-level error type for the joinery kernel.
#[derive(Debug, Error)]
pub enum JoineryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Dimension(#[from] DimensionError),
}

/// Rejections of a join/split/merge request before anything is mutated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("wall not found: {0}")]
    WallNotFound(WallId),

    #[error("intersection not found: {0}")]
    IntersectionNotFound(IntersectionId),

    #[error("wall {0} referenced twice")]
    SameWall(WallId),

    #[error("point ({x:.3}, {y:.3}) is out of tolerance {tolerance} of the walls")]
    PointOutOfTolerance { x: f64, y: f64, tolerance: f64 },

    #[error("split point lies on an endpoint of wall {0}")]
    SplitAtEndpoint(WallId),

    #[error("walls cannot be merged: {0}")]
    NotMergeable(String),

    #[error("auto-join did not settle within {0} resolutions")]
    NotConverged(usize),
}

/// Errors related to geometric computations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length wall {0}")]
    ZeroLengthWall(WallId),
}

/// Errors raised while committing or reverting a command.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("command is stale: {0}")]
    Stale(String),

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,
}

/// Errors raised by the dimension engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DimensionError {
    #[error("dimension not found")]
    NotFound,

    #[error("dimension is locked")]
    Locked,

    #[error("invalid dimension: {0}")]
    Invalid(String),
}

/// Convenience type alias for results using [`JoineryError`].
pub type Result<T> = std::result::Result<T, JoineryError>;
