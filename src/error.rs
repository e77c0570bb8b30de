//! Errors which abort a tracking run before any seed is processed.
//!
//! Problems local to a single seed or a single propagation pass (degenerate
//! PMF, leaving the volume) are not errors: they end the pass and are
//! reported through `Termination`.

use thiserror::Error;

use crate::BoxDim_u;

#[derive(Error, Debug)]
pub enum TractError {

    #[error("volume data has {actual} values, but dimensions {dims:?} require {expected}")]
    ShapeMismatch { dims: BoxDim_u, expected: usize, actual: usize },

    #[error("grid dimensions must all be non-zero, got {0:?}")]
    EmptyGrid(BoxDim_u),

    #[error("affine transform is singular, non-finite or not affine")]
    InvalidAffine,

    #[error("sphere contains no usable directions")]
    EmptySphere,

    #[error("invalid direction on sphere at vertex {0}")]
    InvalidSphereVertex(usize),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("TRK format: {0}")]
    Trk(#[from] binrw::Error),

    #[error("configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl TractError {
    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter { name, reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, TractError>;
