pub use units::todo::{Lengthf32, Weightf32, Intensityf32, Diffusivityf32, Ratiof32};
pub use units::{Length, Angle, Ratio};

pub use geometry::{Point, Vector, Affine};

pub use crate::index::{BoxDim_u, Index1_u, Index3_u};
