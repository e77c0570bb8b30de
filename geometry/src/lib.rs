mod vector;
mod affine;

pub use vector::{Point, Vector, angle_between, unit_or_none};
pub use affine::Affine;
