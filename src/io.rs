//! On-disk formats: raw `f32` volumes in, TrackVis streamlines out.

pub mod raw;
pub mod trk;
