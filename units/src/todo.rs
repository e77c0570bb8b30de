/// Units which are simply type aliases for `f32` rather than having an
/// implementation as a `uom` `Quantity`.
///
/// These are used in the inner loops of tracking (interpolation, sampling,
/// stepping), where the arithmetic is done on `nalgebra` vectors whose
/// components are plain floats, but we still want some clues in the source as
/// to what they represent.

pub type Lengthf32      = f32; // mm
pub type Weightf32      = f32; // probability mass, ODF amplitude
pub type Intensityf32   = f32; // voxel value of a scalar map
pub type Diffusivityf32 = f32; // mm^2 / s
pub type Ratiof32       = f32; // dimensionless, e.g. FA
