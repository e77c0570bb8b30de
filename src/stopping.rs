//! Deciding, at each point visited by a propagation pass, whether the pass
//! may continue.

/// Verdict on a single position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StopStatus {
    /// Keep stepping
    Continue,
    /// End the pass: the streamline ended in a plausible place
    StopValid,
    /// End the pass: the position lies outside the stopping field
    StopInvalid,
}

/// Classification of positions. Implementations must be pure functions of
/// the position: they are shared between all worker threads.
pub trait StoppingCriterion: Sync {
    fn check(&self, p: &Point) -> StopStatus;
}

// ----- Thresholded scalar field ----------------------------------------------

/// Continue wherever the field is at least `threshold`.
#[derive(Clone, Debug)]
pub struct ThresholdCriterion {
    field: ScalarVolume,
    threshold: Intensityf32,
    interpolation: Interpolation,
}

impl ThresholdCriterion {

    pub fn new(field: ScalarVolume, threshold: Intensityf32, interpolation: Interpolation) -> Result<Self> {
        if !threshold.is_finite() {
            return Err(TractError::invalid_parameter("threshold", format!("{threshold} is not finite")))
        }
        Ok(Self { field, threshold, interpolation })
    }

    pub fn field(&self) -> &ScalarVolume { &self.field }
    pub fn threshold(&self) -> Intensityf32 { self.threshold }
}

impl StoppingCriterion for ThresholdCriterion {
    fn check(&self, p: &Point) -> StopStatus {
        match self.field.sample(p, self.interpolation) {
            None                           => StopStatus::StopInvalid,
            Some(v) if v >= self.threshold => StopStatus::Continue,
            Some(_)                        => StopStatus::StopValid,
        }
    }
}

// ----- Binary mask -----------------------------------------------------------

/// Continue inside the non-zero voxels of `mask` (nearest-voxel lookup).
#[derive(Clone, Debug)]
pub struct BinaryCriterion {
    mask: ScalarVolume,
}

impl BinaryCriterion {
    pub fn new(mask: ScalarVolume) -> Self { Self { mask } }
}

impl StoppingCriterion for BinaryCriterion {
    fn check(&self, p: &Point) -> StopStatus {
        match self.mask.nearest(p) {
            None               => StopStatus::StopInvalid,
            Some(v) if v > 0.0 => StopStatus::Continue,
            Some(_)            => StopStatus::StopValid,
        }
    }
}

// ----- Imports ------------------------------------------------------------------------------------------
use crate::{Intensityf32, Point};
use crate::volume::{Interpolation, ScalarVolume};
use crate::error::{Result, TractError};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Affine, grid::Grid};
    use rstest::rstest;

    // FA rising along x: 0.0, 0.1, 0.2, 0.3, 0.4
    fn ramp() -> ScalarVolume {
        let grid = Grid::new([5, 1, 1], Affine::identity()).unwrap();
        ScalarVolume::new(grid, (0..5).map(|i| i as f32 / 10.0).collect()).unwrap()
    }

    #[rstest(/**/   x  , interpolation            , expected,
             case( 4.0 , Interpolation::Trilinear, StopStatus::Continue   ),
             case( 2.0 , Interpolation::Trilinear, StopStatus::Continue   ),
             case( 1.5 , Interpolation::Trilinear, StopStatus::StopValid  ),
             case( 1.5 , Interpolation::Nearest  , StopStatus::Continue   ),
             case( 0.0 , Interpolation::Nearest  , StopStatus::StopValid  ),
             case(-0.6 , Interpolation::Nearest  , StopStatus::StopInvalid),
             case( 4.6 , Interpolation::Trilinear, StopStatus::StopInvalid),
    )]
    fn threshold_on_ramp(x: f32, interpolation: Interpolation, expected: StopStatus) {
        let criterion = ThresholdCriterion::new(ramp(), 0.2, interpolation).unwrap();
        assert_eq!(criterion.check(&Point::new(x, 0.0, 0.0)), expected);
    }

    #[test]
    fn nan_threshold_rejected() {
        assert!(ThresholdCriterion::new(ramp(), f32::NAN, Interpolation::Nearest).is_err());
    }

    #[test]
    fn binary_mask() {
        let grid = Grid::new([3, 1, 1], Affine::identity()).unwrap();
        let mask = ScalarVolume::new(grid, vec![1.0, 0.0, 1.0]).unwrap();
        let criterion = BinaryCriterion::new(mask);
        assert_eq!(criterion.check(&Point::new( 0.0, 0.0, 0.0)), StopStatus::Continue);
        assert_eq!(criterion.check(&Point::new( 1.2, 0.0, 0.0)), StopStatus::StopValid);
        assert_eq!(criterion.check(&Point::new( 9.0, 0.0, 0.0)), StopStatus::StopInvalid);
    }
}
