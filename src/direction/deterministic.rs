use ordered_float::OrderedFloat;
use rand::Rng;

use crate::{Angle, Point, Ratio, Vector, Weightf32};
use crate::pmf::PmfVolume;
use crate::error::Result;

use super::{DirectionGetter, Restriction};

/// Follows the most probable candidate vertex. The random number generator is
/// accepted, to satisfy the trait, but never used.
pub struct DeterministicMaximum {
    pmf: PmfVolume,
    restriction: Restriction,
}

impl DeterministicMaximum {
    pub fn new(pmf: PmfVolume, max_angle: Angle, pmf_threshold: Ratio) -> Result<Self> {
        Ok(Self { pmf, restriction: Restriction::new(max_angle, pmf_threshold)? })
    }

    fn best(&self, p: &Point, previous: Option<&Vector>, buffer: &mut [Weightf32]) -> Option<Vector> {
        if !self.restriction.candidates(&self.pmf, p, previous, buffer) { return None }
        let (k, _) = buffer.iter()
            .enumerate()
            .max_by_key(|(_, &w)| OrderedFloat(w))?;
        Some(Restriction::oriented(&self.pmf, k, previous))
    }
}

impl DirectionGetter for DeterministicMaximum {

    fn initial_direction<R: Rng + ?Sized>(
        &self, p: &Point, buffer: &mut [Weightf32], _rng: &mut R,
    ) -> Option<Vector> {
        self.best(p, None, buffer)
    }

    fn next_direction<R: Rng + ?Sized>(
        &self, p: &Point, previous: &Vector, buffer: &mut [Weightf32], _rng: &mut R,
    ) -> Option<Vector> {
        self.best(p, Some(previous), buffer)
    }

    fn buffer(&self) -> Vec<Weightf32> { self.pmf.buffer() }

    fn max_angle(&self) -> Angle { self.restriction.max_angle() }
}
