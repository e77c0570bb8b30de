//! Choice of propagation direction from a local PMF.
//!
//! Both getters share the same restriction of the candidate directions:
//!
//! + interpolate the PMF at the current position,
//!
//! + discard vertices whose mass is below `pmf_threshold` times the local
//!   maximum,
//!
//! + if there is an incoming direction, discard vertices further than
//!   `max_angle` from it.
//!
//! ODFs of diffusion are antipodally symmetric, so a vertex and its opposite
//! describe the same fibre orientation: the angle test uses the absolute
//! cosine, and the chosen vertex is flipped to point along the incoming
//! direction.
//!
//! They differ in how one vertex is picked from what remains:
//! `Probabilistic` draws one at random, in proportion to its mass;
//! `DeterministicMaximum` takes the most probable one.

// ----- The trait --------------------------------------------------------------------

pub trait DirectionGetter: Sync {

    /// Direction of the first step away from a seed. All directions are
    /// eligible. `None` if the PMF at `p` is degenerate or `p` is outside the
    /// PMF grid.
    fn initial_direction<R: Rng + ?Sized>(
        &self, p: &Point, buffer: &mut [Weightf32], rng: &mut R,
    ) -> Option<Vector>;

    /// Direction of the next step, within the maximum angle of `previous`.
    fn next_direction<R: Rng + ?Sized>(
        &self, p: &Point, previous: &Vector, buffer: &mut [Weightf32], rng: &mut R,
    ) -> Option<Vector>;

    /// Scratch space for the methods above. Allocating these anew for each
    /// step had a noticeable cost, so we create one per seed and reuse it.
    fn buffer(&self) -> Vec<Weightf32>;

    /// Largest permitted angle between consecutive steps
    fn max_angle(&self) -> Angle;
}

// ----- Implementations of the trait -----------------------------------------------
pub mod probabilistic;
pub mod deterministic;

pub use probabilistic::Probabilistic;
pub use deterministic::DeterministicMaximum;

// ----- Shared candidate restriction -------------------------------------------------

/// Parameters common to all PMF-driven direction getters
#[derive(Clone, Copy, Debug)]
pub struct Restriction {
    cos_max_angle: f32,
    max_angle: Angle,
    pmf_threshold: f32,
}

// Slack for angles given in degrees, which do not survive the round trip
// through radians exactly
const DEGREE_SLACK: f32 = 1e-3;

impl Restriction {

    /// `max_angle` must lie in `(0°, 90°]`: with antipodal symmetry, larger
    /// angles cannot restrict anything further. `pmf_threshold` must lie in
    /// `[0, 1)`.
    pub fn new(max_angle: Angle, pmf_threshold: Ratio) -> Result<Self> {
        let degrees = degree_(max_angle);
        if !(degrees > 0.0 && degrees <= 90.0 + DEGREE_SLACK) {
            return Err(TractError::invalid_parameter("max_angle", format!("{degrees}° is not in (0°, 90°]")))
        }
        let pmf_threshold = ratio_(pmf_threshold);
        if !(0.0..1.0).contains(&pmf_threshold) {
            return Err(TractError::invalid_parameter("pmf_threshold", format!("{pmf_threshold} is not in [0, 1)")))
        }
        // Make sure that a cone of exactly 90 degrees admits every direction,
        // in spite of rounding in the cosine.
        let cos_max_angle = if degrees >= 90.0 - DEGREE_SLACK { 0.0 } else { radian_(max_angle).cos() };
        Ok(Self { cos_max_angle, max_angle, pmf_threshold })
    }

    pub fn max_angle(&self) -> Angle { self.max_angle }

    /// Fill `buffer` with the PMF at `p`, zeroing the vertices which are not
    /// candidates. Returns `false` if there are no candidates left.
    pub fn candidates(
        &self,
        pmf: &PmfVolume,
        p: &Point,
        previous: Option<&Vector>,
        buffer: &mut [Weightf32],
    ) -> bool {
        if !pmf.interpolate_into(p, buffer) { return false }

        let max = buffer.iter().copied().fold(0.0, f32::max);
        if max <= 0.0 { return false }
        let floor = self.pmf_threshold * max;

        let vertices = pmf.sphere.vertices();
        let mut any = false;
        for (w, v) in buffer.iter_mut().zip(vertices) {
            let too_sharp = previous.map_or(false, |prev| v.dot(prev).abs() < self.cos_max_angle);
            if *w < floor || too_sharp { *w = 0.0 }
            any |= *w > 0.0;
        }
        any
    }

    /// Vertex `k` as a propagation direction: flipped, if necessary, so that
    /// it does not turn back on `previous`.
    pub fn oriented(pmf: &PmfVolume, k: usize, previous: Option<&Vector>) -> Vector {
        let v = pmf.sphere.vertex(k);
        match previous {
            Some(prev) if v.dot(prev) < 0.0 => -v,
            _                               =>  v,
        }
    }
}

// ----- Imports ------------------------------------------------------------------------------------------
use rand::Rng;
use units::{degree_, radian_, ratio_};

use crate::{Angle, Point, Ratio, Vector, Weightf32};
use crate::pmf::PmfVolume;
use crate::error::{Result, TractError};
