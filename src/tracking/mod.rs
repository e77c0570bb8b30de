//! Growing streamlines from seeds.
//!
//! Each seed is tracked in two independent passes. The first direction `d0`
//! is drawn from the full PMF at the seed; the forward pass starts along
//! `d0`, the backward pass along `-d0`. Every pass then repeats
//!
//! 1. ask the direction getter for a direction, within the maximum angle of
//!    the previous one,
//!
//! 2. advance by one fixed step,
//!
//! 3. ask the stopping criterion about the new point,
//!
//! until one of the steps fails or the step limit is reached. The point at
//! which the stopping criterion says stop is not part of the streamline.

pub mod batch;

/// What to do with a streamline one of whose passes left the volume.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutsidePolicy {
    /// Keep it, truncated at the last point inside
    #[default]
    Keep,
    /// Throw it away
    Discard,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackingParameters {
    /// Distance between consecutive points
    pub step_size: Length,
    /// Limit on the number of points added by each pass
    pub max_steps: usize,
    pub outside: OutsidePolicy,
    /// Streamlines with fewer points than this are discarded
    pub min_points: usize,
}

impl Default for TrackingParameters {
    fn default() -> Self {
        Self { step_size: mm(0.5), max_steps: 2000, outside: OutsidePolicy::Keep, min_points: 1 }
    }
}

impl TrackingParameters {
    pub fn validate(&self) -> Result<()> {
        let step = mm_(self.step_size);
        if !(step.is_finite() && step > 0.0) {
            return Err(TractError::invalid_parameter("step_size", format!("{step} mm is not a positive length")))
        }
        if self.max_steps == 0 {
            return Err(TractError::invalid_parameter("max_steps", "must be at least 1"))
        }
        if self.min_points == 0 {
            return Err(TractError::invalid_parameter("min_points", "must be at least 1"))
        }
        Ok(())
    }
}

/// Why a seed produced no streamline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// The seed has non-finite coordinates
    MalformedSeed,
    /// A pass left the volume, and `OutsidePolicy::Discard` is in force
    LeftVolume,
    /// Fewer points than `min_points`
    TooShort,
}

/// The direction getter, stopping criterion and parameters needed to track
/// any number of seeds. Shared, read-only, between worker threads.
pub struct Tracker<D, S> {
    getter: D,
    stopping: S,
    parameters: TrackingParameters,
    step: Lengthf32,
}

impl<D: DirectionGetter, S: StoppingCriterion> Tracker<D, S> {

    pub fn new(getter: D, stopping: S, parameters: TrackingParameters) -> Result<Self> {
        parameters.validate()?;
        let step = mm_(parameters.step_size);
        Ok(Self { getter, stopping, parameters, step })
    }

    pub fn parameters(&self) -> &TrackingParameters { &self.parameters }
    pub fn getter(&self) -> &D { &self.getter }
    pub fn stopping(&self) -> &S { &self.stopping }

    /// Grow one streamline from `seed`, drawing random numbers from `rng`.
    pub fn track_seed<R: Rng + ?Sized>(
        &self,
        seed: &Point,
        rng: &mut R,
    ) -> std::result::Result<Streamline, Rejection> {
        if !seed.iter().all(|c| c.is_finite()) { return Err(Rejection::MalformedSeed) }

        let mut buffer = self.getter.buffer();
        let streamline = match self.getter.initial_direction(seed, &mut buffer, rng) {
            None => {
                let nothing = || (vec![], Termination::NoDirection);
                Streamline::from_passes(*seed, nothing(), nothing())
            }
            Some(d0) => {
                let forward  = self.pass(seed,  d0, &mut buffer, rng);
                let backward = self.pass(seed, -d0, &mut buffer, rng);
                Streamline::from_passes(*seed, forward, backward)
            }
        };
        debug!("seed {seed:?}: {} points, forward {:?}, backward {:?}",
               streamline.len(), streamline.forward_termination(), streamline.backward_termination());

        if self.parameters.outside == OutsidePolicy::Discard && streamline.touches_outside() {
            return Err(Rejection::LeftVolume)
        }
        if streamline.len() < self.parameters.min_points {
            return Err(Rejection::TooShort)
        }
        Ok(streamline)
    }

    /// One propagation pass. Returns the points it added (the seed excluded)
    /// and the reason it stopped.
    fn pass<R: Rng + ?Sized>(
        &self,
        seed: &Point,
        first_direction: Vector,
        buffer: &mut [Weightf32],
        rng: &mut R,
    ) -> (Vec<Point>, Termination) {
        let mut points = vec![];
        let mut position = *seed;
        let mut state = Pass::Initial(first_direction);
        loop {
            state = match state {
                Pass::Initial(direction) => self.advance(&mut position, direction, &mut points),
                Pass::Stepping(previous) => {
                    match self.getter.next_direction(&position, &previous, buffer, rng) {
                        Some(direction) => self.advance(&mut position, direction, &mut points),
                        None            => Pass::Terminated(Termination::NoDirection),
                    }
                }
                Pass::Terminated(reason) => return (points, reason),
            }
        }
    }

    fn advance(&self, position: &mut Point, direction: Vector, points: &mut Vec<Point>) -> Pass {
        if points.len() >= self.parameters.max_steps { return Pass::Terminated(Termination::MaxSteps) }
        *position += direction * self.step;
        match self.stopping.check(position) {
            StopStatus::Continue    => { points.push(*position); Pass::Stepping(direction) }
            StopStatus::StopValid   => Pass::Terminated(Termination::Endpoint),
            StopStatus::StopInvalid => Pass::Terminated(Termination::OutsideVolume),
        }
    }
}

/// State of a single propagation pass
#[derive(Clone, Copy, Debug)]
enum Pass {
    /// About to take the first step, in a direction chosen at the seed
    Initial(Vector),
    /// The last step was taken in this direction
    Stepping(Vector),
    Terminated(Termination),
}

// ----- Imports ------------------------------------------------------------------------------------------
use log::debug;
use rand::Rng;
use units::{mm, mm_};

use crate::{Length, Lengthf32, Point, Vector, Weightf32};
use crate::direction::DirectionGetter;
use crate::stopping::{StopStatus, StoppingCriterion};
use crate::streamline::{Streamline, Termination};
use crate::error::{Result, TractError};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Affine, grid::Grid, sphere::Sphere, pmf::PmfVolume};
    use crate::direction::{DeterministicMaximum, Probabilistic};
    use crate::stopping::ThresholdCriterion;
    use crate::volume::{Interpolation, ScalarVolume};
    use float_eq::assert_float_eq;
    use rand::SeedableRng;
    use rand_isaac::Isaac64Rng;
    use rstest::rstest;
    use units::{degree, ratio};

    // 20 x 1 x 1 voxels of 1 mm, PMF pointing only along x
    fn along_x() -> (PmfVolume, ScalarVolume) {
        let grid = Grid::new([20, 1, 1], Affine::identity()).unwrap();
        let sphere = Sphere::new(vec![Vector::x(), Vector::y(), Vector::z()]).unwrap();
        let pmf = PmfVolume::new(grid, sphere, [1.0, 0.0, 0.0].repeat(20)).unwrap();
        (pmf, ScalarVolume::filled(grid, 0.5))
    }

    fn deterministic(fa: ScalarVolume, parameters: TrackingParameters) -> Tracker<DeterministicMaximum, ThresholdCriterion> {
        let (pmf, _) = along_x();
        Tracker::new(
            DeterministicMaximum::new(pmf, degree(30.0), ratio(0.1)).unwrap(),
            ThresholdCriterion::new(fa, 0.2, Interpolation::Nearest).unwrap(),
            parameters,
        ).unwrap()
    }

    fn rng() -> Isaac64Rng { Isaac64Rng::seed_from_u64(0) }

    #[test]
    fn straight_line_leaves_volume_both_ways() {
        let (_, fa) = along_x();
        let tracker = deterministic(fa, TrackingParameters { step_size: mm(1.0), ..Default::default() });
        let s = tracker.track_seed(&Point::new(10.0, 0.0, 0.0), &mut rng()).unwrap();
        // Valid region is [-0.5, 19.5]: points at 0, 1, ... 19
        assert_eq!(s.len(), 20);
        assert_eq!(s.seed(), Point::new(10.0, 0.0, 0.0));
        assert_eq!(s.forward_termination (), Termination::OutsideVolume);
        assert_eq!(s.backward_termination(), Termination::OutsideVolume);
        for d in s.segment_lengths() { assert_float_eq!(d, 1.0, abs <= 1e-5) }
    }

    #[test]
    fn low_fa_ends_pass_without_adding_the_point() {
        let (_, mut fa) = along_x();
        fa[[13, 0, 0]] = 0.0;
        let tracker = deterministic(fa, TrackingParameters { step_size: mm(1.0), ..Default::default() });
        let s = tracker.track_seed(&Point::new(10.0, 0.0, 0.0), &mut rng()).unwrap();
        assert_eq!(s.forward_pass().len(), 3); // seed, 11, 12
        assert_eq!(s.forward_termination(), Termination::Endpoint);
    }

    #[rstest(/**/ max_steps, expected_len,
             case(1, 3),
             case(2, 5),
             case(5, 11),
    )]
    fn step_limit(max_steps: usize, expected_len: usize) {
        let (_, fa) = along_x();
        let tracker = deterministic(fa, TrackingParameters { step_size: mm(0.5), max_steps, ..Default::default() });
        let s = tracker.track_seed(&Point::new(10.0, 0.0, 0.0), &mut rng()).unwrap();
        assert_eq!(s.len(), expected_len);
        assert_eq!(s.forward_termination(), Termination::MaxSteps);
    }

    #[test]
    fn outside_policy_discard() {
        let (_, fa) = along_x();
        let parameters = TrackingParameters { step_size: mm(1.0), outside: OutsidePolicy::Discard, ..Default::default() };
        let tracker = deterministic(fa, parameters);
        assert_eq!(tracker.track_seed(&Point::new(10.0, 0.0, 0.0), &mut rng()), Err(Rejection::LeftVolume));
    }

    #[test]
    fn degenerate_seed_gives_single_point() {
        let grid = Grid::new([3, 3, 3], Affine::identity()).unwrap();
        let sphere = Sphere::icosphere(1);
        let pmf = PmfVolume::new(grid, sphere.clone(), vec![0.0; 27 * sphere.len()]).unwrap();
        let tracker = Tracker::new(
            Probabilistic::new(pmf, degree(30.0), ratio(0.1)).unwrap(),
            ThresholdCriterion::new(ScalarVolume::filled(grid, 1.0), 0.2, Interpolation::Trilinear).unwrap(),
            TrackingParameters::default(),
        ).unwrap();
        let seed = Point::new(1.0, 1.0, 1.0);
        let s = tracker.track_seed(&seed, &mut rng()).unwrap();
        assert_eq!(s.points(), &[seed]);
        assert_eq!(s.forward_termination(), Termination::NoDirection);

        let strict = Tracker::new(
            tracker.getter, tracker.stopping,
            TrackingParameters { min_points: 2, ..TrackingParameters::default() },
        ).unwrap();
        assert_eq!(strict.track_seed(&seed, &mut rng()), Err(Rejection::TooShort));
    }

    #[test]
    fn malformed_seed() {
        let (_, fa) = along_x();
        let tracker = deterministic(fa, TrackingParameters::default());
        let seed = Point::new(f32::NAN, 0.0, 0.0);
        assert_eq!(tracker.track_seed(&seed, &mut rng()), Err(Rejection::MalformedSeed));
    }

    #[rstest(/**/ step, max_steps, min_points,
             case( 0.0, 10, 1),
             case(-1.0, 10, 1),
             case( 0.5,  0, 1),
             case( 0.5, 10, 0),
    )]
    fn invalid_parameters(step: f32, max_steps: usize, min_points: usize) {
        let parameters = TrackingParameters { step_size: mm(step), max_steps, min_points, ..Default::default() };
        assert!(parameters.validate().is_err());
    }
}
