//! Tracking many seeds in parallel.
//!
//! Seeds are independent of each other, so they are distributed over the
//! rayon thread pool. Each seed gets its own random number generator, derived
//! from a base seed and the seed's position in the list, so that results do
//! not depend on how the work was scheduled. Cancellation and the deadline
//! are checked before each seed is started: a streamline in progress is
//! always completed.

/// How a batch run may be cut short
#[derive(Clone, Copy, Debug, Default)]
pub struct BatchControl<'a> {
    /// Stop starting new seeds once this is set
    pub cancel: Option<&'a AtomicBool>,
    /// Stop starting new seeds after this moment
    pub deadline: Option<Instant>,
}

impl BatchControl<'_> {
    fn interruption(&self) -> Option<Interruption> {
        if self.cancel.map_or(false, |flag| flag.load(Ordering::Relaxed)) {
            return Some(Interruption::Cancelled)
        }
        if self.deadline.map_or(false, |deadline| Instant::now() >= deadline) {
            return Some(Interruption::DeadlineExpired)
        }
        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Interruption {
    Cancelled,
    DeadlineExpired,
}

/// What happened to one seed
#[derive(Clone, Debug, PartialEq)]
pub enum SeedOutcome {
    Tracked(Streamline),
    Rejected(Rejection),
    NotStarted(Interruption),
}

/// Random number generator for the seed at `index` of a run with base seed `base`
pub fn seed_rng(base: u64, index: usize) -> Isaac64Rng {
    Isaac64Rng::seed_from_u64(base ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Track every seed with `tracker`. Streamlines are returned in seed order.
/// `on_seed` is called (from worker threads) as each seed is finished.
pub fn track_all<D, S, F>(
    tracker: &Tracker<D, S>,
    seeds: &[Point],
    rng_seed: u64,
    control: BatchControl,
    on_seed: F,
) -> TrackingOutcome
where
    D: DirectionGetter,
    S: StoppingCriterion,
    F: Fn(usize, &SeedOutcome) + Sync,
{
    info!("Tracking {} seeds", group_digits(seeds.len()));

    let track_one = |(index, seed): (usize, &Point)| {
        let outcome = match control.interruption() {
            Some(why) => SeedOutcome::NotStarted(why),
            None => match tracker.track_seed(seed, &mut seed_rng(rng_seed, index)) {
                Ok(streamline) => SeedOutcome::Tracked(streamline),
                Err(rejection) => {
                    if rejection == Rejection::MalformedSeed {
                        warn!("Skipping seed {index}: non-finite position {seed:?}");
                    }
                    SeedOutcome::Rejected(rejection)
                }
            }
        };
        on_seed(index, &outcome);
        outcome
    };

    // Choose between serial parallel iteration
    #[cfg    (feature = "serial") ] let iter = seeds.    iter().enumerate();
    #[cfg(not(feature = "serial"))] let iter = seeds.par_iter().enumerate();

    let outcomes: Vec<SeedOutcome> = iter.map(track_one).collect();

    let mut outcome = TrackingOutcome::default();
    for seed_outcome in outcomes {
        outcome.statistics.record(&seed_outcome);
        match seed_outcome {
            SeedOutcome::Tracked(streamline) => outcome.streamlines.push(streamline),
            SeedOutcome::NotStarted(why)     => { outcome.interrupted.get_or_insert(why); }
            SeedOutcome::Rejected(_)         => {}
        }
    }
    info!("{}", outcome.statistics);
    if let Some(why) = outcome.interrupted {
        warn!("Tracking interrupted ({why:?}): {} seeds not started",
              group_digits(outcome.statistics.not_started));
    }
    outcome
}

#[derive(Clone, Debug, Default)]
pub struct TrackingOutcome {
    pub streamlines: Vec<Streamline>,
    pub statistics: Statistics,
    /// Set if some seeds were never started
    pub interrupted: Option<Interruption>,
}

/// Counts of what happened to the seeds of a run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Statistics {
    pub seeds: usize,
    pub streamlines: usize,
    pub points: usize,
    pub malformed: usize,
    pub left_volume: usize,
    pub too_short: usize,
    pub not_started: usize,
    /// How the passes of the kept streamlines ended
    pub passes: BTreeMap<Termination, usize>,
}

impl Statistics {
    pub fn record(&mut self, outcome: &SeedOutcome) {
        self.seeds += 1;
        match outcome {
            SeedOutcome::Tracked(s) => {
                self.streamlines += 1;
                self.points += s.len();
                for t in [s.forward_termination(), s.backward_termination()] {
                    *self.passes.entry(t).or_default() += 1;
                }
            }
            SeedOutcome::Rejected(Rejection::MalformedSeed) => self.malformed   += 1,
            SeedOutcome::Rejected(Rejection::LeftVolume   ) => self.left_volume += 1,
            SeedOutcome::Rejected(Rejection::TooShort     ) => self.too_short   += 1,
            SeedOutcome::NotStarted(_)                      => self.not_started += 1,
        }
    }

    pub fn passes_ending(&self, t: Termination) -> usize {
        self.passes.get(&t).copied().unwrap_or(0)
    }
}

impl std::fmt::Display for Statistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let g = group_digits;
        write!(f, "{} streamlines ({} points) from {} seeds",
               g(self.streamlines), g(self.points), g(self.seeds))?;
        write!(f, "; rejected: {} malformed, {} left volume, {} too short",
               g(self.malformed), g(self.left_volume), g(self.too_short))?;
        write!(f, "; pass endings:")?;
        for t in Termination::ALL {
            write!(f, " {} {},", g(self.passes_ending(t)), t.name())?;
        }
        Ok(())
    }
}

// ----- Imports ------------------------------------------------------------------------------------------
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::{info, warn};
use rand::SeedableRng;
use rand_isaac::Isaac64Rng;
#[cfg(not(feature = "serial"))]
use rayon::prelude::*;

use crate::Point;
use crate::direction::DirectionGetter;
use crate::stopping::StoppingCriterion;
use crate::streamline::{Streamline, Termination};
use crate::utils::group_digits;
use super::{Rejection, Tracker};

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::TrackingParameters;
    use crate::{Affine, grid::Grid, sphere::Sphere, pmf::PmfVolume};
    use crate::direction::Probabilistic;
    use crate::stopping::ThresholdCriterion;
    use crate::volume::{Interpolation, ScalarVolume};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use units::{degree, mm, ratio};

    fn tracker() -> Tracker<Probabilistic, ThresholdCriterion> {
        let grid = Grid::new([10, 10, 10], Affine::identity()).unwrap();
        let pmf = PmfVolume::uniform(grid, Sphere::icosphere(2));
        Tracker::new(
            Probabilistic::new(pmf, degree(30.0), ratio(0.1)).unwrap(),
            ThresholdCriterion::new(ScalarVolume::filled(grid, 0.5), 0.2, Interpolation::Trilinear).unwrap(),
            TrackingParameters { step_size: mm(0.5), max_steps: 50, ..Default::default() },
        ).unwrap()
    }

    fn seeds() -> Vec<Point> {
        (0..40).map(|i| Point::new((i % 8) as f32 + 1.0, 4.5, (i / 8) as f32 + 2.0)).collect()
    }

    #[test]
    fn results_are_in_seed_order_and_reproducible() {
        let tracker = tracker();
        let seeds = seeds();
        let a = track_all(&tracker, &seeds, 123, BatchControl::default(), |_, _| {});
        let b = track_all(&tracker, &seeds, 123, BatchControl::default(), |_, _| {});
        assert_eq!(a.streamlines.len(), seeds.len());
        for (s, seed) in a.streamlines.iter().zip(&seeds) { assert_eq!(s.seed(), *seed) }
        assert_eq!(a.streamlines, b.streamlines);
        assert_eq!(a.statistics, b.statistics);
        assert_eq!(a.interrupted, None);
    }

    #[test]
    fn different_base_seed_gives_different_streamlines() {
        let tracker = tracker();
        let seeds = seeds();
        let a = track_all(&tracker, &seeds, 1, BatchControl::default(), |_, _| {});
        let b = track_all(&tracker, &seeds, 2, BatchControl::default(), |_, _| {});
        assert_ne!(a.streamlines, b.streamlines);
    }

    #[test]
    fn malformed_seed_is_skipped() {
        let tracker = tracker();
        let mut seeds = seeds();
        seeds[3] = Point::new(1.0, f32::INFINITY, 1.0);
        let outcome = track_all(&tracker, &seeds, 0, BatchControl::default(), |_, _| {});
        assert_eq!(outcome.statistics.malformed, 1);
        assert_eq!(outcome.streamlines.len(), seeds.len() - 1);
    }

    #[test]
    fn cancelled_before_start() {
        let tracker = tracker();
        let cancel = AtomicBool::new(true);
        let control = BatchControl { cancel: Some(&cancel), deadline: None };
        let outcome = track_all(&tracker, &seeds(), 0, control, |_, _| {});
        assert!(outcome.streamlines.is_empty());
        assert_eq!(outcome.statistics.not_started, seeds().len());
        assert_eq!(outcome.interrupted, Some(Interruption::Cancelled));
    }

    #[test]
    fn expired_deadline() {
        let tracker = tracker();
        let deadline = Instant::now() - Duration::from_millis(1);
        let control = BatchControl { cancel: None, deadline: Some(deadline) };
        let outcome = track_all(&tracker, &seeds(), 0, control, |_, _| {});
        assert!(outcome.streamlines.is_empty());
        assert_eq!(outcome.interrupted, Some(Interruption::DeadlineExpired));
    }

    #[test]
    fn callback_sees_every_seed() {
        let tracker = tracker();
        let count = AtomicUsize::new(0);
        track_all(&tracker, &seeds(), 0, BatchControl::default(), |_, _| { count.fetch_add(1, Ordering::Relaxed); });
        assert_eq!(count.into_inner(), seeds().len());
    }

    #[test]
    fn statistics_count_both_passes() {
        let tracker = tracker();
        let outcome = track_all(&tracker, &seeds(), 9, BatchControl::default(), |_, _| {});
        let total: usize = outcome.statistics.passes.values().sum();
        assert_eq!(total, 2 * outcome.streamlines.len());
        assert_eq!(outcome.statistics.passes_ending(Termination::Endpoint), 0);
    }
}
