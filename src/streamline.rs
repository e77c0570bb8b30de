//! Completed streamlines, and the reasons their propagation passes ended.

/// Why a single propagation pass stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Termination {
    /// No admissible direction at the current point: degenerate PMF, empty
    /// cone, or a position outside the PMF grid.
    NoDirection,
    /// The stopping field said `StopValid`: a genuine end of the tract.
    Endpoint,
    /// The stopping field said `StopInvalid`: the pass left the volume.
    OutsideVolume,
    /// The per-pass step limit was reached.
    MaxSteps,
}

impl Termination {
    pub const ALL: [Termination; 4] = [Self::NoDirection, Self::Endpoint, Self::OutsideVolume, Self::MaxSteps];

    pub fn name(self) -> &'static str {
        match self {
            Self::NoDirection   => "no direction",
            Self::Endpoint      => "endpoint",
            Self::OutsideVolume => "outside volume",
            Self::MaxSteps      => "max steps",
        }
    }
}

/// A polyline in world space, grown in two passes from a seed.
///
/// The points of the backward pass come first (furthest from the seed
/// first), then the seed itself, then the points of the forward pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Streamline {
    points: Vec<Point>,
    seed_index: usize,
    forward: Termination,
    backward: Termination,
}

impl Streamline {

    /// Join two passes, each of which excludes the seed and is ordered away
    /// from it.
    pub fn from_passes(
        seed: Point,
        forward : (Vec<Point>, Termination),
        backward: (Vec<Point>, Termination),
    ) -> Self {
        let (forward_points , forward ) = forward;
        let (backward_points, backward) = backward;
        let seed_index = backward_points.len();
        let mut points = Vec::with_capacity(seed_index + 1 + forward_points.len());
        points.extend(backward_points.into_iter().rev());
        points.push(seed);
        points.extend(forward_points);
        Self { points, seed_index, forward, backward }
    }

    /// Used by readers, which have no knowledge of seeds or terminations.
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points, seed_index: 0, forward: Termination::Endpoint, backward: Termination::Endpoint }
    }

    pub fn points(&self) -> &[Point] { &self.points }
    pub fn len(&self) -> usize { self.points.len() }
    pub fn is_empty(&self) -> bool { self.points.is_empty() }

    pub fn seed_index(&self) -> usize { self.seed_index }
    pub fn seed(&self) -> Point { self.points[self.seed_index] }

    pub fn forward_termination (&self) -> Termination { self.forward }
    pub fn backward_termination(&self) -> Termination { self.backward }

    /// Seed followed by the forward pass
    pub fn forward_pass(&self) -> &[Point] { &self.points[self.seed_index..] }

    /// Seed followed by the backward pass, in order of propagation
    pub fn backward_pass(&self) -> Vec<Point> {
        self.points[..=self.seed_index].iter().rev().copied().collect()
    }

    /// The same curve traversed the other way: the passes swap roles.
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self {
            seed_index: points.len() - 1 - self.seed_index,
            points,
            forward : self.backward,
            backward: self.forward,
        }
    }

    pub fn touches_outside(&self) -> bool {
        self.forward == Termination::OutsideVolume || self.backward == Termination::OutsideVolume
    }

    /// Distances between consecutive points
    pub fn segment_lengths(&self) -> impl Iterator<Item = Lengthf32> + '_ {
        self.points.windows(2).map(|w| (w[1] - w[0]).norm())
    }

    pub fn arc_length(&self) -> Length { mm(self.segment_lengths().sum()) }
}

// ----- Imports ------------------------------------------------------------------------------------------
use units::mm;
use crate::{Length, Lengthf32, Point};

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;
    use units::mm_;

    fn p(x: f32) -> Point { Point::new(x, 0.0, 0.0) }

    fn example() -> Streamline {
        Streamline::from_passes(
            p(0.0),
            (vec![p( 1.0), p( 2.0), p( 3.0)], Termination::MaxSteps),
            (vec![p(-1.0)                  ], Termination::Endpoint),
        )
    }

    #[test]
    fn passes_are_joined_at_the_seed() {
        let s = example();
        assert_eq!(s.points(), &[p(-1.0), p(0.0), p(1.0), p(2.0), p(3.0)]);
        assert_eq!(s.seed_index(), 1);
        assert_eq!(s.seed(), p(0.0));
        assert_eq!(s.forward_pass(), &[p(0.0), p(1.0), p(2.0), p(3.0)]);
        assert_eq!(s.backward_pass(), vec![p(0.0), p(-1.0)]);
    }

    #[test]
    fn reversal_swaps_the_passes() {
        let s = example();
        let r = s.reversed();
        assert_eq!(r.seed(), s.seed());
        assert_eq!(r.forward_pass(), &s.backward_pass()[..]);
        assert_eq!(r.backward_pass(), s.forward_pass());
        assert_eq!(r.forward_termination(), Termination::Endpoint);
        assert_eq!(r.reversed(), s);
    }

    #[test]
    fn single_point_streamline() {
        let s = Streamline::from_passes(p(7.0), (vec![], Termination::NoDirection), (vec![], Termination::NoDirection));
        assert_eq!(s.len(), 1);
        assert_eq!(s.reversed(), s);
        assert_eq!(mm_(s.arc_length()), 0.0);
    }

    #[test]
    fn arc_length() {
        assert_float_eq!(mm_(example().arc_length()), 4.0, ulps <= 1);
    }
}
