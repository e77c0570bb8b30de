use rand::Rng;

use crate::{Angle, Point, Ratio, Vector, Weightf32};
use crate::pmf::PmfVolume;
use crate::error::Result;

use super::{DirectionGetter, Restriction};

/// Draws each direction at random from the candidate vertices, with
/// probability proportional to their (interpolated) mass.
pub struct Probabilistic {
    pmf: PmfVolume,
    restriction: Restriction,
}

impl Probabilistic {
    pub fn new(pmf: PmfVolume, max_angle: Angle, pmf_threshold: Ratio) -> Result<Self> {
        Ok(Self { pmf, restriction: Restriction::new(max_angle, pmf_threshold)? })
    }

    pub fn pmf(&self) -> &PmfVolume { &self.pmf }

    fn sample<R: Rng + ?Sized>(
        &self, p: &Point, previous: Option<&Vector>, buffer: &mut [Weightf32], rng: &mut R,
    ) -> Option<Vector> {
        if !self.restriction.candidates(&self.pmf, p, previous, buffer) { return None }
        let k = draw(buffer, rng)?;
        Some(Restriction::oriented(&self.pmf, k, previous))
    }
}

impl DirectionGetter for Probabilistic {

    fn initial_direction<R: Rng + ?Sized>(
        &self, p: &Point, buffer: &mut [Weightf32], rng: &mut R,
    ) -> Option<Vector> {
        self.sample(p, None, buffer, rng)
    }

    fn next_direction<R: Rng + ?Sized>(
        &self, p: &Point, previous: &Vector, buffer: &mut [Weightf32], rng: &mut R,
    ) -> Option<Vector> {
        self.sample(p, Some(previous), buffer, rng)
    }

    fn buffer(&self) -> Vec<Weightf32> { self.pmf.buffer() }

    fn max_angle(&self) -> Angle { self.restriction.max_angle() }
}

/// Pick an index at random, with probability proportional to the weights.
/// Overwrites `weights` with their running sum. `None` if all weights are zero.
pub fn draw<R: Rng + ?Sized>(weights: &mut [Weightf32], rng: &mut R) -> Option<usize> {
    let mut total = 0.0;
    let mut last_positive = None;
    for (k, w) in weights.iter_mut().enumerate() {
        if *w > 0.0 { last_positive = Some(k) }
        total += *w;
        *w = total;
    }
    let last_positive = last_positive?;
    let u = rng.gen::<f32>() * total;
    let k = weights.partition_point(|&cumulative| cumulative <= u);
    // Rounding can put `u` at (or beyond) the total
    Some(if k <= last_positive { k } else { last_positive })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Affine, grid::Grid, sphere::Sphere};
    use rand::SeedableRng;
    use rand_isaac::Isaac64Rng;
    use units::{degree, ratio, degree_};
    use float_eq::assert_float_eq;

    #[test]
    fn draw_never_picks_zero_weight() {
        let mut rng = Isaac64Rng::seed_from_u64(42);
        for _ in 0..1000 {
            let mut w = vec![0.0, 3.0, 0.0, 1.0, 0.0];
            let k = draw(&mut w, &mut rng).unwrap();
            assert!(k == 1 || k == 3, "picked {k}");
        }
    }

    #[test]
    fn draw_follows_weights() {
        let mut rng = Isaac64Rng::seed_from_u64(1234);
        let n = 20_000;
        let mut counts = [0_usize; 3];
        for _ in 0..n {
            let mut w = vec![1.0, 2.0, 1.0];
            counts[draw(&mut w, &mut rng).unwrap()] += 1;
        }
        let middle = counts[1] as f32 / n as f32;
        assert_float_eq!(middle, 0.5, abs <= 0.02);
    }

    #[test]
    fn draw_from_nothing() {
        let mut rng = Isaac64Rng::seed_from_u64(0);
        assert_eq!(draw(&mut [0.0, 0.0], &mut rng), None);
        assert_eq!(draw(&mut [], &mut rng), None);
    }

    #[test]
    fn sampled_directions_stay_in_cone() {
        let sphere = Sphere::icosphere(3);
        let grid = Grid::new([3, 3, 3], Affine::identity()).unwrap();
        let getter = Probabilistic::new(PmfVolume::uniform(grid, sphere), degree(30.0), ratio(0.1)).unwrap();
        let mut rng = Isaac64Rng::seed_from_u64(7);
        let mut buf = getter.buffer();
        let previous = Vector::new(1.0, 1.0, 0.0).normalize();
        for _ in 0..500 {
            let d = getter.next_direction(&Point::new(1.0, 1.0, 1.0), &previous, &mut buf, &mut rng).unwrap();
            assert!(degree_(geometry::angle_between(&d, &previous)) <= 30.0 + 1e-3);
        }
    }

    #[test]
    fn outside_pmf_grid_gives_no_direction() {
        let grid = Grid::new([2, 2, 2], Affine::identity()).unwrap();
        let getter = Probabilistic::new(PmfVolume::uniform(grid, Sphere::icosphere(1)), degree(30.0), ratio(0.1)).unwrap();
        let mut rng = Isaac64Rng::seed_from_u64(7);
        let mut buf = getter.buffer();
        assert_eq!(getter.initial_direction(&Point::new(5.0, 0.0, 0.0), &mut buf, &mut rng), None);
    }

    #[test]
    fn same_seed_same_directions() {
        let grid = Grid::new([2, 2, 2], Affine::identity()).unwrap();
        let getter = Probabilistic::new(PmfVolume::uniform(grid, Sphere::icosphere(2)), degree(45.0), ratio(0.1)).unwrap();
        let run = |seed| {
            let mut rng = Isaac64Rng::seed_from_u64(seed);
            let mut buf = getter.buffer();
            (0..20).map(|_| getter.initial_direction(&Point::origin(), &mut buf, &mut rng).unwrap())
                   .collect::<Vec<_>>()
        };
        assert_eq!(run(99), run(99));
        assert_ne!(run(99), run(100));
    }
}
