//! Seed points generated on a regular sub-voxel lattice within a mask.

/// How to place seeds inside the selected voxels of a mask.
#[derive(Clone, Debug, PartialEq)]
pub struct Seeding {
    /// Number of seeds per voxel along each axis
    pub density: BoxDim_u,
    /// Voxels whose mask value is one of these are seeded. If empty, every
    /// non-zero voxel is seeded.
    pub labels: Vec<Intensityf32>,
    /// If given, each seed is moved to a random position within its
    /// sub-voxel cell, using a generator seeded with this value.
    pub jitter: Option<u64>,
}

impl Default for Seeding {
    fn default() -> Self { Self { density: [1, 1, 1], labels: vec![], jitter: None } }
}

impl Seeding {

    pub fn validate(&self) -> Result<()> {
        if self.density.iter().any(|&d| d == 0) {
            return Err(TractError::invalid_parameter("density", format!("{:?} contains zero", self.density)))
        }
        if self.labels.iter().any(|l| !l.is_finite()) {
            return Err(TractError::invalid_parameter("labels", "labels must be finite"))
        }
        Ok(())
    }

    fn selects(&self, value: Intensityf32) -> bool {
        if self.labels.is_empty() { value != 0.0 }
        else                      { self.labels.contains(&value) }
    }

    /// World-space seeds in every selected voxel of `mask`. Voxels are visited
    /// in storage order; within each voxel, seeds are ordered with `x`
    /// varying fastest.
    pub fn seeds(&self, mask: &ScalarVolume) -> Result<Vec<Point>> {
        self.validate()?;
        let [dx, dy, dz] = self.density;
        let per_voxel = dx * dy * dz;
        let mut rng = self.jitter.map(Isaac64Rng::seed_from_u64);

        // Offsets from the voxel centre, in voxel units: `(i + u) / d - 0.5`,
        // where `u` is 0.5 for a regular lattice
        let mut offset = |i: usize, d: usize| {
            let u: f32 = rng.as_mut().map_or(0.5, |rng| rng.gen());
            (i as f32 + u) / d as f32 - 0.5
        };

        let selected = mask.data.iter()
            .enumerate()
            .filter(|(_, &v)| self.selects(v))
            .map(|(i, _)| i)
            .collect::<Vec<_>>();

        let mut seeds = Vec::with_capacity(selected.len() * per_voxel);
        for i in selected {
            let [x, y, z] = index1_to_3(i, mask.grid.n);
            for (kz, ky, kx) in iproduct!(0..dz, 0..dy, 0..dx) {
                let v = Point::new(x as f32 + offset(kx, dx),
                                   y as f32 + offset(ky, dy),
                                   z as f32 + offset(kz, dz));
                seeds.push(mask.grid.affine.to_world(&v));
            }
        }
        info!("{} seeds in mask ({} per voxel)", group_digits(seeds.len()), per_voxel);
        Ok(seeds)
    }
}

// ----- Imports ------------------------------------------------------------------------------------------
use itertools::iproduct;
use log::info;
use rand::{Rng, SeedableRng};
use rand_isaac::Isaac64Rng;

use crate::{BoxDim_u, Intensityf32, Point};
use crate::index::index1_to_3;
use crate::volume::ScalarVolume;
use crate::error::{Result, TractError};
use crate::utils::group_digits;
