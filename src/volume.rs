use std::path::Path;

use crate::{Intensityf32, Point};
use crate::grid::Grid;
use crate::index::{Index1_u, Index3_u, index3_to_1};
use crate::error::{Result, TractError};
use crate::io;

pub type VolumeData = Vec<Intensityf32>;

/// How to read a scalar field at a position which does not coincide with a
/// voxel centre.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    Nearest,
    #[default]
    Trilinear,
}

/// A scalar map (FA, mask, labels ...) on a grid.
#[derive(Clone, Debug)]
pub struct ScalarVolume {
    pub grid: Grid,
    pub data: VolumeData,
}

impl core::ops::IndexMut<Index1_u> for ScalarVolume {
    #[inline]
    fn index_mut(&mut self, i: Index1_u) -> &mut Self::Output { &mut self.data[i] }
}

impl core::ops::Index<Index1_u> for ScalarVolume {
    type Output = Intensityf32;
    #[inline]
    fn index(&self, i: Index1_u) -> &Self::Output { &self.data[i] }
}

impl core::ops::IndexMut<Index3_u> for ScalarVolume {
    fn index_mut(&mut self, i3: Index3_u) -> &mut Self::Output {
        let i1 = index3_to_1(i3, self.grid.n);
        &mut self.data[i1]
    }
}

impl core::ops::Index<Index3_u> for ScalarVolume {
    type Output = Intensityf32;
    fn index(&self, i3: Index3_u) -> &Self::Output {
        let i1 = index3_to_1(i3, self.grid.n);
        &self.data[i1]
    }
}

impl ScalarVolume {

    pub fn new(grid: Grid, data: VolumeData) -> Result<Self> {
        let expected = grid.n_voxels();
        if data.len() != expected {
            return Err(TractError::ShapeMismatch { dims: grid.n, expected, actual: data.len() })
        }
        Ok(Self { grid, data })
    }

    pub fn filled(grid: Grid, value: Intensityf32) -> Self {
        Self { data: vec![value; grid.n_voxels()], grid }
    }

    pub fn zeros(grid: Grid) -> Self { Self::filled(grid, 0.0) }

    pub fn from_raw_file(grid: Grid, path: &Path) -> Result<Self> {
        let data = io::raw::read(path)?.collect::<std::io::Result<_>>()?;
        Self::new(grid, data)
    }

    pub fn write_to_raw_file(&self, path: &Path) -> Result<()> {
        io::raw::write(self.data.iter().copied(), path)?;
        Ok(())
    }

    /// Value at world-space `p`, or `None` outside the grid
    pub fn sample(&self, p: &Point, interpolation: Interpolation) -> Option<Intensityf32> {
        match interpolation {
            Interpolation::Nearest   => self.nearest(p),
            Interpolation::Trilinear => self.trilinear(p),
        }
    }

    pub fn nearest(&self, p: &Point) -> Option<Intensityf32> {
        self.grid.nearest_index(p).map(|i| self[i])
    }

    pub fn trilinear(&self, p: &Point) -> Option<Intensityf32> {
        let hood = self.grid.trilinear_neighbourhood(p)?;
        Some(hood.iter().map(|&(i, w)| w * self.data[i]).sum())
    }

    /// Binary mask: voxels whose value is non-zero
    pub fn nonzero(&self) -> impl Iterator<Item = Index1_u> + '_ {
        self.data.iter().enumerate().filter(|(_, v)| **v != 0.0).map(|(i, _)| i)
    }
}
