//! Synthetic tensor data with a known answer: a straight cylindrical bundle
//! of fibres through the centre of the volume, in an isotropic background.

#[derive(Clone, Debug)]
pub struct BundlePhantom {
    pub n: BoxDim_u,
    pub voxel_size: Length,
    /// Direction of the fibres
    pub direction: Vector,
    pub radius: Length,
    /// Diffusivities (mm²/s) along and across the fibres
    pub parallel: Diffusivityf32,
    pub perpendicular: Diffusivityf32,
    /// Diffusivity (mm²/s) everywhere outside the bundle
    pub background: Diffusivityf32,
}

impl Default for BundlePhantom {
    fn default() -> Self {
        Self {
            n: [20, 20, 20],
            voxel_size: mm(2.0),
            direction: Vector::x(),
            radius: mm(5.0),
            parallel: 1.7e-3,
            perpendicular: 0.3e-3,
            background: 0.8e-3,
        }
    }
}

impl BundlePhantom {

    /// Isotropic voxels, with the centre of the volume at the world origin
    pub fn grid(&self) -> Result<Grid> {
        let size = self.voxel_size;
        let origin = self.n.map(|n| -(n as f32 - 1.0) / 2.0 * mm_(size));
        let affine = Affine::scaling((size, size, size), Point::from(origin))
            .ok_or(TractError::InvalidAffine)?;
        Grid::new(self.n, affine)
    }

    fn inside(&self, p: &Point) -> bool {
        let d = self.direction.normalize();
        p.coords.cross(&d).norm() <= mm_(self.radius)
    }

    pub fn tensors(&self) -> Result<TensorVolume> {
        geometry::unit_or_none(self.direction)
            .ok_or_else(|| TractError::invalid_parameter("direction", "fibre direction must be non-zero"))?;
        let grid = self.grid()?;
        let fibre = Tensor::cylinder(&self.direction, self.parallel, self.perpendicular);
        let background = Tensor::isotropic(self.background);
        let tensors = (0..grid.n_voxels())
            .map(|i| if self.inside(&grid.voxel_centre1(i)) { fibre } else { background })
            .collect();
        TensorVolume::from_tensors(grid, tensors)
    }

    /// 1 inside the bundle, 0 elsewhere
    pub fn bundle_mask(&self) -> Result<ScalarVolume> {
        let grid = self.grid()?;
        let data = (0..grid.n_voxels())
            .map(|i| if self.inside(&grid.voxel_centre1(i)) { 1.0 } else { 0.0 })
            .collect();
        ScalarVolume::new(grid, data)
    }

    /// Bundle voxels whose centres lie within half a voxel of the plane
    /// through the centre of the volume, perpendicular to the fibres
    pub fn seed_mask(&self) -> Result<ScalarVolume> {
        let mut mask = self.bundle_mask()?;
        let d = self.direction.normalize();
        let half = mm_(self.voxel_size) / 2.0;
        for i in 0..mask.data.len() {
            if mask.grid.voxel_centre1(i).coords.dot(&d).abs() > half { mask.data[i] = 0.0 }
        }
        Ok(mask)
    }
}

// ----- Imports ------------------------------------------------------------------------------------------
use units::{mm, mm_};

use crate::{Affine, BoxDim_u, Diffusivityf32, Length, Point, Vector};
use crate::grid::Grid;
use crate::tensor::{Tensor, TensorVolume};
use crate::volume::ScalarVolume;
use crate::error::{Result, TractError};
