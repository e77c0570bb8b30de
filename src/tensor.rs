//! The diffusion tensor model: per-voxel symmetric 3x3 tensors, and the
//! quantities derived from them which drive tracking (FA and the tensor ODF).

/// Eigenvalues below this (in mm²/s) are treated as this value when
/// evaluating the ODF. Fitted tensors often have tiny or slightly negative
/// eigenvalues because of noise.
pub const MIN_DIFFUSIVITY: Diffusivityf32 = 1e-6;

/// A symmetric tensor, stored as its 6 distinct components in the order
/// `Dxx, Dxy, Dyy, Dxz, Dyz, Dzz` (lower triangle, row by row).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tensor(pub [Diffusivityf32; 6]);

/// Eigen-decomposition with eigenvalues in descending order
#[derive(Clone, Copy, Debug)]
pub struct Eigen {
    pub values: [Diffusivityf32; 3],
    pub vectors: [Vector; 3],
}

impl Tensor {

    pub fn isotropic(d: Diffusivityf32) -> Self { Self([d, 0.0, d, 0.0, 0.0, d]) }

    /// Axially symmetric tensor with diffusivity `parallel` along `axis` and
    /// `perpendicular` across it.
    pub fn cylinder(axis: &Vector, parallel: Diffusivityf32, perpendicular: Diffusivityf32) -> Self {
        let a = axis.normalize();
        let m = Matrix3::identity() * perpendicular + a * a.transpose() * (parallel - perpendicular);
        Self::from_matrix(&m)
    }

    pub fn from_matrix(m: &Matrix3<f32>) -> Self {
        Self([m[(0,0)], m[(1,0)], m[(1,1)], m[(2,0)], m[(2,1)], m[(2,2)]])
    }

    pub fn matrix(&self) -> Matrix3<f32> {
        let [xx, xy, yy, xz, yz, zz] = self.0;
        Matrix3::new(xx, xy, xz,
                     xy, yy, yz,
                     xz, yz, zz)
    }

    pub fn is_finite(&self) -> bool { self.0.iter().all(|c| c.is_finite()) }

    pub fn eigen(&self) -> Eigen {
        let SymmetricEigen { eigenvalues, eigenvectors } = self.matrix().symmetric_eigen();
        let mut order = [0, 1, 2];
        order.sort_by_key(|&i| std::cmp::Reverse(OrderedFloat(eigenvalues[i])));
        Eigen {
            values : order.map(|i| eigenvalues[i]),
            vectors: order.map(|i| eigenvectors.column(i).into_owned()),
        }
    }

    pub fn mean_diffusivity(&self) -> Diffusivityf32 {
        let [xx, _, yy, _, _, zz] = self.0;
        (xx + yy + zz) / 3.0
    }

    /// Fractional anisotropy, in `[0, 1]`. Zero for the zero tensor.
    pub fn fa(&self) -> Ratiof32 {
        fractional_anisotropy(self.eigen().values)
    }

    /// Eigenvector of the largest eigenvalue: the fibre orientation
    pub fn principal_direction(&self) -> Vector { self.eigen().vectors[0] }

    /// Tensor ODF, the probability of diffusion along each vertex of
    /// `sphere`, written into `out`:
    ///
    /// `1 / (4π √(λ1 λ2 λ3) |Λ^(-1/2) Eᵀ u|³)`
    ///
    /// All zeros if the tensor has no positive eigenvalue.
    pub fn odf_into(&self, sphere: &Sphere, out: &mut [Weightf32]) {
        let Eigen { values, vectors } = self.eigen();
        if !self.is_finite() || values[0] <= 0.0 {
            out.fill(0.0);
            return
        }
        let values = values.map(|l| l.max(MIN_DIFFUSIVITY));
        let norm = 1.0 / (4.0 * PI * (values[0] * values[1] * values[2]).sqrt());
        let scale = values.map(|l| 1.0 / l.sqrt());
        for (o, u) in out.iter_mut().zip(sphere.vertices()) {
            let r2: f32 = (0..3)
                .map(|k| (scale[k] * vectors[k].dot(u)).powi(2))
                .sum();
            *o = norm / (r2 * r2.sqrt());
        }
    }
}

pub fn fractional_anisotropy([l1, l2, l3]: [Diffusivityf32; 3]) -> Ratiof32 {
    let denominator = (l1 * l1 + l2 * l2 + l3 * l3).sqrt();
    if denominator <= 0.0 || !denominator.is_finite() { return 0.0 }
    let numerator = ((l1 - l2).powi(2) + (l2 - l3).powi(2) + (l3 - l1).powi(2)).sqrt();
    (FRAC_1_SQRT_2 * numerator / denominator).clamp(0.0, 1.0)
}

// ----- Volumes of tensors ----------------------------------------------------

#[derive(Clone, Debug)]
pub struct TensorVolume {
    pub grid: Grid,
    data: Vec<Tensor>,
}

impl TensorVolume {

    /// `data` holds 6 components per voxel, voxel-major
    pub fn new(grid: Grid, data: Vec<Diffusivityf32>) -> Result<Self> {
        let expected = 6 * grid.n_voxels();
        if data.len() != expected {
            return Err(TractError::ShapeMismatch { dims: grid.n, expected, actual: data.len() })
        }
        let data = data.chunks_exact(6)
            .map(|c| Tensor([c[0], c[1], c[2], c[3], c[4], c[5]]))
            .collect();
        Ok(Self { grid, data })
    }

    pub fn from_tensors(grid: Grid, data: Vec<Tensor>) -> Result<Self> {
        if data.len() != grid.n_voxels() {
            return Err(TractError::ShapeMismatch { dims: grid.n, expected: grid.n_voxels(), actual: data.len() })
        }
        Ok(Self { grid, data })
    }

    pub fn from_raw_file(grid: Grid, path: &Path) -> Result<Self> {
        Self::new(grid, io::raw::read_all(path)?)
    }

    pub fn write_to_raw_file(&self, path: &Path) -> Result<()> {
        io::raw::write(self.data.iter().flat_map(|t| t.0), path)?;
        Ok(())
    }

    pub fn tensors(&self) -> &[Tensor] { &self.data }

    pub fn fa(&self) -> ScalarVolume {
        self.map(Tensor::fa)
    }

    pub fn mean_diffusivity(&self) -> ScalarVolume {
        self.map(|t| t.mean_diffusivity())
    }

    fn map(&self, f: impl Fn(&Tensor) -> f32 + Sync + Send) -> ScalarVolume {
        #[cfg    (feature = "serial") ] let iter = self.data.    iter();
        #[cfg(not(feature = "serial"))] let iter = self.data.par_iter();
        ScalarVolume { grid: self.grid, data: iter.map(f).collect() }
    }

    /// Tensor ODF of every voxel, sampled on `sphere`
    pub fn pmf(&self, sphere: Sphere) -> Result<PmfVolume> {
        let n = sphere.len();
        let mut data = vec![0.0; n * self.data.len()];

        #[cfg    (feature = "serial") ] let chunks = data.    chunks_mut(n);
        #[cfg(not(feature = "serial"))] let chunks = data.par_chunks_mut(n);

        chunks.zip(&self.data)
              .for_each(|(out, tensor)| tensor.odf_into(&sphere, out));
        PmfVolume::new(self.grid, sphere, data)
    }
}

// ----- Imports ------------------------------------------------------------------------------------------
use std::f32::consts::{FRAC_1_SQRT_2, PI};
use std::path::Path;

use nalgebra::{Matrix3, SymmetricEigen};
use ordered_float::OrderedFloat;
#[cfg(not(feature = "serial"))]
use rayon::prelude::*;

use crate::{Diffusivityf32, Ratiof32, Vector, Weightf32};
use crate::grid::Grid;
use crate::pmf::PmfVolume;
use crate::sphere::Sphere;
use crate::volume::ScalarVolume;
use crate::error::{Result, TractError};
use crate::io;
