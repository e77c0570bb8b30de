//! Per-voxel probability mass over the directions of a `Sphere`.

use std::path::Path;

use ndarray::{azip, Array2, ArrayView1, ArrayViewMut1};

use crate::{Point, Weightf32};
use crate::grid::Grid;
use crate::index::Index1_u;
use crate::sphere::Sphere;
use crate::error::{Result, TractError};
use crate::io;

/// ODF samples on a grid, clipped to be usable as (unnormalized) probability
/// masses. Row `i` holds the weights of voxel `i` for every vertex of
/// `sphere`, in vertex order.
#[derive(Clone, Debug)]
pub struct PmfVolume {
    pub grid: Grid,
    pub sphere: Sphere,
    data: Array2<Weightf32>,
}

impl PmfVolume {

    /// `data` is voxel-major: all weights of voxel 0, then voxel 1, ...
    /// Negative and non-finite weights are replaced by zero.
    pub fn new(grid: Grid, sphere: Sphere, data: Vec<Weightf32>) -> Result<Self> {
        let n_voxels = grid.n_voxels();
        let n_dirs = sphere.len();
        let expected = n_voxels * n_dirs;
        if data.len() != expected {
            return Err(TractError::ShapeMismatch { dims: grid.n, expected, actual: data.len() })
        }
        let mut data = Array2::from_shape_vec((n_voxels, n_dirs), data)
            .map_err(|_| TractError::ShapeMismatch { dims: grid.n, expected, actual: expected })?;
        data.mapv_inplace(|w| if w.is_finite() { w.max(0.0) } else { 0.0 });
        Ok(Self { grid, sphere, data })
    }

    /// Equal mass on every direction in every voxel
    pub fn uniform(grid: Grid, sphere: Sphere) -> Self {
        let data = Array2::from_elem((grid.n_voxels(), sphere.len()), 1.0);
        Self { grid, sphere, data }
    }

    pub fn from_raw_file(grid: Grid, sphere: Sphere, path: &Path) -> Result<Self> {
        Self::new(grid, sphere, io::raw::read_all(path)?)
    }

    pub fn write_to_raw_file(&self, path: &Path) -> Result<()> {
        io::raw::write(self.data.iter().copied(), path)?;
        Ok(())
    }

    pub fn n_directions(&self) -> usize { self.sphere.len() }

    pub fn voxel(&self, i: Index1_u) -> ArrayView1<Weightf32> { self.data.row(i) }

    /// A buffer of the right size for `interpolate_into`. Allocating these
    /// anew for every step has a noticeable cost, so callers keep one per
    /// seed and reuse it.
    pub fn buffer(&self) -> Vec<Weightf32> { vec![0.0; self.n_directions()] }

    /// Trilinear interpolation of the weights at world-space `p`, written into
    /// `out`. Returns `false` (leaving `out` untouched) if `p` lies outside the
    /// grid.
    pub fn interpolate_into(&self, p: &Point, out: &mut [Weightf32]) -> bool {
        let Some(hood) = self.grid.trilinear_neighbourhood(p) else { return false };
        let mut out = ArrayViewMut1::from(out);
        out.fill(0.0);
        for (i, w) in hood {
            if w > 0.0 {
                azip!((o in &mut out, &x in &self.data.row(i)) *o += w * x);
            }
        }
        true
    }
}
