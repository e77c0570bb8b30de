//! The size of a voxelized volume and its placement in the world, via an
//! affine transform.

use crate::{Affine, Point, Weightf32};
use crate::index::{BoxDim_u, Index1_u, Index3_u, index1_to_3, index3_to_1, n_voxels};
use crate::error::{Result, TractError};

/// Voxel `i` covers voxel coordinates `[i - 0.5, i + 0.5]` along each axis: the
/// affine maps integer voxel coordinates to voxel *centres*.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid {
    pub n: BoxDim_u,
    pub affine: Affine,
}

/// The 8 voxels surrounding a point, with their trilinear interpolation weights
pub type Neighbourhood = [(Index1_u, Weightf32); 8];

impl Grid {

    pub fn new(n: BoxDim_u, affine: Affine) -> Result<Self> {
        if n.iter().any(|&d| d == 0) { return Err(TractError::EmptyGrid(n)) }
        Ok(Self { n, affine })
    }

    pub fn n_voxels(&self) -> usize { n_voxels(self.n) }

    /// Find centre of voxel with given 3D index
    pub fn voxel_centre(&self, [i, j, k]: Index3_u) -> Point {
        self.affine.to_world(&Point::new(i as f32, j as f32, k as f32))
    }

    /// Find centre of voxel with given 1D index
    pub fn voxel_centre1(&self, i: Index1_u) -> Point {
        self.voxel_centre(index1_to_3(i, self.n))
    }

    pub fn to_voxel(&self, p: &Point) -> Point { self.affine.to_voxel(p) }

    /// Is the voxel-space position `v` inside the volume covered by the grid?
    pub fn contains_voxel_coords(&self, v: &Point) -> bool {
        (0..3).all(|d| v[d] >= -0.5 && v[d] <= self.n[d] as f32 - 0.5)
    }

    /// Is the world-space position `p` inside the volume covered by the grid?
    pub fn contains(&self, p: &Point) -> bool {
        self.contains_voxel_coords(&self.to_voxel(p))
    }

    /// Index of the voxel containing world-space `p`
    pub fn nearest_index(&self, p: &Point) -> Option<Index3_u> {
        let v = self.to_voxel(p);
        if !self.contains_voxel_coords(&v) { return None }
        let axis = |d: usize| (v[d].round().max(0.0) as usize).min(self.n[d] - 1);
        Some([axis(0), axis(1), axis(2)])
    }

    /// 1D indices and weights of the 8 voxels whose centres surround `p`.
    ///
    /// Within half a voxel of the boundary, positions are clamped onto the
    /// outermost voxel centres, so edge values are replicated rather than
    /// fading to zero. `None` outside the grid.
    pub fn trilinear_neighbourhood(&self, p: &Point) -> Option<Neighbourhood> {
        let v = self.to_voxel(p);
        if !self.contains_voxel_coords(&v) { return None }

        let mut lo = [0; 3];
        let mut hi = [0; 3];
        let mut t  = [0.0; 3];
        for d in 0..3 {
            let last = self.n[d] - 1;
            let f = v[d].clamp(0.0, last as f32);
            lo[d] = (f.floor() as usize).min(last);
            hi[d] = (lo[d] + 1).min(last);
            t [d] = f - lo[d] as f32;
        }

        let mut out = [(0, 0.0); 8];
        for (corner, slot) in out.iter_mut().enumerate() {
            let mut index  = [0; 3];
            let mut weight = 1.0;
            for d in 0..3 {
                if corner >> d & 1 == 1 { index[d] = hi[d]; weight *=       t[d]  }
                else                    { index[d] = lo[d]; weight *= 1.0 - t[d]  }
            }
            *slot = (index3_to_1(index, self.n), weight);
        }
        Some(out)
    }
}
