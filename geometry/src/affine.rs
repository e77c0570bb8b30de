//! Mapping between voxel-index space and physical (world) space.

use nalgebra::{Matrix3, Matrix4};
use units::{Length, mm_, todo::Lengthf32};

use crate::{Point, Vector};

/// 4x4 homogeneous transform taking voxel indices to world coordinates (mm).
///
/// The inverse is computed once, on construction, because every field lookup
/// during tracking needs it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine {
    to_world: Matrix4<f32>,
    to_voxel: Matrix4<f32>,
}

impl Affine {

    /// `None` if `matrix` is singular, not finite, or not affine (bottom row
    /// must be `[0, 0, 0, 1]`).
    pub fn new(matrix: Matrix4<f32>) -> Option<Self> {
        if matrix.iter().any(|x| !x.is_finite())      { return None }
        let bottom = [matrix[(3, 0)], matrix[(3, 1)], matrix[(3, 2)], matrix[(3, 3)]];
        if bottom != [0.0, 0.0, 0.0, 1.0]              { return None }
        let to_voxel = matrix.try_inverse()?;
        Some(Self { to_world: matrix, to_voxel })
    }

    pub fn from_rows(rows: [[f32; 4]; 4]) -> Option<Self> {
        Self::new(Matrix4::from_fn(|r, c| rows[r][c]))
    }

    pub fn identity() -> Self {
        Self { to_world: Matrix4::identity(), to_voxel: Matrix4::identity() }
    }

    /// Axis-aligned grid with the given voxel size, whose voxel `[0,0,0]` is
    /// centred at `origin`.
    pub fn scaling(voxel_size: (Length, Length, Length), origin: Point) -> Option<Self> {
        let (dx, dy, dz) = voxel_size;
        let mut m = Matrix4::new_nonuniform_scaling(&Vector::new(mm_(dx), mm_(dy), mm_(dz)));
        m[(0, 3)] = origin.x;
        m[(1, 3)] = origin.y;
        m[(2, 3)] = origin.z;
        Self::new(m)
    }

    pub fn matrix(&self) -> &Matrix4<f32> { &self.to_world }

    pub fn rows(&self) -> [[f32; 4]; 4] {
        let m = &self.to_world;
        [0, 1, 2, 3].map(|r| [m[(r, 0)], m[(r, 1)], m[(r, 2)], m[(r, 3)]])
    }

    pub fn to_world(&self, voxel: &Point) -> Point { self.to_world.transform_point(voxel) }
    pub fn to_voxel(&self, world: &Point) -> Point { self.to_voxel.transform_point(world) }

    /// Length of each voxel edge in world space.
    pub fn voxel_size(&self) -> [Lengthf32; 3] {
        let linear: Matrix3<f32> = self.to_world.fixed_view::<3, 3>(0, 0).clone_owned();
        [0, 1, 2].map(|c| linear.column(c).norm())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;
    use proptest::prelude::*;
    use units::mm;

    fn oblique() -> Affine {
        Affine::from_rows([[ 0.0, -2.0, 0.0,  10.0],
                           [ 2.0,  0.0, 0.0, -20.0],
                           [ 0.0,  0.0, 3.0,   5.0],
                           [ 0.0,  0.0, 0.0,   1.0]]).unwrap()
    }

    #[test]
    fn scaling_places_first_voxel_at_origin() {
        let a = Affine::scaling((mm(2.0), mm(2.0), mm(3.0)), Point::new(-5.0, 1.0, 0.0)).unwrap();
        let w = a.to_world(&Point::origin());
        assert_eq!(w, Point::new(-5.0, 1.0, 0.0));
        let w = a.to_world(&Point::new(1.0, 1.0, 1.0));
        assert_eq!(w, Point::new(-3.0, 3.0, 3.0));
        assert_eq!(a.voxel_size(), [2.0, 2.0, 3.0]);
    }

    #[test]
    fn singular_matrix_rejected() {
        let rows = [[1.0, 0.0, 0.0, 0.0],
                    [0.0, 0.0, 0.0, 0.0],
                    [0.0, 0.0, 1.0, 0.0],
                    [0.0, 0.0, 0.0, 1.0]];
        assert!(Affine::from_rows(rows).is_none());
    }

    #[test]
    fn projective_matrix_rejected() {
        let mut rows = Affine::identity().rows();
        rows[3][0] = 0.5;
        assert!(Affine::from_rows(rows).is_none());
    }

    #[test]
    fn voxel_size_of_rotated_grid() {
        let [dx, dy, dz] = oblique().voxel_size();
        assert_float_eq!((dx, dy, dz), (2.0, 2.0, 3.0), abs <= (1e-6, 1e-6, 1e-6));
    }

    proptest! {
        #[test]
        fn world_voxel_roundtrip(
            x in -100.0 .. (100.0 as f32),
            y in -100.0 .. (100.0 as f32),
            z in -100.0 .. (100.0 as f32),
        ) {
            let a = oblique();
            let p = Point::new(x, y, z);
            let back = a.to_world(&a.to_voxel(&p));
            assert_float_eq!((back.x, back.y, back.z), (x, y, z), abs <= (1e-3, 1e-3, 1e-3));
        }
    }
}
