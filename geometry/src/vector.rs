use units::{Angle, radian};

/// Positions and displacements in 3D. Components are plain `f32`s interpreted
/// as `mm` in world space, or as fractional voxel indices in voxel space.
pub type Point  = nalgebra::Point3 <f32>;
pub type Vector = nalgebra::Vector3<f32>;

/// Angle between two non-zero vectors, in `[0, π]`.
pub fn angle_between(a: &Vector, b: &Vector) -> Angle {
    let cos = a.dot(b) / (a.norm() * b.norm());
    // Rounding can push the cosine of (anti)parallel vectors just outside [-1, 1]
    radian(cos.clamp(-1.0, 1.0).acos())
}

/// Normalized copy of `v`, or `None` if `v` is zero or not finite.
pub fn unit_or_none(v: Vector) -> Option<Vector> {
    let n = v.norm();
    if n.is_finite() && n > f32::EPSILON { Some(v / n) }
    else                                 { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use float_eq::assert_float_eq;
    use units::degree_;

    #[rstest(/**/     a       ,       b       , expected,
             case([1.,0.,0.], [1.,0.,0.],     0.0),
             case([1.,0.,0.], [0.,1.,0.],    90.0),
             case([1.,0.,0.], [-1.,0.,0.],  180.0),
             case([1.,1.,0.], [1.,0.,0.],    45.0),
             case([2.,0.,0.], [0.,0.,7.],    90.0),
    )]
    fn angles(a: [f32; 3], b: [f32; 3], expected: f32) {
        let angle = angle_between(&Vector::from(a), &Vector::from(b));
        assert_float_eq!(degree_(angle), expected, abs <= 1e-3);
    }

    #[test]
    fn unit_of_zero_is_none() {
        assert_eq!(unit_or_none(Vector::zeros()), None);
        assert_eq!(unit_or_none(Vector::new(f32::NAN, 0.0, 0.0)), None);
    }

    #[test]
    fn unit_has_length_one() {
        let u = unit_or_none(Vector::new(3.0, 4.0, 12.0)).unwrap();
        assert_float_eq!(u.norm(), 1.0, ulps <= 2);
        assert_float_eq!(u.x, 3.0 / 13.0, ulps <= 2);
    }
}
