//! The fixed, discrete set of unit directions over which ODFs and PMFs are
//! defined.

use std::collections::HashMap;

use crate::Vector;
use crate::error::{Result, TractError};

/// Finest icosphere accepted from configuration: 163842 vertices
pub const MAX_SUBDIVISIONS: u32 = 7;

#[derive(Clone, Debug)]
pub struct Sphere {
    vertices: Vec<Vector>,
}

impl Sphere {

    /// Directions are normalized. Zero-length or non-finite directions are
    /// rejected rather than silently dropped, because PMF volumes are indexed
    /// by vertex position.
    pub fn new(vertices: Vec<Vector>) -> Result<Self> {
        if vertices.is_empty() { return Err(TractError::EmptySphere) }
        let vertices = vertices.into_iter()
            .enumerate()
            .map(|(n, v)| geometry::unit_or_none(v).ok_or(TractError::InvalidSphereVertex(n)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { vertices })
    }

    /// Geodesic sphere made by repeatedly subdividing the faces of an
    /// icosahedron: `10 * 4^subdivisions + 2` vertices, in antipodal pairs.
    pub fn icosphere(subdivisions: u32) -> Self {
        let (mut vertices, mut faces) = icosahedron();
        for _ in 0..subdivisions {
            let mut midpoints = HashMap::<(usize, usize), usize>::new();
            let mut midpoint = |a: usize, b: usize, vertices: &mut Vec<Vector>| {
                let key = (a.min(b), a.max(b));
                *midpoints.entry(key).or_insert_with(|| {
                    vertices.push((vertices[a] + vertices[b]).normalize());
                    vertices.len() - 1
                })
            };
            faces = faces.into_iter()
                .flat_map(|[a, b, c]| {
                    let ab = midpoint(a, b, &mut vertices);
                    let bc = midpoint(b, c, &mut vertices);
                    let ca = midpoint(c, a, &mut vertices);
                    [[a, ab, ca], [b, bc, ab], [c, ca, bc], [ab, bc, ca]]
                })
                .collect();
        }
        Self { vertices }
    }

    pub fn len(&self) -> usize { self.vertices.len() }
    pub fn is_empty(&self) -> bool { self.vertices.is_empty() }

    pub fn vertices(&self) -> &[Vector] { &self.vertices }
    pub fn vertex(&self, k: usize) -> Vector { self.vertices[k] }

    /// Index of the vertex closest in angle to `direction`
    pub fn nearest_vertex(&self, direction: &Vector) -> usize {
        use ordered_float::OrderedFloat;
        self.vertices.iter()
            .enumerate()
            .max_by_key(|(_, v)| OrderedFloat(v.dot(direction)))
            .map(|(k, _)| k)
            .unwrap_or(0)
    }
}

type Faces = Vec<[usize; 3]>;

fn icosahedron() -> (Vec<Vector>, Faces) {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let vertices = [
        [-1.0,  t ,  0.0], [ 1.0,  t ,  0.0], [-1.0, -t ,  0.0], [ 1.0, -t ,  0.0],
        [ 0.0, -1.0,  t ], [ 0.0,  1.0,  t ], [ 0.0, -1.0, -t ], [ 0.0,  1.0, -t ],
        [  t , 0.0, -1.0], [  t , 0.0,  1.0], [ -t , 0.0, -1.0], [ -t , 0.0,  1.0],
    ].into_iter()
        .map(|v| Vector::from(v).normalize())
        .collect();
    let faces = vec![
        [0, 11,  5], [0,  5,  1], [ 0,  1,  7], [ 0,  7, 10], [0, 10, 11],
        [1,  5,  9], [5, 11,  4], [11, 10,  2], [10,  7,  6], [7,  1,  8],
        [3,  9,  4], [3,  4,  2], [ 3,  2,  6], [ 3,  6,  8], [3,  8,  9],
        [4,  9,  5], [2,  4, 11], [ 6,  2, 10], [ 8,  6,  7], [9,  8,  1],
    ];
    (vertices, faces)
}
