//! Subdivided icosahedron.
//!
//! Starts from the 12 vertices and 20 faces of a regular icosahedron and
//! splits every face into four per subdivision round. Edge midpoints are
//! pushed back onto the unit sphere and shared between the two faces that
//! border the edge, so the vertex count follows `10 * 4^L + 2` exactly.

use std::collections::HashMap;

use glam::Vec3;

use super::mesh::{DrawMode, Mesh, MeshError};

/// Highest accepted subdivision level (about 21M triangles).
pub const MAX_SUBDIVISIONS: u32 = 10;

const X: f32 = 0.525_731_1;
const Z: f32 = 0.850_650_8;

const BASE_VERTICES: [[f32; 3]; 12] = [
    [-X, 0.0, Z],
    [X, 0.0, Z],
    [-X, 0.0, -Z],
    [X, 0.0, -Z],
    [0.0, Z, X],
    [0.0, Z, -X],
    [0.0, -Z, X],
    [0.0, -Z, -X],
    [Z, X, 0.0],
    [-Z, X, 0.0],
    [Z, -X, 0.0],
    [-Z, -X, 0.0],
];

const BASE_TRIANGLES: [[u32; 3]; 20] = [
    [0, 4, 1],
    [0, 9, 4],
    [9, 5, 4],
    [4, 5, 8],
    [4, 8, 1],
    [8, 10, 1],
    [8, 3, 10],
    [5, 3, 8],
    [5, 2, 3],
    [2, 7, 3],
    [7, 10, 3],
    [7, 6, 10],
    [7, 11, 6],
    [11, 0, 6],
    [0, 1, 6],
    [6, 1, 10],
    [9, 0, 11],
    [9, 11, 2],
    [9, 2, 5],
    [7, 2, 11],
];

/// Icosphere description. Call [`Icosphere::build`] to generate the mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Icosphere {
    center: Vec3,
    radius: f32,
    subdivisions: u32,
    draw_mode: DrawMode,
}

impl Icosphere {
    /// Validate the parameters of a new icosphere.
    ///
    /// Negative or excessive subdivision levels and radii that are not
    /// strictly positive are rejected.
    pub fn new(center: Vec3, radius: f32, subdivisions: i32) -> Result<Self, MeshError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(MeshError::InvalidArgument {
                what: "radius",
                value: radius.to_string(),
            });
        }
        let subdivisions = u32::try_from(subdivisions)
            .ok()
            .filter(|&level| level <= MAX_SUBDIVISIONS)
            .ok_or_else(|| MeshError::InvalidArgument {
                what: "subdivision level",
                value: subdivisions.to_string(),
            })?;

        Ok(Self {
            center,
            radius,
            subdivisions,
            draw_mode: DrawMode::Triangles,
        })
    }

    pub fn with_draw_mode(mut self, draw_mode: DrawMode) -> Self {
        self.draw_mode = draw_mode;
        self
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn subdivisions(&self) -> u32 {
        self.subdivisions
    }

    /// Triangle count after all subdivision rounds: `20 * 4^L`.
    pub fn triangle_count(&self) -> usize {
        20 * 4usize.pow(self.subdivisions)
    }

    /// Vertex count after all subdivision rounds: `10 * 4^L + 2`.
    pub fn vertex_count(&self) -> usize {
        10 * 4usize.pow(self.subdivisions) + 2
    }

    /// Generate the mesh.
    ///
    /// Output is deterministic: midpoints are appended in the order their
    /// edge is first met while walking the previous round's triangles.
    pub fn build(&self) -> Mesh {
        let mut directions: Vec<Vec3> = Vec::with_capacity(self.vertex_count());
        directions.extend(BASE_VERTICES.iter().map(|&v| Vec3::from_array(v)));

        let mut triangles: Vec<[u32; 3]> = Vec::with_capacity(self.triangle_count());
        let mut next: Vec<[u32; 3]> = Vec::with_capacity(self.triangle_count());
        triangles.extend_from_slice(&BASE_TRIANGLES);

        for _ in 0..self.subdivisions {
            let mut midpoints = MidpointCache::with_capacity(triangles.len() * 3 / 2);
            next.clear();

            for &[v0, v1, v2] in &triangles {
                let m01 = midpoints.get_or_insert(v0, v1, &mut directions);
                let m12 = midpoints.get_or_insert(v1, v2, &mut directions);
                let m20 = midpoints.get_or_insert(v2, v0, &mut directions);

                next.push([v0, m01, m20]);
                next.push([m01, m12, m20]);
                next.push([m01, v1, m12]);
                next.push([m20, m12, v2]);
            }

            std::mem::swap(&mut triangles, &mut next);
        }

        let center = self.center.extend(1.0);
        let normals: Vec<[f32; 4]> = directions
            .iter()
            .map(|dir| dir.extend(0.0).to_array())
            .collect();
        let positions: Vec<[f32; 4]> = directions
            .iter()
            .map(|dir| (center + dir.extend(0.0) * self.radius).to_array())
            .collect();

        log::debug!("Created icosphere with {} vertices", positions.len());

        Mesh {
            indices: bytemuck::cast_slice::<[u32; 3], u32>(&triangles).to_vec(),
            positions,
            normals,
            draw_mode: self.draw_mode,
        }
    }
}

/// Midpoint vertex per undirected edge, scoped to one subdivision round.
struct MidpointCache {
    edges: HashMap<(u32, u32), u32>,
}

impl MidpointCache {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            edges: HashMap::with_capacity(capacity),
        }
    }

    fn get_or_insert(&mut self, a: u32, b: u32, directions: &mut Vec<Vec3>) -> u32 {
        let key = if a < b { (a, b) } else { (b, a) };
        *self.edges.entry(key).or_insert_with(|| {
            let mid = (directions[a as usize] + directions[b as usize]).normalize();
            directions.push(mid);
            (directions.len() - 1) as u32
        })
    }
}
