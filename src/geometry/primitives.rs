//! Fixed-topology shapes.

use glam::Vec3;

use super::mesh::{DrawMode, Mesh};

/// Quad spanning `[-1, 1]` in x and y around `center`, facing +Z.
///
/// Centered at the origin it covers clip space, which is what the blur and
/// composite passes draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Square {
    center: Vec3,
}

impl Square {
    pub fn new(center: Vec3) -> Self {
        Self { center }
    }

    pub fn build(&self) -> Mesh {
        let c = self.center;
        let corners = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];

        Mesh {
            indices: vec![0, 1, 2, 0, 2, 3],
            positions: corners
                .iter()
                .map(|[x, y]| [c.x + x, c.y + y, c.z, 1.0])
                .collect(),
            normals: vec![[0.0, 0.0, 1.0, 0.0]; 4],
            draw_mode: DrawMode::Triangles,
        }
    }
}

/// Axis-aligned cube with half-extent 1 and one normal per face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cube {
    center: Vec3,
}

// (normal, tangent u, tangent v) with u x v == normal so faces wind CCW.
const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
];

impl Cube {
    pub fn new(center: Vec3) -> Self {
        Self { center }
    }

    pub fn build(&self) -> Mesh {
        let mut indices = Vec::with_capacity(36);
        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);

        for (face, (normal, u, v)) in FACES.iter().enumerate() {
            let n = Vec3::from_array(*normal);
            let u = Vec3::from_array(*u);
            let v = Vec3::from_array(*v);

            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let p = self.center + n + u * su + v * sv;
                positions.push(p.extend(1.0).to_array());
                normals.push(n.extend(0.0).to_array());
            }

            let base = (face * 4) as u32;
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Mesh {
            indices,
            positions,
            normals,
            draw_mode: DrawMode::Triangles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_covers_clip_space() {
        let mesh = Square::new(Vec3::ZERO).build();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.validate());
        assert_eq!(mesh.positions[0], [-1.0, -1.0, 0.0, 1.0]);
        assert_eq!(mesh.positions[2], [1.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_cube_faces_point_outward() {
        let center = Vec3::new(0.5, 0.0, -2.0);
        let mesh = Cube::new(center).build();
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.validate());

        for t in 0..mesh.triangle_count() {
            let [a, b, c] = mesh.triangle(t).map(|i| {
                let p = mesh.positions[i as usize];
                Vec3::new(p[0], p[1], p[2])
            });
            let face_normal = (b - a).cross(c - a).normalize();
            let n = mesh.normals[mesh.triangle(t)[0] as usize];
            let stored = Vec3::new(n[0], n[1], n[2]);
            assert!((face_normal - stored).length() < 1e-5, "triangle {t} winds inward");
            assert!((a - center).dot(stored) > 0.0);
        }
    }
}
