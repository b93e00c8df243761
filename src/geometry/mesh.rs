//! Packed mesh buffers shared by all generated shapes.

use thiserror::Error;

/// Errors raised while constructing geometry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error("Invalid {what}: {value}")]
    InvalidArgument { what: &'static str, value: String },
}

/// How a mesh's index buffer is assembled into primitives.
///
/// This is a rendering hint only; the index buffer always stores triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrawMode {
    Points,
    Lines,
    LineStrip,
    #[default]
    Triangles,
}

impl DrawMode {
    pub const ALL: [DrawMode; 4] = [
        DrawMode::Points,
        DrawMode::Lines,
        DrawMode::LineStrip,
        DrawMode::Triangles,
    ];

    /// Slot of this mode inside [`DrawMode::ALL`].
    pub fn index(self) -> usize {
        match self {
            DrawMode::Points => 0,
            DrawMode::Lines => 1,
            DrawMode::LineStrip => 2,
            DrawMode::Triangles => 3,
        }
    }

    pub fn topology(self) -> wgpu::PrimitiveTopology {
        match self {
            DrawMode::Points => wgpu::PrimitiveTopology::PointList,
            DrawMode::Lines => wgpu::PrimitiveTopology::LineList,
            DrawMode::LineStrip => wgpu::PrimitiveTopology::LineStrip,
            DrawMode::Triangles => wgpu::PrimitiveTopology::TriangleList,
        }
    }
}

/// Immutable geometry snapshot ready for upload.
///
/// `positions` and `normals` hold four floats per vertex, `indices` three
/// vertex indices per triangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub indices: Vec<u32>,
    pub positions: Vec<[f32; 4]>,
    pub normals: Vec<[f32; 4]>,
    pub draw_mode: DrawMode,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of indices submitted per draw call.
    pub fn element_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Triangle `t` as an index triple.
    pub fn triangle(&self, t: usize) -> [u32; 3] {
        let base = t * 3;
        [self.indices[base], self.indices[base + 1], self.indices[base + 2]]
    }

    /// Check the structural invariants every generator must uphold.
    pub fn validate(&self) -> bool {
        self.indices.len() % 3 == 0
            && self.positions.len() == self.normals.len()
            && self
                .indices
                .iter()
                .all(|&i| (i as usize) < self.positions.len())
    }

    pub fn with_draw_mode(mut self, draw_mode: DrawMode) -> Self {
        self.draw_mode = draw_mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_mesh() -> Mesh {
        Mesh {
            indices: vec![0, 1, 2],
            positions: vec![
                [0.0, 0.0, 0.0, 1.0],
                [1.0, 0.0, 0.0, 1.0],
                [0.0, 1.0, 0.0, 1.0],
            ],
            normals: vec![[0.0, 0.0, 1.0, 0.0]; 3],
            draw_mode: DrawMode::Triangles,
        }
    }

    #[test]
    fn test_counts() {
        let mesh = triangle_mesh();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.element_count(), 3);
        assert_eq!(mesh.triangle(0), [0, 1, 2]);
        assert!(mesh.validate());
    }

    #[test]
    fn test_validate_rejects_out_of_range_index() {
        let mut mesh = triangle_mesh();
        mesh.indices[2] = 3;
        assert!(!mesh.validate());
    }

    #[test]
    fn test_draw_mode_slots_are_unique() {
        for (slot, mode) in DrawMode::ALL.iter().enumerate() {
            assert_eq!(mode.index(), slot);
        }
        assert_eq!(
            DrawMode::LineStrip.topology(),
            wgpu::PrimitiveTopology::LineStrip
        );
    }
}
