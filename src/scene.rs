//! The two-sphere scene: a solid inner icosphere inside a wireframe shell.

use glam::Vec3;

use crate::controls::Controls;
use crate::geometry::{DrawMode, Icosphere, Mesh, MeshError};

/// Subdivision level of the outer wireframe.
pub const OUTER_SUBDIVISIONS: i32 = 3;

/// Control values that require new geometry when they change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneKey {
    pub tesselations: u32,
    pub separation: f32,
}

impl SceneKey {
    pub fn from_controls(controls: &Controls) -> Self {
        Self {
            tesselations: controls.tesselations,
            separation: controls.separation,
        }
    }
}

/// CPU meshes of one scene build.
#[derive(Debug, Clone)]
pub struct SceneGeometry {
    pub key: SceneKey,
    /// Unit sphere drawn with the fire program.
    pub inner: Mesh,
    /// Line-strip shell drawn with the line program.
    pub outer: Mesh,
}

impl SceneGeometry {
    pub fn build(key: SceneKey) -> Result<Self, MeshError> {
        let tesselations = i32::try_from(key.tesselations).map_err(|_| MeshError::InvalidArgument {
            what: "subdivision level",
            value: key.tesselations.to_string(),
        })?;

        let inner = Icosphere::new(Vec3::ZERO, 1.0, tesselations)?
            .with_draw_mode(DrawMode::Triangles)
            .build();
        let outer = Icosphere::new(Vec3::ZERO, 1.0 + key.separation, OUTER_SUBDIVISIONS)?
            .with_draw_mode(DrawMode::LineStrip)
            .build();

        log::info!(
            "Scene built: inner {} triangles, outer radius {:.2}",
            inner.triangle_count(),
            1.0 + key.separation
        );
        Ok(Self { key, inner, outer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_layout() {
        let scene = SceneGeometry::build(SceneKey {
            tesselations: 2,
            separation: 0.1,
        })
        .unwrap();

        assert_eq!(scene.inner.draw_mode, DrawMode::Triangles);
        assert_eq!(scene.inner.triangle_count(), 320);
        assert_eq!(scene.outer.draw_mode, DrawMode::LineStrip);
        assert_eq!(scene.outer.triangle_count(), 1280);

        let p = scene.outer.positions[0];
        let radius = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
        assert!((radius - 1.1).abs() < 1e-5);
    }

    #[test]
    fn test_key_tracks_geometry_controls_only() {
        let mut controls = Controls::default();
        let key = SceneKey::from_controls(&controls);
        controls.scale = 4.0;
        assert_eq!(SceneKey::from_controls(&controls), key);
        controls.tesselations = 3;
        assert_ne!(SceneKey::from_controls(&controls), key);
    }
}
