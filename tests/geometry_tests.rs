//! Integration tests for mesh generation.

use std::collections::HashMap;

use glam::{Vec3, Vec4};
use sonosphere::geometry::{DrawMode, Icosphere, MeshError};
use sonosphere::scene::{SceneGeometry, SceneKey};

#[test]
fn test_generation_is_deterministic() {
    let a = Icosphere::new(Vec3::ZERO, 1.0, 3).unwrap().build();
    let b = Icosphere::new(Vec3::ZERO, 1.0, 3).unwrap().build();
    assert_eq!(a.indices, b.indices);
    assert_eq!(a.positions, b.positions);
    assert_eq!(a.normals, b.normals);
}

#[test]
fn test_counts_follow_closed_form() {
    for level in 0..=4 {
        let mesh = Icosphere::new(Vec3::ZERO, 1.0, level).unwrap().build();
        let n = 4usize.pow(level as u32);
        assert_eq!(mesh.triangle_count(), 20 * n, "level {level}");
        assert_eq!(mesh.vertex_count(), 10 * n + 2, "level {level}");
        assert!(mesh.validate());
    }
}

#[test]
fn test_midpoints_are_shared_between_neighbours() {
    // A closed surface with no duplicated vertices uses every edge twice.
    let mesh = Icosphere::new(Vec3::ZERO, 1.0, 2).unwrap().build();
    let mut edges: HashMap<(u32, u32), u32> = HashMap::new();
    for t in 0..mesh.triangle_count() {
        let [a, b, c] = mesh.triangle(t);
        for (u, v) in [(a, b), (b, c), (c, a)] {
            *edges.entry((u.min(v), u.max(v))).or_default() += 1;
        }
    }
    assert!(edges.values().all(|&count| count == 2));

    let v = mesh.vertex_count() as i64;
    let e = edges.len() as i64;
    let f = mesh.triangle_count() as i64;
    assert_eq!(v - e + f, 2);
}

#[test]
fn test_normals_are_unit_and_positions_lie_on_sphere() {
    let center = Vec3::new(1.0, -2.0, 0.5);
    let radius = 2.5;
    let mesh = Icosphere::new(center, radius, 3).unwrap().build();

    for (position, normal) in mesh.positions.iter().zip(&mesh.normals) {
        let n = Vec4::from_array(*normal);
        assert!((n.truncate().length() - 1.0).abs() < 1e-5);
        assert_eq!(n.w, 0.0);

        let expected = center.extend(1.0) + n * radius;
        let actual = Vec4::from_array(*position);
        assert!((actual - expected).abs().max_element() < 1e-5);
    }
}

#[test]
fn test_invalid_arguments_are_rejected() {
    assert!(matches!(
        Icosphere::new(Vec3::ZERO, 1.0, -1),
        Err(MeshError::InvalidArgument { .. })
    ));
    assert!(matches!(
        Icosphere::new(Vec3::ZERO, 0.0, 1),
        Err(MeshError::InvalidArgument { .. })
    ));
}

#[test]
fn test_scene_uses_both_draw_modes() {
    let scene = SceneGeometry::build(SceneKey {
        tesselations: 1,
        separation: 0.5,
    })
    .unwrap();
    assert_eq!(scene.inner.draw_mode, DrawMode::Triangles);
    assert_eq!(scene.inner.triangle_count(), 80);
    assert_eq!(scene.outer.draw_mode, DrawMode::LineStrip);

    for position in &scene.outer.positions {
        let radius = Vec4::from_array(*position).truncate().length();
        assert!((radius - 1.5).abs() < 1e-5);
    }
}
