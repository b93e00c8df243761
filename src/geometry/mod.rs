//! Procedural geometry.
//!
//! Every shape produces the same [`Mesh`] layout: packed `u32` triangle
//! indices, homogeneous `vec4` positions (w = 1) and `vec4` normals (w = 0).
//!
//! - [`Icosphere`]: recursively subdivided icosahedron
//! - [`Square`]: full-screen quad used by the post-processing passes
//! - [`Cube`]: axis-aligned cube with flat face normals

mod icosphere;
mod mesh;
mod primitives;

pub use icosphere::{Icosphere, MAX_SUBDIVISIONS};
pub use mesh::{DrawMode, Mesh, MeshError};
pub use primitives::{Cube, Square};
