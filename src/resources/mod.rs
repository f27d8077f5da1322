//! CPU-side resources
//!
//! Geometry, material and texture resources plus the `Mesh` drawable
//! component. All resources carry a [`ChangeTracker`] version; renderer
//! caches compare versions instead of polling contents.

pub mod geometry;
pub mod material;
pub mod mesh;
pub mod texture;
pub mod version_tracker;

pub use geometry::{BoundingBox, BoundingSphere, Geometry, IndexKind};
pub use material::{BlendMode, Material, ShaderSource};
pub use mesh::Mesh;
pub use texture::Texture;
pub use version_tracker::ChangeTracker;
