//! Scene graph system
//!
//! Manages the hierarchy and its per-node components:
//! - `Node`: scene node (parent/child links, transform, visibility gates)
//! - `Transform`: TRS component with matrix caching and dirty checks
//! - `Scene`: arena container with id index, traversal and cloning
//! - `Camera`: projection/view component
//! - `transform_system`: decoupled world-matrix propagation

pub mod camera;
pub mod node;
pub mod scene;
pub mod transform;
pub mod transform_system;

pub use camera::{Camera, Projection};
pub use node::Node;
pub use scene::{NodeBuilder, Scene};
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    /// Handle of a node inside a [`Scene`]'s arena.
    pub struct NodeHandle;
}
