//! Transform system
//!
//! Hierarchical world-matrix propagation, decoupled from `Scene` so it only
//! borrows the node map, the camera components and the root list.
//!
//! The update is a pre-order walk (parent strictly before children, since a
//! child's world matrix is `parent.world * child.local`). Each node first
//! refreshes its local matrix through the transform's dirty check; the world
//! matrix is recomputed when the local matrix changed **or** any ancestor
//! recomputed. The `parent_changed` flag carried down the walk forces the
//! recompute onto every descendant of a changed ancestor, so no node below
//! a moved parent is ever skipped.

use glam::Affine3A;
use slotmap::{SlotMap, SparseSecondaryMap};

use crate::scene::NodeHandle;
use crate::scene::camera::Camera;
use crate::scene::node::Node;

/// Updates the world matrices of the whole hierarchy.
///
/// Iterative (explicit stack) so deeply nested scenes cannot overflow the
/// call stack. Children are pushed in reverse so they are processed in
/// insertion order.
pub fn update_hierarchy(
    nodes: &mut SlotMap<NodeHandle, Node>,
    cameras: &mut SparseSecondaryMap<NodeHandle, Camera>,
    roots: &[NodeHandle],
) {
    // Work stack: (node, parent world matrix, did an ancestor recompute)
    let mut stack: Vec<(NodeHandle, Affine3A, bool)> = Vec::with_capacity(64);

    for &root_handle in roots.iter().rev() {
        stack.push((root_handle, Affine3A::IDENTITY, false));
    }

    while let Some((node_handle, parent_world_matrix, parent_changed)) = stack.pop() {
        let Some(node) = nodes.get_mut(node_handle) else {
            continue;
        };

        let local_changed = node.transform.update_local_matrix();
        let world_needs_update = local_changed || parent_changed;

        if world_needs_update {
            // A root node's world matrix is exactly its local matrix
            // (parent_world_matrix is IDENTITY at depth 0).
            let new_world = parent_world_matrix * *node.transform.local_matrix();
            node.transform.set_world_matrix(new_world);

            if let Some(camera) = cameras.get_mut(node_handle) {
                camera.update_view(&new_world);
            }
        }

        let current_world = node.transform.world_matrix;
        let child_count = node.children.len();

        for i in (0..child_count).rev() {
            if let Some(node) = nodes.get(node_handle)
                && let Some(&child_handle) = node.children.get(i)
            {
                stack.push((child_handle, current_world, world_needs_update));
            }
        }
    }
}

/// Forces a world-matrix recompute of `root_handle` and its whole subtree.
///
/// The parent chain is not walked upward; the parent's current world matrix
/// is taken as-is. The renderer uses this to force-refresh the active camera
/// node each frame regardless of its dirty state.
pub fn update_subtree(
    nodes: &mut SlotMap<NodeHandle, Node>,
    cameras: &mut SparseSecondaryMap<NodeHandle, Camera>,
    root_handle: NodeHandle,
) {
    let parent_world = match nodes.get(root_handle) {
        Some(node) => match node.parent {
            Some(parent_handle) => nodes
                .get(parent_handle)
                .map_or(Affine3A::IDENTITY, |p| p.transform.world_matrix),
            None => Affine3A::IDENTITY,
        },
        None => return,
    };

    let mut stack: Vec<(NodeHandle, Affine3A)> = vec![(root_handle, parent_world)];

    while let Some((node_handle, parent_world_matrix)) = stack.pop() {
        let Some(node) = nodes.get_mut(node_handle) else {
            continue;
        };

        node.transform.update_local_matrix();
        let new_world = parent_world_matrix * *node.transform.local_matrix();
        node.transform.set_world_matrix(new_world);

        if let Some(camera) = cameras.get_mut(node_handle) {
            camera.update_view(&new_world);
        }

        let child_count = node.children.len();
        for i in (0..child_count).rev() {
            if let Some(node) = nodes.get(node_handle)
                && let Some(&child_handle) = node.children.get(i)
            {
                stack.push((child_handle, new_world));
            }
        }
    }
}
