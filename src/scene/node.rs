use std::sync::atomic::{AtomicU64, Ordering};

use glam::Affine3A;

use crate::scene::NodeHandle;
use crate::scene::transform::Transform;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// A minimal scene node containing only essential hot data.
///
/// # Design Principles
///
/// - Only keeps data that must be traversed every frame (hierarchy,
///   transform, visibility gates)
/// - Other attributes (Mesh, Camera) live in the Scene's component maps
/// - Small, contiguous nodes keep the hierarchy walk cache-friendly
///
/// # Hierarchy
///
/// Nodes form a tree through parent/child links:
/// - `parent`: non-owning back-reference (None for root nodes)
/// - `children`: ordered list of owned child handles; child order is
///   insertion order and the renderer's tie-break order
///
/// # Visibility gates
///
/// - `enabled == false` prunes the whole subtree from traversal
/// - `visible == false` hides only this node's drawable, children still render
#[derive(Debug, Clone)]
pub struct Node {
    // === Core Hierarchy ===
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,

    // === Core Spatial Data ===
    /// Transform component (hot data accessed every frame)
    pub transform: Transform,

    // === Core State ===
    /// Drawable visibility flag
    pub visible: bool,
    /// Subtree gate: disabled nodes are skipped along with all descendants
    pub enabled: bool,

    /// Stable process-unique id, key of the Scene's O(1) id index
    id: u64,
    /// Display name, searchable via `Scene::find_node_by_name`
    pub name: String,
}

impl Node {
    /// Creates a new detached node with default transform.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
            visible: true,
            enabled: true,
            id: NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
        }
    }

    /// Stable unique id of this node.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the parent node handle, if any.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Returns a read-only slice of child node handles.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    /// Returns a reference to the world transformation matrix.
    ///
    /// Valid after the last hierarchy update ran over this node.
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.transform.world_matrix
    }

    /// Deep copy of the node's own data, detached from the hierarchy.
    ///
    /// Links and identity are not carried over: the copy has a fresh id, no
    /// parent and no children. Subtree duplication is
    /// [`Scene::clone_subtree`](crate::scene::Scene::clone_subtree).
    #[must_use]
    pub(crate) fn duplicate(&self) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            transform: self.transform.clone(),
            visible: self.visible,
            enabled: self.enabled,
            id: NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed),
            name: self.name.clone(),
        }
    }
}
