use std::sync::atomic::{AtomicU32, Ordering};

use glam::Vec3;
use rustc_hash::FxHashMap;
use slotmap::{SlotMap, SparseSecondaryMap};

use crate::resources::mesh::Mesh;
use crate::scene::NodeHandle;
use crate::scene::camera::Camera;
use crate::scene::node::Node;
use crate::scene::transform_system;

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(1);

/// Hook invoked by the renderer around each frame; receives the frame index.
pub type FrameHook = Box<dyn FnMut(u64)>;

/// Scene graph container.
///
/// Pure data layer: nodes live in a slotmap arena, hierarchy is expressed
/// through parent/child handles, and per-node components (mesh, camera) sit
/// in sparse secondary maps keyed by the node handle. An id index maps each
/// node's stable [`Node::id`] to its handle in O(1) and is kept exactly in
/// sync with the arena: every reachable node appears exactly once, removed
/// subtrees disappear from it wholesale.
pub struct Scene {
    pub id: u32,

    pub nodes: SlotMap<NodeHandle, Node>,
    pub root_nodes: Vec<NodeHandle>,

    // ==== Components ====
    pub meshes: SparseSecondaryMap<NodeHandle, Mesh>,
    pub cameras: SparseSecondaryMap<NodeHandle, Camera>,

    pub active_camera: Option<NodeHandle>,

    /// Clear color the renderer applies when auto-clear is on (RGBA).
    pub background: Option<glam::Vec4>,

    /// Optional frame hooks; the renderer tolerates their absence.
    pub on_before_render: Option<FrameHook>,
    pub on_after_render: Option<FrameHook>,

    // Stable-id -> handle index for O(1) lookup at any depth.
    id_index: FxHashMap<u64, NodeHandle>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed),

            nodes: SlotMap::with_key(),
            root_nodes: Vec::new(),
            meshes: SparseSecondaryMap::new(),
            cameras: SparseSecondaryMap::new(),

            active_camera: None,
            background: Some(glam::Vec4::new(0.0, 0.0, 0.0, 1.0)),

            on_before_render: None,
            on_after_render: None,

            id_index: FxHashMap::default(),
        }
    }

    // ========================================================================
    // Node creation & removal
    // ========================================================================

    /// Starts building a node with the fluent builder.
    pub fn build_node(&'_ mut self, name: &str) -> NodeBuilder<'_> {
        NodeBuilder::new(self, name)
    }

    pub fn create_node(&mut self) -> NodeHandle {
        self.add_node(Node::new("Node"))
    }

    pub fn create_node_with_name(&mut self, name: &str) -> NodeHandle {
        self.add_node(Node::new(name))
    }

    /// Adds a node as a root of the scene.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let id = node.id();
        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        self.id_index.insert(id, handle);
        handle
    }

    /// Adds a node directly under `parent_handle`.
    pub fn add_to_parent(&mut self, child: Node, parent_handle: NodeHandle) -> NodeHandle {
        let handle = self.add_node(child);
        self.attach(handle, parent_handle);
        handle
    }

    /// Removes a node and its entire subtree, along with their components
    /// and id-index entries. No-op on a stale handle.
    pub fn remove_node(&mut self, handle: NodeHandle) {
        let Some(node) = self.nodes.get(handle) else {
            return;
        };
        let children = node.children.clone();

        for child in children {
            self.remove_node(child);
        }

        // Unlink from the parent (or the root list).
        let parent_opt = self.nodes.get(handle).and_then(|n| n.parent);
        if let Some(parent_handle) = parent_opt {
            if let Some(parent) = self.nodes.get_mut(parent_handle)
                && let Some(pos) = parent.children.iter().position(|&x| x == handle)
            {
                parent.children.remove(pos);
            }
        } else if let Some(pos) = self.root_nodes.iter().position(|&x| x == handle) {
            self.root_nodes.remove(pos);
        }

        // Drop components and index entries before the node itself.
        self.meshes.remove(handle);
        self.cameras.remove(handle);
        if self.active_camera == Some(handle) {
            self.active_camera = None;
        }

        if let Some(node) = self.nodes.remove(handle) {
            self.id_index.remove(&node.id());
        }
    }

    // ========================================================================
    // Hierarchy: attach / detach
    // ========================================================================

    /// Establishes a parent/child relationship.
    ///
    /// Rejected with a warning (tree untouched) when either handle is stale,
    /// when the child is the parent itself, or when `parent_handle` sits
    /// inside the child's subtree, which would close a cycle. All checks run
    /// before any mutation so a rejected attach never leaves a half-updated
    /// tree.
    pub fn attach(&mut self, child_handle: NodeHandle, parent_handle: NodeHandle) {
        if child_handle == parent_handle {
            log::warn!("attach: cannot attach a node to itself");
            return;
        }
        if !self.nodes.contains_key(child_handle) {
            log::warn!("attach: child node not found");
            return;
        }
        if !self.nodes.contains_key(parent_handle) {
            log::warn!("attach: parent node not found");
            return;
        }
        if self.is_ancestor_of(child_handle, parent_handle) {
            log::warn!("attach: target parent is a descendant of the child (cycle rejected)");
            return;
        }

        // Detach from the old parent or the root list.
        let old_parent = self.nodes.get(child_handle).and_then(|n| n.parent);
        if let Some(p) = old_parent {
            if let Some(n) = self.nodes.get_mut(p)
                && let Some(i) = n.children.iter().position(|&x| x == child_handle)
            {
                n.children.remove(i);
            }
        } else if let Some(i) = self.root_nodes.iter().position(|&x| x == child_handle) {
            self.root_nodes.remove(i);
        }

        if let Some(p) = self.nodes.get_mut(parent_handle) {
            p.children.push(child_handle);
        }

        if let Some(c) = self.nodes.get_mut(child_handle) {
            c.parent = Some(parent_handle);
            // Parent changed: the world matrix must be rebuilt next update.
            c.transform.mark_dirty();
        }
    }

    /// Detaches a node from its parent, moving it back to the root list.
    /// No-op if the node is already a root or the handle is stale.
    pub fn detach(&mut self, child_handle: NodeHandle) {
        let Some(parent_handle) = self.nodes.get(child_handle).and_then(|n| n.parent) else {
            return;
        };

        if let Some(parent) = self.nodes.get_mut(parent_handle)
            && let Some(i) = parent.children.iter().position(|&x| x == child_handle)
        {
            parent.children.remove(i);
        }

        if let Some(child) = self.nodes.get_mut(child_handle) {
            child.parent = None;
            child.transform.mark_dirty();
        }
        self.root_nodes.push(child_handle);
    }

    /// Walks the ancestor chain of `node`: is `candidate` above it (or equal)?
    fn is_ancestor_of(&self, candidate: NodeHandle, node: NodeHandle) -> bool {
        let mut current = Some(node);
        while let Some(handle) = current {
            if handle == candidate {
                return true;
            }
            current = self.nodes.get(handle).and_then(|n| n.parent);
        }
        false
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    /// O(1) lookup by stable node id, regardless of depth.
    #[must_use]
    pub fn get_node_by_id(&self, id: u64) -> Option<NodeHandle> {
        self.id_index.get(&id).copied()
    }

    /// First node with the given name, in traversal order.
    #[must_use]
    pub fn find_node_by_name(&self, name: &str) -> Option<NodeHandle> {
        let mut found = None;
        self.traverse(&mut |handle, node| {
            if found.is_none() && node.name == name {
                found = Some(handle);
            }
        });
        found
    }

    /// Number of live nodes (for diagnostics and tests).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ========================================================================
    // Components
    // ========================================================================

    pub fn set_mesh(&mut self, handle: NodeHandle, mesh: Mesh) {
        if self.nodes.contains_key(handle) {
            self.meshes.insert(handle, mesh);
        }
    }

    pub fn get_mesh(&self, handle: NodeHandle) -> Option<&Mesh> {
        self.meshes.get(handle)
    }

    pub fn get_mesh_mut(&mut self, handle: NodeHandle) -> Option<&mut Mesh> {
        self.meshes.get_mut(handle)
    }

    pub fn set_camera(&mut self, handle: NodeHandle, camera: Camera) {
        if self.nodes.contains_key(handle) {
            self.cameras.insert(handle, camera);
            if self.active_camera.is_none() {
                self.active_camera = Some(handle);
            }
        }
    }

    pub fn get_camera(&self, handle: NodeHandle) -> Option<&Camera> {
        self.cameras.get(handle)
    }

    pub fn get_camera_mut(&mut self, handle: NodeHandle) -> Option<&mut Camera> {
        self.cameras.get_mut(handle)
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Pre-order depth-first visit in child insertion order.
    ///
    /// A subtree whose root has `enabled == false` is skipped entirely.
    pub fn traverse(&self, visitor: &mut impl FnMut(NodeHandle, &Node)) {
        self.traverse_filtered(&mut |_, _| true, visitor);
    }

    /// Pre-order visit with a filter.
    ///
    /// A `false` from the filter skips the node *and* its whole subtree, in
    /// addition to the `enabled` gate.
    pub fn traverse_filtered(
        &self,
        filter: &mut impl FnMut(NodeHandle, &Node) -> bool,
        visitor: &mut impl FnMut(NodeHandle, &Node),
    ) {
        let mut stack: Vec<NodeHandle> = Vec::with_capacity(64);
        for &root in self.root_nodes.iter().rev() {
            stack.push(root);
        }

        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            if !node.enabled || !filter(handle, node) {
                continue;
            }

            visitor(handle, node);

            for &child in node.children.iter().rev() {
                stack.push(child);
            }
        }
    }

    // ========================================================================
    // Cloning
    // ========================================================================

    /// Deep-clones a node, optionally with its whole subtree.
    ///
    /// The clone is added as a new detached root: fresh handles and ids
    /// throughout, transforms copied by value, mesh/camera components
    /// duplicated. Nodes are never shared between original and clone;
    /// resource handles inside mesh components are (resources are shared by
    /// design).
    pub fn clone_subtree(&mut self, handle: NodeHandle, recursive: bool) -> Option<NodeHandle> {
        self.nodes.get(handle)?;
        let clone_handle = self.clone_one(handle)?;
        if recursive {
            self.clone_children_into(handle, clone_handle);
        }
        Some(clone_handle)
    }

    fn clone_one(&mut self, source: NodeHandle) -> Option<NodeHandle> {
        let copy = self.nodes.get(source)?.duplicate();
        let handle = self.add_node(copy);

        if let Some(mesh) = self.meshes.get(source) {
            let mesh_copy = mesh.duplicate();
            self.meshes.insert(handle, mesh_copy);
        }
        if let Some(camera) = self.cameras.get(source).cloned() {
            self.cameras.insert(handle, camera);
        }
        Some(handle)
    }

    fn clone_children_into(&mut self, source: NodeHandle, target: NodeHandle) {
        let children = match self.nodes.get(source) {
            Some(node) => node.children.clone(),
            None => return,
        };
        for child in children {
            if let Some(child_clone) = self.clone_one(child) {
                self.attach(child_clone, target);
                self.clone_children_into(child, child_clone);
            }
        }
    }

    // ========================================================================
    // Matrix update pipeline
    // ========================================================================

    /// Updates world matrices for the whole scene, honoring dirty flags.
    ///
    /// Must run before rendering; the renderer calls it every frame.
    pub fn update_matrix_world(&mut self) {
        transform_system::update_hierarchy(&mut self.nodes, &mut self.cameras, &self.root_nodes);
    }

    /// Forces a world-matrix recompute of one node and its subtree.
    pub fn update_subtree(&mut self, root_handle: NodeHandle) {
        transform_system::update_subtree(&mut self.nodes, &mut self.cameras, root_handle);
    }
}

/// Fluent node construction, terminated by [`NodeBuilder::build`].
pub struct NodeBuilder<'a> {
    scene: &'a mut Scene,
    node: Node,
    parent: Option<NodeHandle>,
    mesh: Option<Mesh>,
}

impl<'a> NodeBuilder<'a> {
    pub fn new(scene: &'a mut Scene, name: &str) -> Self {
        Self {
            scene,
            node: Node::new(name),
            parent: None,
            mesh: None,
        }
    }

    #[must_use]
    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.node.transform.position = Vec3::new(x, y, z);
        self
    }

    #[must_use]
    pub fn with_scale(mut self, s: f32) -> Self {
        self.node.transform.scale = Vec3::splat(s);
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: NodeHandle) -> Self {
        self.parent = Some(parent);
        self
    }

    #[must_use]
    pub fn with_mesh(mut self, mesh: Mesh) -> Self {
        self.mesh = Some(mesh);
        self
    }

    /// Inserts the node into the scene and returns its handle.
    pub fn build(self) -> NodeHandle {
        let NodeBuilder {
            scene,
            node,
            parent,
            mesh,
        } = self;

        let handle = scene.add_node(node);
        if let Some(parent_handle) = parent {
            scene.attach(handle, parent_handle);
        }
        if let Some(mesh) = mesh {
            scene.set_mesh(handle, mesh);
        }
        handle
    }
}
