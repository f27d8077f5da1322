//! Renderer
//!
//! Frame orchestration over an opaque [`RenderBackend`]: lifecycle state
//! machine, per-frame matrix updates, drawable collection and sorting, and
//! draw submission through the GPU resource cache.

pub mod backend;
pub mod resources;

use glam::{Mat4, Vec4};
use log::warn;
use slotmap::Key;

use crate::assets::{Assets, GeometryHandle, MaterialHandle, TextureHandle};
use crate::errors::{FableError, Result};
use crate::render::backend::{ClearFlags, DrawUniforms, ProgramId, RenderBackend, TextureId};
use crate::render::resources::ResourceManager;
use crate::scene::{NodeHandle, Scene};

/// Per-frame counters returned by [`Renderer::render`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Draw calls actually issued.
    pub draw_calls: u64,
    /// Visible drawables skipped for missing/failed resources.
    pub skipped_drawables: u64,
    /// Program binds; redundant binds inside a material group are elided.
    pub program_binds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RendererState {
    Uninitialized,
    Initialized,
    Destroyed,
}

/// One visible drawable collected from the scene, pre-sort.
struct DrawItem {
    node: NodeHandle,
    world_matrix: Mat4,
    geometry: GeometryHandle,
    material: MaterialHandle,
    render_order: i32,
    /// Material grouping key: stable per material handle.
    material_key: u64,
}

/// Bind-state tracked across the draw list to elide redundant binds.
#[derive(Default)]
struct DrawState {
    current_program: Option<ProgramId>,
}

/// The main renderer.
///
/// Generic over the backend so hosts plug in their graphics context and the
/// tests run on [`backend::HeadlessBackend`]. A renderer starts
/// `Uninitialized`; the first `render` (or an explicit [`init`](Self::init))
/// acquires the context. After [`destroy`](Self::destroy) every entry point
/// is a warn-and-no-op. Context loss is fatal to the lifecycle: `render`
/// reports it once and drops back to `Uninitialized`.
pub struct Renderer<B: RenderBackend> {
    backend: B,
    state: RendererState,

    resources: ResourceManager,

    width: u32,
    height: u32,
    frames_rendered: u64,

    /// Clear the color/depth targets at the top of each frame.
    pub auto_clear: bool,
    /// Clear color used when the scene has no background set.
    pub clear_color: Vec4,
}

impl<B: RenderBackend> Renderer<B> {
    pub fn new(backend: B, width: u32, height: u32) -> Self {
        Self {
            backend,
            state: RendererState::Uninitialized,
            resources: ResourceManager::new(),
            width,
            height,
            frames_rendered: 0,
            auto_clear: true,
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Acquires the backend context. Idempotent while initialized.
    pub fn init(&mut self) -> Result<()> {
        match self.state {
            RendererState::Destroyed => {
                warn!("init called on a destroyed renderer");
                Ok(())
            }
            RendererState::Initialized => Ok(()),
            RendererState::Uninitialized => {
                self.backend.acquire()?;
                self.backend.set_viewport(self.width, self.height);
                self.state = RendererState::Initialized;
                Ok(())
            }
        }
    }

    /// Resizes the drawing surface. Updating camera projections for the new
    /// aspect is the caller's concern ([`crate::scene::Camera::set_viewport`]).
    pub fn set_size(&mut self, width: u32, height: u32) {
        if self.state == RendererState::Destroyed {
            warn!("set_size called on a destroyed renderer");
            return;
        }
        self.width = width;
        self.height = height;
        if self.state == RendererState::Initialized {
            self.backend.set_viewport(width, height);
        }
    }

    /// Releases every cached GPU resource and retires the renderer.
    /// Idempotent; all further calls are no-ops.
    pub fn destroy(&mut self) {
        if self.state == RendererState::Destroyed {
            return;
        }
        self.resources.release(&mut self.backend);
        self.state = RendererState::Destroyed;
    }

    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frames_rendered
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[must_use]
    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    // ========================================================================
    // Resource pre-warming
    // ========================================================================

    /// Uploads a geometry ahead of its first draw.
    pub fn upload_geometry(&mut self, assets: &Assets, handle: GeometryHandle) {
        if self.state == RendererState::Destroyed {
            warn!("upload_geometry called on a destroyed renderer");
            return;
        }
        if let Some(geometry) = assets.get_geometry(handle) {
            self.resources
                .prepare_geometry(&mut self.backend, handle, geometry);
        }
    }

    /// Compiles a material's program ahead of its first draw.
    pub fn upload_material(&mut self, assets: &Assets, handle: MaterialHandle) {
        if self.state == RendererState::Destroyed {
            warn!("upload_material called on a destroyed renderer");
            return;
        }
        if let Some(material) = assets.get_material(handle) {
            self.resources
                .prepare_material(&mut self.backend, handle, material);
        }
    }

    /// Uploads a texture ahead of its first draw.
    pub fn upload_texture(&mut self, assets: &Assets, handle: TextureHandle) {
        if self.state == RendererState::Destroyed {
            warn!("upload_texture called on a destroyed renderer");
            return;
        }
        if let Some(texture) = assets.get_texture(handle) {
            self.resources
                .prepare_texture(&mut self.backend, handle, texture);
        }
    }

    /// Evicts cached GPU resources unused for `ttl_frames` frames.
    pub fn prune_resources(&mut self, ttl_frames: u64) {
        if self.state == RendererState::Destroyed {
            warn!("prune_resources called on a destroyed renderer");
            return;
        }
        self.resources.prune(&mut self.backend, ttl_frames);
    }

    // ========================================================================
    // Frame rendering
    // ========================================================================

    /// Renders one frame of `scene` through the camera on `camera_handle`.
    ///
    /// Initializes implicitly when needed. Fails with
    /// [`FableError::CameraNotFound`] if the node carries no camera
    /// component and with [`FableError::ContextLost`] (dropping back to
    /// uninitialized) when the backend reports a lost context.
    pub fn render(
        &mut self,
        scene: &mut Scene,
        assets: &mut Assets,
        camera_handle: NodeHandle,
    ) -> Result<FrameStats> {
        if self.state == RendererState::Destroyed {
            warn!("render called on a destroyed renderer");
            return Ok(FrameStats::default());
        }
        self.init()?;

        if self.backend.is_context_lost() {
            // Cached buffer/program ids died with the context. Drop them
            // without issuing deletes; re-init uploads everything afresh.
            self.resources.forget();
            self.state = RendererState::Uninitialized;
            return Err(FableError::ContextLost);
        }

        if scene.get_camera(camera_handle).is_none() {
            return Err(FableError::CameraNotFound);
        }

        self.resources.next_frame();

        if self.auto_clear {
            let color = scene.background.unwrap_or(self.clear_color);
            self.backend
                .clear(ClearFlags::COLOR | ClearFlags::DEPTH, color);
        }

        let frame = self.frames_rendered;
        if let Some(hook) = scene.on_before_render.as_mut() {
            hook(frame);
        }

        // Lazy whole-scene pass, then a forced pass over the camera node so
        // the view matrix always reflects the latest transform state.
        scene.update_matrix_world();
        scene.update_subtree(camera_handle);

        let (view_matrix, projection_matrix) = match scene.get_camera(camera_handle) {
            Some(camera) => (*camera.view_matrix(), *camera.projection_matrix()),
            None => return Err(FableError::CameraNotFound),
        };

        let mut stats = FrameStats::default();
        let mut items = Self::collect_draw_items(scene, assets, &mut stats);

        // Stable sort: drawables sharing a key keep scene traversal order.
        items.sort_by_key(|item| (item.render_order, item.material_key));

        let mut draw_state = DrawState::default();
        for item in &items {
            if !self.draw_item(scene, assets, item, &view_matrix, &projection_matrix, &mut draw_state, &mut stats) {
                stats.skipped_drawables += 1;
            }
        }

        if let Some(hook) = scene.on_after_render.as_mut() {
            hook(frame);
        }

        self.frames_rendered += 1;
        Ok(stats)
    }

    /// Collects visible drawables in traversal order. Disabled subtrees are
    /// skipped wholesale; a visible mesh missing either resource handle is
    /// counted as skipped.
    fn collect_draw_items(scene: &Scene, assets: &Assets, stats: &mut FrameStats) -> Vec<DrawItem> {
        let mut items = Vec::new();
        let meshes = &scene.meshes;

        scene.traverse(&mut |handle, node| {
            let Some(mesh) = meshes.get(handle) else {
                return;
            };
            if !node.visible || !mesh.visible {
                return;
            }

            let (Some(geometry), Some(material)) = (mesh.geometry, mesh.material) else {
                stats.skipped_drawables += 1;
                return;
            };
            if assets.get_geometry(geometry).is_none() || assets.get_material(material).is_none() {
                stats.skipped_drawables += 1;
                return;
            }

            items.push(DrawItem {
                node: handle,
                world_matrix: node.transform.world_matrix_as_mat4(),
                geometry,
                material,
                render_order: mesh.render_order,
                material_key: material.data().as_ffi(),
            });
        });

        items
    }

    /// Prepares and submits one drawable. Returns false when it had to be
    /// skipped (resource failure); the caller counts it.
    fn draw_item(
        &mut self,
        scene: &mut Scene,
        assets: &Assets,
        item: &DrawItem,
        view_matrix: &Mat4,
        projection_matrix: &Mat4,
        draw_state: &mut DrawState,
        stats: &mut FrameStats,
    ) -> bool {
        let Some(material) = assets.get_material(item.material) else {
            return false;
        };
        let Some(geometry) = assets.get_geometry(item.geometry) else {
            return false;
        };

        let Some(program) = self
            .resources
            .prepare_material(&mut self.backend, item.material, material)
            .map(|gpu| gpu.program)
        else {
            return false;
        };

        let texture: Option<TextureId> = material
            .map()
            .and_then(|map| assets.get_texture(map).map(|tex| (map, tex)))
            .and_then(|(map, tex)| {
                self.resources
                    .prepare_texture(&mut self.backend, map, tex)
                    .map(|gpu| gpu.texture)
            });

        if self
            .resources
            .prepare_geometry(&mut self.backend, item.geometry, geometry)
            .is_none()
        {
            return false;
        }

        if let Some(mesh) = scene.get_mesh_mut(item.node)
            && let Some(hook) = mesh.on_before_draw.as_mut()
        {
            hook();
        }

        if draw_state.current_program != Some(program) {
            self.backend.bind_program(program);
            draw_state.current_program = Some(program);
            stats.program_binds += 1;
        }

        self.backend
            .bind_material_state(material.blend(), material.double_sided());
        self.backend.bind_texture(texture);

        let color = material.color();
        let uniforms = DrawUniforms {
            model_view: *view_matrix * item.world_matrix,
            projection: *projection_matrix,
            color: Vec4::new(color.x, color.y, color.z, color.w * material.opacity()),
        };
        self.backend.set_draw_uniforms(&uniforms);

        // Entry is guaranteed live; re-fetch to sidestep holding the cache
        // borrow across the texture/hook calls above.
        let Some(gpu_geometry) = self.resources.gpu_geometry(item.geometry) else {
            return false;
        };
        self.backend
            .bind_geometry(&gpu_geometry.vertex_buffers, gpu_geometry.index.map(|(id, kind, _)| (id, kind)));

        match gpu_geometry.index {
            Some((_, kind, count)) => self.backend.draw_indexed(count, kind),
            None => self.backend.draw(gpu_geometry.vertex_count),
        }
        stats.draw_calls += 1;

        if let Some(mesh) = scene.get_mesh_mut(item.node)
            && let Some(hook) = mesh.on_after_draw.as_mut()
        {
            hook();
        }

        true
    }
}
