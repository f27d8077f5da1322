//! Render backend seam
//!
//! The renderer never talks to a GPU API directly; it drives a
//! [`RenderBackend`], an opaque capability covering resource creation, state
//! binding and draw submission. Real hosts implement it over their graphics
//! context; [`HeadlessBackend`] records the command stream and is what the
//! integration tests (and CI hosts) run against.

use glam::{Mat4, Vec4};

use crate::errors::{FableError, Result};
use crate::resources::geometry::IndexKind;
use crate::resources::material::BlendMode;

// ============================================================================
// Backend object ids
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u64);

bitflags::bitflags! {
    /// Framebuffer attachments targeted by [`RenderBackend::clear`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
    }
}

/// Per-draw uniform block uploaded before each draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawUniforms {
    pub model_view: Mat4,
    pub projection: Mat4,
    pub color: Vec4,
}

// ============================================================================
// The backend capability
// ============================================================================

/// Opaque GPU capability the renderer draws through.
///
/// Object creation returns backend-allocated ids; deletion of an unknown id
/// is a no-op. `acquire` is called once during renderer initialization and
/// fails with [`FableError::ContextUnavailable`] when no context exists.
pub trait RenderBackend {
    /// Acquires (or re-acquires) the underlying graphics context.
    fn acquire(&mut self) -> Result<()>;

    /// True once the context has been lost. A lost context is fatal for the
    /// current renderer lifecycle; it is never recovered in place.
    fn is_context_lost(&self) -> bool;

    fn set_viewport(&mut self, width: u32, height: u32);

    fn clear(&mut self, flags: ClearFlags, color: Vec4);

    // === Resource creation / deletion ===

    fn create_buffer(&mut self, label: &str, data: &[u8]) -> BufferId;

    fn delete_buffer(&mut self, id: BufferId);

    fn create_texture(&mut self, label: &str, width: u32, height: u32, pixels: &[u8])
    -> TextureId;

    fn delete_texture(&mut self, id: TextureId);

    /// Compiles and links a program from vertex/fragment sources.
    fn create_program(&mut self, label: &str, vertex: &str, fragment: &str) -> Result<ProgramId>;

    fn delete_program(&mut self, id: ProgramId);

    // === Per-draw state ===

    fn bind_program(&mut self, id: ProgramId);

    fn bind_material_state(&mut self, blend: BlendMode, double_sided: bool);

    fn bind_texture(&mut self, id: Option<TextureId>);

    /// Binds the vertex channel buffers and, when present, the index buffer.
    fn bind_geometry(&mut self, vertex_buffers: &[BufferId], index: Option<(BufferId, IndexKind)>);

    fn set_draw_uniforms(&mut self, uniforms: &DrawUniforms);

    // === Submission ===

    fn draw(&mut self, vertex_count: u32);

    fn draw_indexed(&mut self, index_count: u32, kind: IndexKind);
}

// ============================================================================
// Headless backend (command recorder)
// ============================================================================

/// One recorded backend command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetViewport {
        width: u32,
        height: u32,
    },
    Clear {
        flags: ClearFlags,
        color: Vec4,
    },
    CreateBuffer {
        id: BufferId,
        label: String,
        bytes: usize,
    },
    DeleteBuffer {
        id: BufferId,
    },
    CreateTexture {
        id: TextureId,
        label: String,
        width: u32,
        height: u32,
    },
    DeleteTexture {
        id: TextureId,
    },
    CreateProgram {
        id: ProgramId,
        label: String,
    },
    DeleteProgram {
        id: ProgramId,
    },
    BindProgram {
        id: ProgramId,
    },
    BindMaterialState {
        blend: BlendMode,
        double_sided: bool,
    },
    BindTexture {
        id: Option<TextureId>,
    },
    BindGeometry {
        vertex_buffers: Vec<BufferId>,
        index: Option<(BufferId, IndexKind)>,
    },
    SetDrawUniforms {
        uniforms: DrawUniforms,
    },
    Draw {
        vertex_count: u32,
    },
    DrawIndexed {
        index_count: u32,
        kind: IndexKind,
    },
}

/// Records the full command stream instead of touching a GPU.
///
/// Failure modes are injectable so lifecycle paths (failed shader compiles,
/// context loss, refused context acquisition) can be exercised without a
/// real graphics stack.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    commands: Vec<Command>,
    next_id: u64,

    // Injected failure modes
    fail_shader_compile: bool,
    context_lost: bool,
    refuse_context: bool,

    // Counters
    buffer_uploads: u64,
    texture_uploads: u64,
    programs_linked: u64,
    draw_calls: u64,
}

impl HeadlessBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    // === Recorded stream & counters ===

    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    #[must_use]
    pub fn buffer_uploads(&self) -> u64 {
        self.buffer_uploads
    }

    #[must_use]
    pub fn texture_uploads(&self) -> u64 {
        self.texture_uploads
    }

    #[must_use]
    pub fn programs_linked(&self) -> u64 {
        self.programs_linked
    }

    #[must_use]
    pub fn draw_calls(&self) -> u64 {
        self.draw_calls
    }

    /// Count of live (created and not yet deleted) backend objects.
    #[must_use]
    pub fn live_objects(&self) -> i64 {
        let mut live = 0i64;
        for command in &self.commands {
            match command {
                Command::CreateBuffer { .. }
                | Command::CreateTexture { .. }
                | Command::CreateProgram { .. } => live += 1,
                Command::DeleteBuffer { .. }
                | Command::DeleteTexture { .. }
                | Command::DeleteProgram { .. } => live -= 1,
                _ => {}
            }
        }
        live
    }

    // === Failure injection ===

    pub fn set_fail_shader_compile(&mut self, fail: bool) {
        self.fail_shader_compile = fail;
    }

    /// Simulates a context loss event delivered by the host.
    pub fn lose_context(&mut self) {
        self.context_lost = true;
    }

    pub fn set_refuse_context(&mut self, refuse: bool) {
        self.refuse_context = refuse;
    }
}

impl RenderBackend for HeadlessBackend {
    fn acquire(&mut self) -> Result<()> {
        if self.refuse_context {
            return Err(FableError::ContextUnavailable(
                "headless backend configured to refuse context".to_string(),
            ));
        }
        self.context_lost = false;
        Ok(())
    }

    fn is_context_lost(&self) -> bool {
        self.context_lost
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.commands.push(Command::SetViewport { width, height });
    }

    fn clear(&mut self, flags: ClearFlags, color: Vec4) {
        self.commands.push(Command::Clear { flags, color });
    }

    fn create_buffer(&mut self, label: &str, data: &[u8]) -> BufferId {
        let id = BufferId(self.next_id());
        self.buffer_uploads += 1;
        self.commands.push(Command::CreateBuffer {
            id,
            label: label.to_string(),
            bytes: data.len(),
        });
        id
    }

    fn delete_buffer(&mut self, id: BufferId) {
        self.commands.push(Command::DeleteBuffer { id });
    }

    fn create_texture(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        _pixels: &[u8],
    ) -> TextureId {
        let id = TextureId(self.next_id());
        self.texture_uploads += 1;
        self.commands.push(Command::CreateTexture {
            id,
            label: label.to_string(),
            width,
            height,
        });
        id
    }

    fn delete_texture(&mut self, id: TextureId) {
        self.commands.push(Command::DeleteTexture { id });
    }

    fn create_program(&mut self, label: &str, _vertex: &str, _fragment: &str) -> Result<ProgramId> {
        if self.fail_shader_compile {
            return Err(FableError::ShaderCompile {
                label: label.to_string(),
                log: "injected compile failure".to_string(),
            });
        }
        let id = ProgramId(self.next_id());
        self.programs_linked += 1;
        self.commands.push(Command::CreateProgram {
            id,
            label: label.to_string(),
        });
        Ok(id)
    }

    fn delete_program(&mut self, id: ProgramId) {
        self.commands.push(Command::DeleteProgram { id });
    }

    fn bind_program(&mut self, id: ProgramId) {
        self.commands.push(Command::BindProgram { id });
    }

    fn bind_material_state(&mut self, blend: BlendMode, double_sided: bool) {
        self.commands.push(Command::BindMaterialState {
            blend,
            double_sided,
        });
    }

    fn bind_texture(&mut self, id: Option<TextureId>) {
        self.commands.push(Command::BindTexture { id });
    }

    fn bind_geometry(&mut self, vertex_buffers: &[BufferId], index: Option<(BufferId, IndexKind)>) {
        self.commands.push(Command::BindGeometry {
            vertex_buffers: vertex_buffers.to_vec(),
            index,
        });
    }

    fn set_draw_uniforms(&mut self, uniforms: &DrawUniforms) {
        self.commands.push(Command::SetDrawUniforms {
            uniforms: *uniforms,
        });
    }

    fn draw(&mut self, vertex_count: u32) {
        self.draw_calls += 1;
        self.commands.push(Command::Draw { vertex_count });
    }

    fn draw_indexed(&mut self, index_count: u32, kind: IndexKind) {
        self.draw_calls += 1;
        self.commands.push(Command::DrawIndexed { index_count, kind });
    }
}
