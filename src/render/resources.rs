//! GPU resource cache
//!
//! Maps asset handles to live backend objects. Every CPU resource carries a
//! change version; the hot path here is a single version compare, so calling
//! `prepare_*` every frame for every drawable is cheap. On a version
//! mismatch the stale backend objects are deleted and the resource is
//! uploaded again under the new version.

use log::{trace, warn};
use slotmap::SecondaryMap;

use crate::assets::{GeometryHandle, MaterialHandle, TextureHandle};
use crate::render::backend::{BufferId, ProgramId, RenderBackend, TextureId};
use crate::resources::geometry::{Geometry, IndexKind};
use crate::resources::material::Material;
use crate::resources::texture::Texture;

// Built-in program used by materials that carry no shader sources.
const FLAT_VERTEX_SRC: &str = "\
attribute vec3 position;
uniform mat4 model_view;
uniform mat4 projection;
void main() {
    gl_Position = projection * model_view * vec4(position, 1.0);
}
";

const FLAT_FRAGMENT_SRC: &str = "\
precision mediump float;
uniform vec4 color;
void main() {
    gl_FragColor = color;
}
";

// ============================================================================
// Cache entries
// ============================================================================

pub struct GpuGeometry {
    /// Channel buffers in upload order: positions, then normals/uvs/colors
    /// when present.
    pub vertex_buffers: Vec<BufferId>,
    pub index: Option<(BufferId, IndexKind, u32)>,
    pub vertex_count: u32,

    pub version: u64,
    pub last_used_frame: u64,
}

pub struct GpuMaterial {
    pub program: ProgramId,
    /// False when `program` is the shared built-in flat program.
    owns_program: bool,

    pub version: u64,
    pub last_used_frame: u64,
}

pub struct GpuTexture {
    pub texture: TextureId,
    pub version: u64,
    pub last_used_frame: u64,
}

// ============================================================================
// Resource manager
// ============================================================================

pub struct ResourceManager {
    frame_index: u64,

    geometries: SecondaryMap<GeometryHandle, GpuGeometry>,
    materials: SecondaryMap<MaterialHandle, GpuMaterial>,
    textures: SecondaryMap<TextureHandle, GpuTexture>,

    /// Shader versions that failed to compile; not retried until the
    /// material version moves past the recorded one.
    failed_materials: SecondaryMap<MaterialHandle, u64>,

    default_program: Option<ProgramId>,

    geometry_uploads: u64,
    material_uploads: u64,
    texture_uploads: u64,
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            frame_index: 0,
            geometries: SecondaryMap::new(),
            materials: SecondaryMap::new(),
            textures: SecondaryMap::new(),
            failed_materials: SecondaryMap::new(),
            default_program: None,
            geometry_uploads: 0,
            material_uploads: 0,
            texture_uploads: 0,
        }
    }

    /// Advances the frame counter used for LRU bookkeeping.
    pub fn next_frame(&mut self) {
        self.frame_index += 1;
    }

    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    // ========================================================================
    // Geometry
    // ========================================================================

    /// Ensures the geometry's backend buffers exist and match its current
    /// version. Returns `None` for disposed or empty geometry.
    pub fn prepare_geometry<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        handle: GeometryHandle,
        geometry: &Geometry,
    ) -> Option<&GpuGeometry> {
        if geometry.disposed || geometry.positions().is_empty() {
            self.drop_geometry(backend, handle);
            return None;
        }

        let version = geometry.version();
        let up_to_date = self
            .geometries
            .get(handle)
            .is_some_and(|entry| entry.version == version);

        if !up_to_date {
            self.drop_geometry(backend, handle);
            let entry = Self::upload_geometry(backend, geometry, version, self.frame_index);
            self.geometries.insert(handle, entry);
            self.geometry_uploads += 1;
            trace!(
                "uploaded geometry '{}' (v{version})",
                geometry.name.as_str()
            );
        }

        let entry = self.geometries.get_mut(handle)?;
        entry.last_used_frame = self.frame_index;
        Some(entry)
    }

    fn upload_geometry<B: RenderBackend>(
        backend: &mut B,
        geometry: &Geometry,
        version: u64,
        frame: u64,
    ) -> GpuGeometry {
        let name = geometry.name.as_str();
        let mut vertex_buffers = Vec::with_capacity(4);

        vertex_buffers.push(backend.create_buffer(name, bytemuck::cast_slice(geometry.positions())));
        if let Some(normals) = geometry.normals() {
            vertex_buffers.push(backend.create_buffer(name, bytemuck::cast_slice(normals)));
        }
        if let Some(uvs) = geometry.uvs() {
            vertex_buffers.push(backend.create_buffer(name, bytemuck::cast_slice(uvs)));
        }
        if let Some(colors) = geometry.colors() {
            vertex_buffers.push(backend.create_buffer(name, bytemuck::cast_slice(colors)));
        }

        let index = match (geometry.indices(), geometry.index_kind()) {
            (Some(indices), Some(IndexKind::U16)) => {
                let narrowed: Vec<u16> = indices.iter().map(|&i| i as u16).collect();
                let buffer = backend.create_buffer(name, bytemuck::cast_slice(&narrowed));
                Some((buffer, IndexKind::U16, indices.len() as u32))
            }
            (Some(indices), Some(IndexKind::U32)) => {
                let buffer = backend.create_buffer(name, bytemuck::cast_slice(indices));
                Some((buffer, IndexKind::U32, indices.len() as u32))
            }
            _ => None,
        };

        GpuGeometry {
            vertex_buffers,
            index,
            vertex_count: geometry.positions().len() as u32,
            version,
            last_used_frame: frame,
        }
    }

    fn drop_geometry<B: RenderBackend>(&mut self, backend: &mut B, handle: GeometryHandle) {
        if let Some(entry) = self.geometries.remove(handle) {
            Self::delete_geometry_objects(backend, &entry);
        }
    }

    fn delete_geometry_objects<B: RenderBackend>(backend: &mut B, entry: &GpuGeometry) {
        for &buffer in &entry.vertex_buffers {
            backend.delete_buffer(buffer);
        }
        if let Some((buffer, _, _)) = entry.index {
            backend.delete_buffer(buffer);
        }
    }

    // ========================================================================
    // Material
    // ========================================================================

    /// Ensures the material's program exists at its current version.
    ///
    /// A compile failure is logged, remembered at that version and not
    /// retried until the material changes again; the caller skips the
    /// drawable on `None`.
    pub fn prepare_material<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        handle: MaterialHandle,
        material: &Material,
    ) -> Option<&GpuMaterial> {
        let version = material.version();

        if self.failed_materials.get(handle) == Some(&version) {
            return None;
        }

        let up_to_date = self
            .materials
            .get(handle)
            .is_some_and(|entry| entry.version == version);

        if !up_to_date {
            self.drop_material(backend, handle);

            let (program, owns_program) = match material.shader() {
                Some(source) => {
                    match backend.create_program(&material.name, &source.vertex, &source.fragment) {
                        Ok(program) => (program, true),
                        Err(err) => {
                            warn!("material '{}' skipped: {err}", material.name);
                            self.failed_materials.insert(handle, version);
                            return None;
                        }
                    }
                }
                None => match self.ensure_default_program(backend) {
                    Some(program) => (program, false),
                    None => {
                        self.failed_materials.insert(handle, version);
                        return None;
                    }
                },
            };

            self.failed_materials.remove(handle);
            self.materials.insert(
                handle,
                GpuMaterial {
                    program,
                    owns_program,
                    version,
                    last_used_frame: self.frame_index,
                },
            );
            self.material_uploads += 1;
        }

        let entry = self.materials.get_mut(handle)?;
        entry.last_used_frame = self.frame_index;
        Some(entry)
    }

    fn ensure_default_program<B: RenderBackend>(&mut self, backend: &mut B) -> Option<ProgramId> {
        if self.default_program.is_none() {
            match backend.create_program("FlatDefault", FLAT_VERTEX_SRC, FLAT_FRAGMENT_SRC) {
                Ok(program) => self.default_program = Some(program),
                Err(err) => {
                    warn!("built-in flat program failed to build: {err}");
                    return None;
                }
            }
        }
        self.default_program
    }

    fn drop_material<B: RenderBackend>(&mut self, backend: &mut B, handle: MaterialHandle) {
        if let Some(entry) = self.materials.remove(handle)
            && entry.owns_program
        {
            backend.delete_program(entry.program);
        }
    }

    // ========================================================================
    // Texture
    // ========================================================================

    pub fn prepare_texture<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        handle: TextureHandle,
        texture: &Texture,
    ) -> Option<&GpuTexture> {
        let version = texture.version();
        let up_to_date = self
            .textures
            .get(handle)
            .is_some_and(|entry| entry.version == version);

        if !up_to_date {
            if let Some(stale) = self.textures.remove(handle) {
                backend.delete_texture(stale.texture);
            }
            let id = backend.create_texture(
                &texture.name,
                texture.width,
                texture.height,
                texture.pixels(),
            );
            self.textures.insert(
                handle,
                GpuTexture {
                    texture: id,
                    version,
                    last_used_frame: self.frame_index,
                },
            );
            self.texture_uploads += 1;
        }

        let entry = self.textures.get_mut(handle)?;
        entry.last_used_frame = self.frame_index;
        Some(entry)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Deletes every backend object and empties the cache. Idempotent.
    pub fn release<B: RenderBackend>(&mut self, backend: &mut B) {
        for (_, entry) in self.geometries.drain() {
            Self::delete_geometry_objects(backend, &entry);
        }
        for (_, entry) in self.materials.drain() {
            if entry.owns_program {
                backend.delete_program(entry.program);
            }
        }
        for (_, entry) in self.textures.drain() {
            backend.delete_texture(entry.texture);
        }
        if let Some(program) = self.default_program.take() {
            backend.delete_program(program);
        }
        self.failed_materials.clear();
    }

    /// Drops every cache entry without touching the backend.
    ///
    /// For context loss: the backend objects died with the context, so the
    /// ids are meaningless and no deletes are issued. Everything re-uploads
    /// on first use against the new context.
    pub fn forget(&mut self) {
        self.geometries.clear();
        self.materials.clear();
        self.textures.clear();
        self.failed_materials.clear();
        self.default_program = None;
    }

    /// Evicts entries that have not been used for `ttl_frames` frames.
    pub fn prune<B: RenderBackend>(&mut self, backend: &mut B, ttl_frames: u64) {
        let cutoff = self.frame_index.saturating_sub(ttl_frames);

        let stale_geometries: Vec<GeometryHandle> = self
            .geometries
            .iter()
            .filter(|(_, e)| e.last_used_frame < cutoff)
            .map(|(h, _)| h)
            .collect();
        for handle in stale_geometries {
            self.drop_geometry(backend, handle);
        }

        let stale_materials: Vec<MaterialHandle> = self
            .materials
            .iter()
            .filter(|(_, e)| e.last_used_frame < cutoff)
            .map(|(h, _)| h)
            .collect();
        for handle in stale_materials {
            self.drop_material(backend, handle);
        }

        let stale_textures: Vec<TextureHandle> = self
            .textures
            .iter()
            .filter(|(_, e)| e.last_used_frame < cutoff)
            .map(|(h, _)| h)
            .collect();
        for handle in stale_textures {
            if let Some(entry) = self.textures.remove(handle) {
                backend.delete_texture(entry.texture);
            }
        }
    }

    // ========================================================================
    // Introspection (used by the renderer stats and the tests)
    // ========================================================================

    #[must_use]
    pub fn cached_geometries(&self) -> usize {
        self.geometries.len()
    }

    #[must_use]
    pub fn cached_materials(&self) -> usize {
        self.materials.len()
    }

    #[must_use]
    pub fn cached_textures(&self) -> usize {
        self.textures.len()
    }

    #[must_use]
    pub fn geometry_uploads(&self) -> u64 {
        self.geometry_uploads
    }

    #[must_use]
    pub fn material_uploads(&self) -> u64 {
        self.material_uploads
    }

    #[must_use]
    pub fn texture_uploads(&self) -> u64 {
        self.texture_uploads
    }

    #[must_use]
    pub fn gpu_geometry(&self, handle: GeometryHandle) -> Option<&GpuGeometry> {
        self.geometries.get(handle)
    }

    #[must_use]
    pub fn gpu_material(&self, handle: MaterialHandle) -> Option<&GpuMaterial> {
        self.materials.get(handle)
    }
}
