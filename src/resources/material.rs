use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec4;

use crate::assets::TextureHandle;
use crate::resources::version_tracker::ChangeTracker;

static NEXT_MATERIAL_ID: AtomicU64 = AtomicU64::new(1);

/// Blend mode applied when the material's drawables are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    #[default]
    Opaque,
    Alpha,
    Additive,
}

/// Shader stage sources carried by a material.
///
/// A material without sources renders through the backend's built-in flat
/// program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    pub vertex: String,
    pub fragment: String,
}

/// Material resource: a bag of shading parameters.
///
/// Mutation goes through the setters so the change version is bumped; the
/// renderer cache re-uploads (and re-links the program when shader sources
/// changed) only after [`mark_needs_update`](Self::mark_needs_update) or a
/// setter ran. It never polls field contents.
#[derive(Debug, Clone)]
pub struct Material {
    id: u64,
    pub name: String,

    color: Vec4,
    opacity: f32,
    blend: BlendMode,
    map: Option<TextureHandle>,
    shader: Option<ShaderSource>,
    double_sided: bool,

    tracker: ChangeTracker,
}

impl Material {
    #[must_use]
    pub fn new(name: &str, color: Vec4) -> Self {
        Self {
            id: NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
            color,
            opacity: 1.0,
            blend: BlendMode::Opaque,
            map: None,
            shader: None,
            double_sided: false,
            tracker: ChangeTracker::new(),
        }
    }

    /// Flat single-color material using the backend's built-in program.
    #[must_use]
    pub fn flat(color: Vec4) -> Self {
        Self::new("FlatMaterial", color)
    }

    #[must_use]
    pub fn with_shader(mut self, vertex: &str, fragment: &str) -> Self {
        self.shader = Some(ShaderSource {
            vertex: vertex.to_string(),
            fragment: fragment.to_string(),
        });
        self
    }

    #[must_use]
    pub fn with_map(mut self, map: TextureHandle) -> Self {
        self.map = Some(map);
        self
    }

    // ========================================================================
    // Identity & versioning
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.tracker.version()
    }

    /// Marks the material stale so the renderer cache refreshes it.
    pub fn mark_needs_update(&mut self) {
        self.tracker.changed();
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn color(&self) -> Vec4 {
        self.color
    }

    pub fn set_color(&mut self, color: Vec4) {
        self.color = color;
        self.mark_needs_update();
    }

    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
        self.mark_needs_update();
    }

    #[must_use]
    pub fn blend(&self) -> BlendMode {
        self.blend
    }

    pub fn set_blend(&mut self, blend: BlendMode) {
        self.blend = blend;
        self.mark_needs_update();
    }

    #[must_use]
    pub fn map(&self) -> Option<TextureHandle> {
        self.map
    }

    pub fn set_map(&mut self, map: Option<TextureHandle>) {
        self.map = map;
        self.mark_needs_update();
    }

    #[must_use]
    pub fn shader(&self) -> Option<&ShaderSource> {
        self.shader.as_ref()
    }

    pub fn set_shader(&mut self, shader: Option<ShaderSource>) {
        self.shader = shader;
        self.mark_needs_update();
    }

    #[must_use]
    pub fn double_sided(&self) -> bool {
        self.double_sided
    }

    pub fn set_double_sided(&mut self, double_sided: bool) {
        self.double_sided = double_sided;
        self.mark_needs_update();
    }
}
