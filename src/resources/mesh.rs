use crate::assets::{GeometryHandle, MaterialHandle};

/// Hook invoked around an individual drawable's draw call.
pub type DrawHook = Box<dyn FnMut()>;

/// Mesh component: turns a scene node into a drawable.
///
/// Holds non-owning references to one geometry and one material. Both are
/// optional. A mesh with either unset is silently skipped by the renderer,
/// counted in the frame stats rather than raised as an error. Resources may
/// be shared across any number of meshes.
pub struct Mesh {
    pub name: String,

    // === Resource references ===
    pub geometry: Option<GeometryHandle>,
    pub material: Option<MaterialHandle>,

    // === Instance render settings ===
    pub visible: bool,
    /// Explicit draw-order bias; drawables sort by this first, then by
    /// material grouping key.
    pub render_order: i32,

    // === Optional per-draw hooks; absence is tolerated ===
    pub on_before_draw: Option<DrawHook>,
    pub on_after_draw: Option<DrawHook>,
}

impl Mesh {
    #[must_use]
    pub fn new(geometry: GeometryHandle, material: MaterialHandle) -> Self {
        Self {
            name: "Mesh".to_string(),
            geometry: Some(geometry),
            material: Some(material),
            visible: true,
            render_order: 0,
            on_before_draw: None,
            on_after_draw: None,
        }
    }

    /// Mesh with no resources attached yet; skipped until both are set.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            name: "Mesh".to_string(),
            geometry: None,
            material: None,
            visible: true,
            render_order: 0,
            on_before_draw: None,
            on_after_draw: None,
        }
    }

    /// Copy of the mesh settings and resource references. Hooks are not
    /// carried over: they capture state tied to the original instance.
    #[must_use]
    pub(crate) fn duplicate(&self) -> Self {
        Self {
            name: self.name.clone(),
            geometry: self.geometry,
            material: self.material,
            visible: self.visible,
            render_order: self.render_order,
            on_before_draw: None,
            on_after_draw: None,
        }
    }
}
