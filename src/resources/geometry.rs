use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec3;

use crate::resources::version_tracker::ChangeTracker;

static NEXT_GEOMETRY_ID: AtomicU64 = AtomicU64::new(1);

/// Index width chosen at upload time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    U16,
    U32,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Bounding sphere derived from the box center and the farthest vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

/// Geometry resource: CPU-side vertex channels plus optional indices.
///
/// Positions are mandatory; normals, UVs, vertex colors and indices are
/// optional channels. Contents are immutable once built except through the
/// `set_*` mutators, which bump the change version so renderer caches
/// re-upload, and drop the cached bounding volumes.
///
/// Bounding volumes are computed on demand and cached; identity is a stable
/// monotonic id used as the resource-cache key alongside the asset handle.
#[derive(Debug, Clone)]
pub struct Geometry {
    id: u64,
    pub name: String,

    positions: Vec<[f32; 3]>,
    normals: Option<Vec<[f32; 3]>>,
    uvs: Option<Vec<[f32; 2]>>,
    colors: Option<Vec<[f32; 4]>>,
    indices: Option<Vec<u32>>,

    /// Set by [`dispose`](Self::dispose); a disposed geometry is never
    /// uploaded again and its drawables are skipped.
    pub disposed: bool,

    tracker: ChangeTracker,

    bounding_box: RefCell<Option<BoundingBox>>,
    bounding_sphere: RefCell<Option<BoundingSphere>>,
}

impl Geometry {
    #[must_use]
    pub fn new(name: &str, positions: Vec<[f32; 3]>) -> Self {
        Self {
            id: NEXT_GEOMETRY_ID.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
            positions,
            normals: None,
            uvs: None,
            colors: None,
            indices: None,
            disposed: false,
            tracker: ChangeTracker::new(),
            bounding_box: RefCell::new(None),
            bounding_sphere: RefCell::new(None),
        }
    }

    // ========================================================================
    // Builder-style channel setup
    // ========================================================================

    #[must_use]
    pub fn with_normals(mut self, normals: Vec<[f32; 3]>) -> Self {
        self.normals = Some(normals);
        self
    }

    #[must_use]
    pub fn with_uvs(mut self, uvs: Vec<[f32; 2]>) -> Self {
        self.uvs = Some(uvs);
        self
    }

    #[must_use]
    pub fn with_colors(mut self, colors: Vec<[f32; 4]>) -> Self {
        self.colors = Some(colors);
        self
    }

    #[must_use]
    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    // ========================================================================
    // Identity & versioning
    // ========================================================================

    /// Stable unique id of this geometry.
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

    /// Marks the geometry stale: caches re-upload on next use and bounding
    /// volumes are recomputed on next query.
    pub fn mark_needs_update(&mut self) {
        self.tracker.changed();
        self.bounding_box.replace(None);
        self.bounding_sphere.replace(None);
    }

    /// Releases the CPU-side data and flags the geometry as disposed.
    /// Idempotent.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.positions = Vec::new();
        self.normals = None;
        self.uvs = None;
        self.colors = None;
        self.indices = None;
        self.mark_needs_update();
    }

    // ========================================================================
    // Channel access & mutation
    // ========================================================================

    #[must_use]
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    #[must_use]
    pub fn normals(&self) -> Option<&[[f32; 3]]> {
        self.normals.as_deref()
    }

    #[must_use]
    pub fn uvs(&self) -> Option<&[[f32; 2]]> {
        self.uvs.as_deref()
    }

    #[must_use]
    pub fn colors(&self) -> Option<&[[f32; 4]]> {
        self.colors.as_deref()
    }

    #[must_use]
    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    pub fn set_positions(&mut self, positions: Vec<[f32; 3]>) {
        self.positions = positions;
        self.mark_needs_update();
    }

    pub fn set_normals(&mut self, normals: Option<Vec<[f32; 3]>>) {
        self.normals = normals;
        self.mark_needs_update();
    }

    pub fn set_indices(&mut self, indices: Option<Vec<u32>>) {
        self.indices = indices;
        self.mark_needs_update();
    }

    // ========================================================================
    // Derived draw metadata
    // ========================================================================

    /// 16-bit indices unless any index would overflow them.
    #[must_use]
    pub fn index_kind(&self) -> Option<IndexKind> {
        let indices = self.indices.as_ref()?;
        if indices.iter().any(|&i| i > u32::from(u16::MAX)) {
            Some(IndexKind::U32)
        } else {
            Some(IndexKind::U16)
        }
    }

    /// Element count for the draw call: index count when indexed, vertex
    /// count otherwise.
    #[must_use]
    pub fn draw_count(&self) -> u32 {
        match &self.indices {
            Some(indices) => indices.len() as u32,
            None => self.positions.len() as u32,
        }
    }

    // ========================================================================
    // Bounding volumes (computed on demand, cached)
    // ========================================================================

    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        if let Some(bbox) = *self.bounding_box.borrow() {
            return Some(bbox);
        }
        if self.positions.is_empty() {
            return None;
        }

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for p in &self.positions {
            let v = Vec3::from_array(*p);
            min = min.min(v);
            max = max.max(v);
        }

        let bbox = BoundingBox { min, max };
        self.bounding_box.replace(Some(bbox));
        Some(bbox)
    }

    #[must_use]
    pub fn bounding_sphere(&self) -> Option<BoundingSphere> {
        if let Some(sphere) = *self.bounding_sphere.borrow() {
            return Some(sphere);
        }

        let center = self.bounding_box()?.center();
        let mut radius_sq = 0.0f32;
        for p in &self.positions {
            radius_sq = radius_sq.max(center.distance_squared(Vec3::from_array(*p)));
        }

        let sphere = BoundingSphere {
            center,
            radius: radius_sq.sqrt(),
        };
        self.bounding_sphere.replace(Some(sphere));
        Some(sphere)
    }

    // ========================================================================
    // Primitives
    // ========================================================================

    /// Single triangle in the XY plane, unit-ish size.
    #[must_use]
    pub fn triangle() -> Self {
        Self::new(
            "Triangle",
            vec![[-0.5, -0.5, 0.0], [0.5, -0.5, 0.0], [0.0, 0.5, 0.0]],
        )
        .with_normals(vec![[0.0, 0.0, 1.0]; 3])
    }

    /// Axis-aligned plane in XY, centered at the origin.
    #[must_use]
    pub fn plane(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        Self::new(
            "Plane",
            vec![
                [-hw, -hh, 0.0],
                [hw, -hh, 0.0],
                [hw, hh, 0.0],
                [-hw, hh, 0.0],
            ],
        )
        .with_normals(vec![[0.0, 0.0, 1.0]; 4])
        .with_uvs(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]])
        .with_indices(vec![0, 1, 2, 0, 2, 3])
    }

    /// Axis-aligned cube centered at the origin. Shared corner vertices,
    /// flat-shading quality normals are not attempted.
    #[must_use]
    pub fn cube(size: f32) -> Self {
        let h = size * 0.5;
        let positions = vec![
            [-h, -h, -h],
            [h, -h, -h],
            [h, h, -h],
            [-h, h, -h],
            [-h, -h, h],
            [h, -h, h],
            [h, h, h],
            [-h, h, h],
        ];
        let indices = vec![
            0, 2, 1, 0, 3, 2, // back
            4, 5, 6, 4, 6, 7, // front
            0, 1, 5, 0, 5, 4, // bottom
            3, 6, 2, 3, 7, 6, // top
            0, 4, 7, 0, 7, 3, // left
            1, 2, 6, 1, 6, 5, // right
        ];
        Self::new("Cube", positions).with_indices(indices)
    }
}
