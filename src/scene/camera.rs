use glam::{Affine3A, Mat4};

/// Projection parameters.
///
/// Perspective keeps a vertical field of view (radians) plus an aspect ratio;
/// orthographic keeps an explicit view box. Near/far planes are shared and
/// live on the [`Camera`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective {
        /// Vertical field of view, radians
        fov_y: f32,
        /// Width / height
        aspect: f32,
    },
    Orthographic {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
    },
}

/// Camera component.
///
/// A camera is a plain component attached to a scene node; its placement is
/// the node's transform. The projection matrix is recomputed eagerly on
/// construction and on every parameter change, the view matrix is the inverse
/// of the node's world matrix and is refreshed by the transform system
/// whenever the node moves.
#[derive(Debug, Clone)]
pub struct Camera {
    pub projection: Projection,
    pub near: f32,
    pub far: f32,

    // Cached matrices, renderer read-only.
    pub(crate) world_matrix: Affine3A,
    pub(crate) view_matrix: Mat4,
    pub(crate) projection_matrix: Mat4,
    pub(crate) view_projection_matrix: Mat4,
}

impl Camera {
    /// Perspective camera. `fov_y_degrees` is the vertical field of view.
    #[must_use]
    pub fn new_perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut cam = Self {
            projection: Projection::Perspective {
                fov_y: fov_y_degrees.to_radians(),
                aspect,
            },
            near,
            far,
            world_matrix: Affine3A::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            view_projection_matrix: Mat4::IDENTITY,
        };
        cam.update_projection_matrix();
        cam
    }

    /// Orthographic camera with an explicit view box.
    #[must_use]
    pub fn new_orthographic(
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let mut cam = Self {
            projection: Projection::Orthographic {
                left,
                right,
                bottom,
                top,
            },
            near,
            far,
            world_matrix: Affine3A::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            view_projection_matrix: Mat4::IDENTITY,
        };
        cam.update_projection_matrix();
        cam
    }

    // ========================================================================
    // Projection parameters
    // ========================================================================

    /// Rebuilds the projection matrix from the current parameters.
    pub fn update_projection_matrix(&mut self) {
        self.projection_matrix = match self.projection {
            Projection::Perspective { fov_y, aspect } => {
                Mat4::perspective_rh(fov_y, aspect, self.near, self.far)
            }
            Projection::Orthographic {
                left,
                right,
                bottom,
                top,
            } => Mat4::orthographic_rh(left, right, bottom, top, self.near, self.far),
        };

        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    /// Resets the perspective lens. Switches an orthographic camera to
    /// perspective projection.
    pub fn set_lens(&mut self, fov_y_degrees: f32, aspect: f32) {
        self.projection = Projection::Perspective {
            fov_y: fov_y_degrees.to_radians(),
            aspect,
        };
        self.update_projection_matrix();
    }

    /// Resets the orthographic view box. Switches a perspective camera to
    /// orthographic projection.
    pub fn set_bounds(&mut self, left: f32, right: f32, top: f32, bottom: f32) {
        self.projection = Projection::Orthographic {
            left,
            right,
            bottom,
            top,
        };
        self.update_projection_matrix();
    }

    pub fn set_near_far(&mut self, near: f32, far: f32) {
        self.near = near;
        self.far = far;
        self.update_projection_matrix();
    }

    /// Adapts the projection to a new viewport size.
    ///
    /// Perspective cameras take the new aspect ratio; orthographic cameras
    /// keep their vertical extent and recenter left/right around the existing
    /// horizontal midpoint.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let aspect = width as f32 / height as f32;

        match &mut self.projection {
            Projection::Perspective { aspect: a, .. } => {
                *a = aspect;
            }
            Projection::Orthographic {
                left,
                right,
                bottom,
                top,
            } => {
                let center_x = (*left + *right) * 0.5;
                let half_width = (*top - *bottom) * 0.5 * aspect;
                *left = center_x - half_width;
                *right = center_x + half_width;
            }
        }
        self.update_projection_matrix();
    }

    // ========================================================================
    // View matrix
    // ========================================================================

    /// Refreshes the cached view matrices from the owning node's world
    /// matrix. Called by the transform system whenever the node recomputes.
    pub fn update_view(&mut self, world_transform: &Affine3A) {
        self.world_matrix = *world_transform;
        self.view_matrix = Mat4::from(*world_transform).inverse();
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    #[inline]
    #[must_use]
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    #[inline]
    #[must_use]
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    #[inline]
    #[must_use]
    pub fn view_projection_matrix(&self) -> &Mat4 {
        &self.view_projection_matrix
    }
}
