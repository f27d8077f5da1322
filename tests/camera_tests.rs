//! Camera projection and view tests
//!
//! Tests for:
//! - Perspective projection coefficients (focal length from fov)
//! - Orthographic projection coefficients
//! - Viewport resize semantics for both projections
//! - View matrix derivation from the node's world matrix

use glam::{Affine3A, Vec3, Vec4};

use fable::scene::{Camera, Projection, Scene};

const EPSILON: f32 = 1e-5;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

// ============================================================================
// Perspective projection
// ============================================================================

#[test]
fn perspective_focal_length_from_fov() {
    // f = 1 / tan(fov/2); for 60 degrees that is 1/tan(30°) = sqrt(3).
    let cam = Camera::new_perspective(60.0, 1.0, 0.1, 100.0);
    let m = cam.projection_matrix();

    assert!(approx_eq(m.col(1).y, 3.0f32.sqrt()));
    assert!(approx_eq(m.col(0).x, 3.0f32.sqrt()));
}

#[test]
fn perspective_aspect_scales_x_only() {
    let cam = Camera::new_perspective(60.0, 2.0, 0.1, 100.0);
    let m = cam.projection_matrix();

    let f = 3.0f32.sqrt();
    assert!(approx_eq(m.col(0).x, f / 2.0));
    assert!(approx_eq(m.col(1).y, f));
}

#[test]
fn set_lens_switches_to_perspective() {
    let mut cam = Camera::new_orthographic(-1.0, 1.0, 1.0, -1.0, 0.1, 10.0);
    cam.set_lens(90.0, 1.0);

    assert!(matches!(cam.projection, Projection::Perspective { .. }));
    assert!(approx_eq(cam.projection_matrix().col(1).y, 1.0));
}

// ============================================================================
// Orthographic projection
// ============================================================================

#[test]
fn orthographic_x_scale_from_bounds() {
    // (0,0) element is 2 / (right - left) = 2 / 10 = 0.2.
    let cam = Camera::new_orthographic(-5.0, 5.0, 5.0, -5.0, 0.1, 100.0);
    let m = cam.projection_matrix();

    assert!(approx_eq(m.col(0).x, 0.2));
    assert!(approx_eq(m.col(1).y, 0.2));
}

#[test]
fn set_bounds_switches_to_orthographic() {
    let mut cam = Camera::new_perspective(60.0, 1.0, 0.1, 100.0);
    cam.set_bounds(-2.0, 2.0, 2.0, -2.0);

    assert!(matches!(cam.projection, Projection::Orthographic { .. }));
    assert!(approx_eq(cam.projection_matrix().col(0).x, 0.5));
}

// ============================================================================
// Viewport resize
// ============================================================================

#[test]
fn perspective_viewport_updates_aspect() {
    let mut cam = Camera::new_perspective(60.0, 1.0, 0.1, 100.0);
    cam.set_viewport(1600, 800);

    match cam.projection {
        Projection::Perspective { aspect, .. } => assert!(approx_eq(aspect, 2.0)),
        Projection::Orthographic { .. } => panic!("projection kind changed"),
    }
    let f = 3.0f32.sqrt();
    assert!(approx_eq(cam.projection_matrix().col(0).x, f / 2.0));
}

#[test]
fn orthographic_viewport_keeps_vertical_extent() {
    let mut cam = Camera::new_orthographic(-5.0, 5.0, 5.0, -5.0, 0.1, 100.0);
    cam.set_viewport(200, 100);

    match cam.projection {
        Projection::Orthographic {
            left,
            right,
            bottom,
            top,
        } => {
            // Vertical extent untouched; horizontal recentered to aspect 2.
            assert!(approx_eq(bottom, -5.0));
            assert!(approx_eq(top, 5.0));
            assert!(approx_eq(left, -10.0));
            assert!(approx_eq(right, 10.0));
        }
        Projection::Perspective { .. } => panic!("projection kind changed"),
    }
    assert!(approx_eq(cam.projection_matrix().col(0).x, 0.1));
}

#[test]
fn zero_viewport_is_ignored() {
    let mut cam = Camera::new_perspective(60.0, 1.5, 0.1, 100.0);
    let before = *cam.projection_matrix();
    cam.set_viewport(0, 600);
    assert_eq!(*cam.projection_matrix(), before);
}

#[test]
fn set_near_far_rebuilds_projection() {
    let mut cam = Camera::new_perspective(60.0, 1.0, 0.1, 100.0);
    let before = *cam.projection_matrix();
    cam.set_near_far(1.0, 50.0);
    assert_ne!(*cam.projection_matrix(), before);
}

// ============================================================================
// View matrix
// ============================================================================

#[test]
fn view_matrix_is_inverse_of_world() {
    let mut cam = Camera::new_perspective(60.0, 1.0, 0.1, 100.0);
    let world = Affine3A::from_translation(Vec3::new(0.0, 0.0, 5.0));
    cam.update_view(&world);

    // A camera at z=5 maps the world origin to z=-5 in view space.
    let origin = *cam.view_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
    assert!(approx_eq(origin.z, -5.0));

    let vp = *cam.projection_matrix() * *cam.view_matrix();
    assert_eq!(*cam.view_projection_matrix(), vp);
}

#[test]
fn transform_system_refreshes_camera_view() {
    let mut scene = Scene::new();
    let node = scene.build_node("camera").with_position(0.0, 0.0, 5.0).build();
    scene.set_camera(node, Camera::new_perspective(60.0, 1.0, 0.1, 100.0));

    scene.update_matrix_world();

    let cam = scene.get_camera(node).unwrap();
    let origin = *cam.view_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
    assert!(approx_eq(origin.z, -5.0));
}
