//! Transform and hierarchy propagation tests
//!
//! Tests for:
//! - Transform TRS operations and dirty checking
//! - Euler angle round-trip conversions
//! - look_at orientation
//! - apply_local_matrix decomposition
//! - World-matrix composition through the scene hierarchy
//! - Forced subtree updates

use glam::{Affine3A, EulerRot, Quat, Vec3};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use fable::scene::{Scene, Transform};

// ============================================================================
// Helpers
// ============================================================================

const EPSILON: f32 = 1e-5;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
}

// ============================================================================
// Transform unit tests
// ============================================================================

#[test]
fn transform_default_is_identity() {
    let mut t = Transform::new();
    t.update_local_matrix();
    assert_eq!(*t.local_matrix(), Affine3A::IDENTITY);
    assert_eq!(t.position, Vec3::ZERO);
    assert_eq!(t.rotation, Quat::IDENTITY);
    assert_eq!(t.scale, Vec3::ONE);
}

#[test]
fn update_local_matrix_detects_direct_field_writes() {
    let mut t = Transform::new();
    t.update_local_matrix();

    // Clean transform: nothing to rebuild.
    assert!(!t.update_local_matrix());

    // Direct field assignment is picked up by the shadow-state compare.
    t.position = Vec3::new(1.0, 2.0, 3.0);
    assert!(t.update_local_matrix());
    assert!(vec3_approx(
        Vec3::from(t.local_matrix().translation),
        Vec3::new(1.0, 2.0, 3.0)
    ));

    // And it is clean again afterwards.
    assert!(!t.update_local_matrix());
}

#[test]
fn mark_dirty_forces_rebuild_without_changes() {
    let mut t = Transform::new();
    t.update_local_matrix();
    assert!(!t.update_local_matrix());

    t.mark_dirty();
    assert!(t.update_local_matrix());
}

#[test]
fn set_rotation_normalizes() {
    let mut t = Transform::new();
    t.set_rotation(Quat::from_xyzw(0.0, 2.0, 0.0, 0.0));
    assert!(approx_eq(t.rotation.length(), 1.0));
}

#[test]
fn euler_round_trip() {
    let mut t = Transform::new();
    t.set_rotation_euler(FRAC_PI_4, FRAC_PI_2 * 0.5, 0.3);
    let euler = t.rotation_euler();
    assert!(approx_eq(euler.x, FRAC_PI_4));
    assert!(approx_eq(euler.y, FRAC_PI_2 * 0.5));
    assert!(approx_eq(euler.z, 0.3));
}

#[test]
fn look_at_points_negative_z_at_target() {
    let mut t = Transform::new();
    t.position = Vec3::new(0.0, 0.0, 5.0);
    t.look_at(Vec3::ZERO, Vec3::Y);

    let forward = t.rotation * Vec3::NEG_Z;
    assert!(vec3_approx(forward, Vec3::NEG_Z));
}

#[test]
fn look_at_collinear_up_is_noop() {
    let mut t = Transform::new();
    let before = t.rotation;
    // Target straight up while up is +Y: degenerate, rotation untouched.
    t.look_at(Vec3::new(0.0, 10.0, 0.0), Vec3::Y);
    assert_eq!(t.rotation, before);
}

#[test]
fn apply_local_matrix_decomposes_trs() {
    let mut t = Transform::new();
    let mat = Affine3A::from_scale_rotation_translation(
        Vec3::splat(2.0),
        Quat::from_rotation_y(FRAC_PI_2),
        Vec3::new(4.0, 5.0, 6.0),
    );
    t.apply_local_matrix(mat);

    assert!(vec3_approx(t.position, Vec3::new(4.0, 5.0, 6.0)));
    assert!(vec3_approx(t.scale, Vec3::splat(2.0)));
    let forward = t.rotation * Vec3::NEG_Z;
    assert!(vec3_approx(forward, Vec3::NEG_X));
}

// ============================================================================
// Hierarchy propagation
// ============================================================================

#[test]
fn world_matrix_composes_parent_times_local() {
    let mut scene = Scene::new();
    let parent = scene.build_node("parent").with_position(1.0, 0.0, 0.0).build();
    let child = scene
        .build_node("child")
        .with_position(0.0, 2.0, 0.0)
        .with_parent(parent)
        .build();

    scene.update_matrix_world();

    let parent_world = *scene.get_node(parent).unwrap().world_matrix();
    let child_node = scene.get_node(child).unwrap();
    let expected = parent_world * *child_node.transform.local_matrix();
    assert_eq!(*child_node.world_matrix(), expected);
    assert!(vec3_approx(
        Vec3::from(child_node.world_matrix().translation),
        Vec3::new(1.0, 2.0, 0.0)
    ));
}

#[test]
fn parentless_world_equals_local() {
    let mut scene = Scene::new();
    let root = scene.build_node("solo").with_position(7.0, 8.0, 9.0).build();

    scene.update_matrix_world();

    let node = scene.get_node(root).unwrap();
    assert_eq!(*node.world_matrix(), *node.transform.local_matrix());
}

#[test]
fn deep_chain_accumulates_translation_and_scale() {
    let mut scene = Scene::new();
    let a = scene.build_node("a").with_position(1.0, 0.0, 0.0).with_scale(2.0).build();
    let b = scene
        .build_node("b")
        .with_position(1.0, 0.0, 0.0)
        .with_parent(a)
        .build();
    let c = scene
        .build_node("c")
        .with_position(1.0, 0.0, 0.0)
        .with_parent(b)
        .build();

    scene.update_matrix_world();

    // a at 1, b at 1 + 2*1 = 3, c at 3 + 2*1 = 5 (scale 2 inherited from a).
    let world = scene.get_node(c).unwrap().world_matrix().translation;
    assert!(approx_eq(world.x, 5.0));
}

#[test]
fn clean_child_follows_moved_parent() {
    let mut scene = Scene::new();
    let parent = scene.create_node_with_name("parent");
    let child = scene
        .build_node("child")
        .with_position(0.0, 1.0, 0.0)
        .with_parent(parent)
        .build();

    scene.update_matrix_world();

    // The child's own state is clean, but the parent moved: forced
    // propagation must still reach it.
    scene.get_node_mut(parent).unwrap().transform.position = Vec3::new(3.0, 0.0, 0.0);
    scene.update_matrix_world();

    let world = scene.get_node(child).unwrap().world_matrix().translation;
    assert!(approx_eq(world.x, 3.0));
    assert!(approx_eq(world.y, 1.0));
}

#[test]
fn second_update_is_stable() {
    let mut scene = Scene::new();
    let parent = scene.build_node("parent").with_position(1.0, 2.0, 3.0).build();
    let child = scene.build_node("child").with_parent(parent).build();

    scene.update_matrix_world();
    let first = *scene.get_node(child).unwrap().world_matrix();
    scene.update_matrix_world();
    let second = *scene.get_node(child).unwrap().world_matrix();

    assert_eq!(first, second);
}

#[test]
fn update_subtree_forces_recompute() {
    let mut scene = Scene::new();
    let parent = scene.create_node_with_name("parent");
    let child = scene.build_node("child").with_parent(parent).build();
    scene.update_matrix_world();

    // Mutate below the radar of the full pass, then force just the subtree.
    scene.get_node_mut(child).unwrap().transform.position = Vec3::new(0.0, 0.0, 4.0);
    scene.update_subtree(parent);

    let world = scene.get_node(child).unwrap().world_matrix().translation;
    assert!(approx_eq(world.z, 4.0));
}

#[test]
fn reparenting_rebases_world_matrix() {
    let mut scene = Scene::new();
    let a = scene.build_node("a").with_position(10.0, 0.0, 0.0).build();
    let b = scene.build_node("b").with_position(-10.0, 0.0, 0.0).build();
    let child = scene
        .build_node("child")
        .with_position(1.0, 0.0, 0.0)
        .with_parent(a)
        .build();

    scene.update_matrix_world();
    assert!(approx_eq(
        scene.get_node(child).unwrap().world_matrix().translation.x,
        11.0
    ));

    scene.attach(child, b);
    scene.update_matrix_world();
    assert!(approx_eq(
        scene.get_node(child).unwrap().world_matrix().translation.x,
        -9.0
    ));
}

#[test]
fn detach_rebases_to_local() {
    let mut scene = Scene::new();
    let parent = scene.build_node("parent").with_position(5.0, 0.0, 0.0).build();
    let child = scene
        .build_node("child")
        .with_position(1.0, 0.0, 0.0)
        .with_parent(parent)
        .build();

    scene.update_matrix_world();
    scene.detach(child);
    scene.update_matrix_world();

    let node = scene.get_node(child).unwrap();
    assert_eq!(*node.world_matrix(), *node.transform.local_matrix());
    assert!(approx_eq(node.world_matrix().translation.x, 1.0));
}

#[test]
fn rotation_euler_helper_matches_quat() {
    let mut t = Transform::new();
    t.set_rotation_euler(0.0, FRAC_PI_2, 0.0);
    let expected = Quat::from_euler(EulerRot::XYZ, 0.0, FRAC_PI_2, 0.0);
    assert!(t.rotation.dot(expected).abs() > 1.0 - EPSILON);
}
