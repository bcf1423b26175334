use glam::Vec3;
use crate::camera::Camera;
use super::*;

fn view_camera() -> Camera {
    let mut camera = Camera::new();
    camera.setup_perspective(std::f32::consts::FRAC_PI_3, 16.0 / 9.0, 0.1, 300.0);
    camera.set_position(Vec3::new(0.37, 4.2, 9.1));
    camera.set_direction(Vec3::new(0.3, -0.1, -1.0).normalize());
    camera
}

fn light_dir() -> Vec3 {
    Vec3::new(-0.4, -1.0, -0.3).normalize()
}

#[test]
fn test_cascade_count_and_intervals() {
    let config = CascadeConfig::default_four_split();
    let cascades = build_cascades(&view_camera(), light_dir(), &config);

    assert_eq!(cascades.len(), 4);
    for (cascade, interval) in cascades.iter().zip(&config.split_intervals) {
        assert_eq!(cascade.interval, *interval);
    }
}

#[test]
fn test_cascade_cameras_are_orthographic() {
    let cascades =
        build_cascades(&view_camera(), light_dir(), &CascadeConfig::default_four_split());
    for cascade in &cascades {
        assert!(cascade.camera.is_orthographic());
        assert!((cascade.camera.direction() - light_dir()).length() < 1e-5);
    }
}

#[test]
fn test_cascade_volume_contains_sub_frustum() {
    let camera = view_camera();
    let config = CascadeConfig::default_four_split();
    let cascades = build_cascades(&camera, light_dir(), &config);

    for cascade in &cascades {
        let frustum = cascade.camera.build_frustum();
        let corners = super::sub_frustum_corners(&camera, cascade.interval);
        for corner in &corners {
            // Tiny box around the corner; allow a border epsilon
            let eps = cascade.texel_size;
            let aabb = crate::scene::AABB::new(
                *corner - Vec3::splat(eps),
                *corner + Vec3::splat(eps),
            );
            assert!(
                frustum.intersects_aabb(&aabb),
                "corner {:?} outside cascade {:?}",
                corner,
                cascade.interval
            );
        }
    }
}

#[test]
fn test_extents_lie_on_texel_grid() {
    let cascades =
        build_cascades(&view_camera(), light_dir(), &CascadeConfig::default_four_split());
    for cascade in &cascades {
        let texel = cascade.texel_size;
        for v in [cascade.min_extent.x, cascade.min_extent.y] {
            let cells = v / texel;
            assert!(
                (cells - cells.round()).abs() < 1e-3,
                "extent {} not on the {}-sized texel grid",
                v,
                texel
            );
        }
    }
}

#[test]
fn test_whole_texel_camera_shift_moves_extents_exactly() {
    let config = CascadeConfig::default_four_split();
    let mut camera = view_camera();
    let dir = light_dir();

    let first = build_cascades(&camera, dir, &config);
    let texel = first[0].texel_size;

    // Shift the camera by exactly 3 texels along the light-space X axis
    let light_x_world = light_view_matrix(dir).inverse().transform_vector3(Vec3::X);
    camera.set_position(camera.position() + light_x_world * (3.0 * texel));
    let second = build_cascades(&camera, dir, &config);

    let dx = second[0].min_extent.x - first[0].min_extent.x;
    let dy = second[0].min_extent.y - first[0].min_extent.y;
    assert!((dx - 3.0 * texel).abs() < texel * 1e-2, "dx = {}, texel = {}", dx, texel);
    assert!(dy.abs() < texel * 1e-2, "dy = {}", dy);
}

#[test]
fn test_sub_texel_shift_snaps_to_whole_texels() {
    let config = CascadeConfig::default_four_split();
    let mut camera = view_camera();
    let dir = light_dir();

    let first = build_cascades(&camera, dir, &config);
    let texel = first[0].texel_size;

    let light_x_world = light_view_matrix(dir).inverse().transform_vector3(Vec3::X);
    camera.set_position(camera.position() + light_x_world * (0.25 * texel));
    let second = build_cascades(&camera, dir, &config);

    // The snapped extent may only move in whole-texel steps — never by the
    // fractional camera motion itself (that fraction is the shimmer)
    let dx = second[0].min_extent.x - first[0].min_extent.x;
    let steps = dx / texel;
    assert!(
        (steps - steps.round()).abs() < 1e-2,
        "extent moved by a fractional texel: {}",
        steps
    );
}

#[test]
fn test_volume_side_constant_under_translation() {
    let config = CascadeConfig::default_four_split();
    let mut camera = view_camera();
    let dir = light_dir();

    let first = build_cascades(&camera, dir, &config);
    camera.set_position(camera.position() + Vec3::new(7.3, -2.1, 4.9));
    let second = build_cascades(&camera, dir, &config);

    for (a, b) in first.iter().zip(&second) {
        let side_a = a.max_extent.x - a.min_extent.x;
        let side_b = b.max_extent.x - b.min_extent.x;
        assert!((side_a - side_b).abs() < side_a * 1e-4);
        assert!((a.texel_size - b.texel_size).abs() < a.texel_size * 1e-4);
    }
}

#[test]
fn test_cascade_viewports_tile_the_atlas() {
    let config = CascadeConfig::default_four_split();
    let cascades = build_cascades(&view_camera(), light_dir(), &config);

    for (i, cascade) in cascades.iter().enumerate() {
        assert_eq!(cascade.viewport.x, (i as u32 * config.shadow_map_size) as i32);
        assert_eq!(cascade.viewport.width, config.shadow_map_size);
    }
}

#[test]
fn test_vertical_light_uses_alternate_up() {
    // Straight-down light must not degenerate
    let cascades = build_cascades(
        &view_camera(),
        Vec3::new(0.0, -1.0, 0.0),
        &CascadeConfig::default_four_split(),
    );
    for cascade in &cascades {
        assert!(cascade.texel_size.is_finite());
        assert!(cascade.texel_size > 0.0);
        assert!(cascade.max_extent.x > cascade.min_extent.x);
    }
}
