/// Directional-light shadow cascades.
///
/// Split selection is configuration, not algorithm: the caller supplies the
/// view-depth intervals, this module only reconstructs each sub-frustum,
/// fits a square orthographic volume around it in light space and snaps the
/// volume to shadow-texel increments. The snapping is required correctness,
/// not an optimization — without it the rasterization grid slides under
/// camera motion and cascade edges shimmer.

use glam::{Mat4, Vec3};
use crate::camera::Camera;
use crate::gpu::Rect2D;
use crate::scene::AABB;

/// Cascade configuration.
#[derive(Debug, Clone)]
pub struct CascadeConfig {
    /// View-depth interval (near, far) per cascade, supplied externally
    pub split_intervals: Vec<(f32, f32)>,
    /// Shadow-map resolution of one cascade tile
    pub shadow_map_size: u32,
}

impl CascadeConfig {
    /// Four-cascade default over a 300-unit view distance.
    pub fn default_four_split() -> Self {
        Self {
            split_intervals: vec![(0.1, 15.0), (15.0, 50.0), (50.0, 120.0), (120.0, 300.0)],
            shadow_map_size: 1024,
        }
    }
}

/// One shadow cascade: a tight, texel-snapped orthographic light camera
/// plus its tile in the shadow atlas.
#[derive(Debug, Clone)]
pub struct ShadowCascade {
    /// The view-depth interval this cascade covers
    pub interval: (f32, f32),
    /// Orthographic camera rendering the cascade's shadow map
    pub camera: Camera,
    /// Snapped light-space extents (diagnostics and shimmer tests)
    pub min_extent: Vec3,
    pub max_extent: Vec3,
    /// World-space size of one shadow texel in this cascade
    pub texel_size: f32,
    /// Tile within the cascade shadow atlas
    pub viewport: Rect2D,
}

/// Rotation-only view matrix looking along the light direction.
pub fn light_view_matrix(light_dir: Vec3) -> Mat4 {
    let dir = light_dir.normalize_or_zero();
    let up = if dir.dot(Vec3::Y).abs() > 0.99 { Vec3::Z } else { Vec3::Y };
    Mat4::look_to_rh(Vec3::ZERO, dir, up)
}

/// World-space corners of the camera sub-frustum covering a view-depth
/// interval.
///
/// The full frustum's near/far corner pairs are unprojected once; corners of
/// the sub-interval lie on those edges at the linear view-depth fraction.
fn sub_frustum_corners(camera: &Camera, interval: (f32, f32)) -> [Vec3; 8] {
    let inv_vp = camera.view_projection_matrix().inverse();

    // NDC corners, near plane (depth 0) then far plane (depth 1)
    let ndc = [
        Vec3::new(-1.0, -1.0, 0.0),
        Vec3::new(1.0, -1.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(-1.0, 1.0, 0.0),
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(-1.0, 1.0, 1.0),
    ];
    let full: Vec<Vec3> = ndc.iter().map(|&c| inv_vp.project_point3(c)).collect();

    let depth_range = camera.z_far() - camera.z_near();
    let t0 = (interval.0 - camera.z_near()) / depth_range;
    let t1 = (interval.1 - camera.z_near()) / depth_range;

    let mut corners = [Vec3::ZERO; 8];
    for i in 0..4 {
        let near = full[i];
        let far = full[i + 4];
        corners[i] = near.lerp(far, t0);
        corners[i + 4] = near.lerp(far, t1);
    }
    corners
}

/// Longest distance between any two corners — the side length of the
/// square shadow volume. Rotation-invariant, so camera translation never
/// changes it.
fn frustum_diameter(corners: &[Vec3; 8]) -> f32 {
    let mut diameter = 0.0f32;
    for i in 0..8 {
        for j in (i + 1)..8 {
            diameter = diameter.max(corners[i].distance(corners[j]));
        }
    }
    diameter
}

/// Build tight-fitting, texel-snapped orthographic frustums for every
/// configured cascade interval.
pub fn build_cascades(
    camera: &Camera,
    light_dir: Vec3,
    config: &CascadeConfig,
) -> Vec<ShadowCascade> {
    let dir = light_dir.normalize_or_zero();
    let light_view = light_view_matrix(dir);
    let light_to_world = light_view.inverse();
    let up = if dir.dot(Vec3::Y).abs() > 0.99 { Vec3::Z } else { Vec3::Y };

    let mut cascades = Vec::with_capacity(config.split_intervals.len());

    for (index, &interval) in config.split_intervals.iter().enumerate() {
        let corners = sub_frustum_corners(camera, interval);

        // Fit the sub-frustum in light space
        let mut light_box = AABB::empty();
        for corner in &corners {
            light_box.add_point(light_view.transform_point3(*corner));
        }

        // Square volume sized by the sub-frustum diameter: its extent never
        // changes as the camera rotates, so texels keep a constant footprint
        let side = frustum_diameter(&corners);
        let texel_size = side / config.shadow_map_size as f32;

        // Snap the volume's lower corner to the texel grid; extents then
        // only ever move in whole-texel steps under camera motion
        let snapped_x = (light_box.min.x / texel_size).floor() * texel_size;
        let snapped_y = (light_box.min.y / texel_size).floor() * texel_size;

        let min_extent = Vec3::new(snapped_x, snapped_y, light_box.min.z);
        let max_extent = Vec3::new(snapped_x + side, snapped_y + side, light_box.max.z);

        // Depth range pulled toward the light by one volume length so
        // casters outside the view frustum still land in the map
        let caster_backup = side;
        let center_ls = Vec3::new(
            snapped_x + side * 0.5,
            snapped_y + side * 0.5,
            light_box.max.z + caster_backup,
        );
        let position = light_to_world.transform_point3(center_ls);
        let depth = (light_box.max.z + caster_backup) - light_box.min.z;

        let mut cascade_camera = Camera::new();
        cascade_camera.set_position(position);
        cascade_camera.set_direction(dir);
        cascade_camera.set_up(up);
        cascade_camera.setup_orthographic(side, side, 0.0, depth);

        let size = config.shadow_map_size;
        cascades.push(ShadowCascade {
            interval,
            camera: cascade_camera,
            min_extent,
            max_extent,
            texel_size,
            viewport: Rect2D {
                x: (index as u32 * size) as i32,
                y: 0,
                width: size,
                height: size,
            },
        });
    }

    cascades
}

#[cfg(test)]
#[path = "cascade_tests.rs"]
mod tests;
