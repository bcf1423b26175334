/// Camera — projection/view parameters and derived matrices.
///
/// The camera owns its parameters (position, orientation, projection) and
/// derives matrices on demand. It does NOT cache a frustum across frames:
/// the culling hot path rebuilds one from the current view-projection each
/// time it runs, so a camera can never be culled against stale planes.

use glam::{Mat4, Vec3};
use super::frustum::Frustum;

/// Projection kind and parameters
#[derive(Debug, Clone, Copy)]
enum Projection {
    Perspective { fov_y: f32, aspect: f32 },
    Orthographic { width: f32, height: f32 },
}

/// Camera with position/orientation and a perspective or orthographic
/// projection.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    direction: Vec3,
    up: Vec3,
    projection: Projection,
    z_near: f32,
    z_far: f32,
}

impl Camera {
    /// Perspective camera at the origin looking down -Z.
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            up: Vec3::Y,
            projection: Projection::Perspective {
                fov_y: std::f32::consts::FRAC_PI_2,
                aspect: 1.0,
            },
            z_near: 0.1,
            z_far: 1000.0,
        }
    }

    /// Configure a perspective projection.
    pub fn setup_perspective(&mut self, fov_y: f32, aspect: f32, z_near: f32, z_far: f32) {
        self.projection = Projection::Perspective { fov_y, aspect };
        self.z_near = z_near;
        self.z_far = z_far;
    }

    /// Configure an orthographic projection (width/height of the view volume).
    pub fn setup_orthographic(&mut self, width: f32, height: f32, z_near: f32, z_far: f32) {
        self.projection = Projection::Orthographic { width, height };
        self.z_near = z_near;
        self.z_far = z_far;
    }

    /// Place the camera.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Point the camera along a direction (normalized internally).
    pub fn set_direction(&mut self, direction: Vec3) {
        self.direction = direction.normalize_or_zero();
    }

    /// Set the up vector.
    pub fn set_up(&mut self, up: Vec3) {
        self.up = up.normalize_or_zero();
    }

    /// Aim at a target point.
    pub fn look_at(&mut self, target: Vec3) {
        self.set_direction(target - self.position);
    }

    // ===== ACCESSORS =====

    /// World position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Normalized view direction
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Up vector
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Vertical field of view in radians (0 for orthographic cameras)
    pub fn fov(&self) -> f32 {
        match self.projection {
            Projection::Perspective { fov_y, .. } => fov_y,
            Projection::Orthographic { .. } => 0.0,
        }
    }

    /// Aspect ratio (width / height)
    pub fn aspect(&self) -> f32 {
        match self.projection {
            Projection::Perspective { aspect, .. } => aspect,
            Projection::Orthographic { width, height } => width / height,
        }
    }

    /// Near clip distance
    pub fn z_near(&self) -> f32 {
        self.z_near
    }

    /// Far clip distance
    pub fn z_far(&self) -> f32 {
        self.z_far
    }

    /// Whether this camera uses an orthographic projection
    pub fn is_orthographic(&self) -> bool {
        matches!(self.projection, Projection::Orthographic { .. })
    }

    // ===== DERIVED MATRICES =====

    /// View matrix (world → view)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.direction, self.up)
    }

    /// Projection matrix (view → clip)
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective { fov_y, aspect } => {
                Mat4::perspective_rh(fov_y, aspect, self.z_near, self.z_far)
            }
            Projection::Orthographic { width, height } => Mat4::orthographic_rh(
                -width * 0.5,
                width * 0.5,
                -height * 0.5,
                height * 0.5,
                self.z_near,
                self.z_far,
            ),
        }
    }

    /// Combined view-projection matrix (projection * view)
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Build the frustum for the current view-projection.
    ///
    /// Called at the start of every culling run.
    pub fn build_frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection_matrix())
    }

    /// Camera mirrored across a plane (point + normal).
    ///
    /// Used by the water reflection pass: the scene is rendered from the
    /// mirrored camera into an offscreen target before the main pass samples
    /// it.
    pub fn reflected(&self, plane_point: Vec3, plane_normal: Vec3) -> Camera {
        let n = plane_normal.normalize_or_zero();
        let reflect_point =
            |p: Vec3| p - 2.0 * n * (p - plane_point).dot(n);
        let reflect_dir = |d: Vec3| d - 2.0 * n * d.dot(n);

        let mut mirrored = self.clone();
        mirrored.position = reflect_point(self.position);
        mirrored.direction = reflect_dir(self.direction).normalize_or_zero();
        mirrored.up = reflect_dir(self.up).normalize_or_zero();
        mirrored
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
