/// Frustum — six clipping planes for visibility culling.
///
/// Each plane is represented as a Vec4 (A, B, C, D) where:
/// - (A, B, C) is the inward-pointing normal
/// - D is the signed distance
/// - A point P is inside the frustum if dot(plane, P_homogeneous) >= 0 for all planes
///
/// A distance of exactly zero counts as inside: boundary-touching boxes never
/// flicker out at the edge of the view volume.

use glam::{Mat4, Vec3, Vec4};
use crate::scene::AABB;

/// Result of a 3-way frustum/AABB classification.
///
/// Used by the spatial index for hierarchical culling:
/// - `Outside` → skip the entire subtree
/// - `Inside` → collect all objects without further testing
/// - `Intersect` → test individual objects and recurse into children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumTest {
    /// AABB is entirely outside the frustum
    Outside,
    /// AABB is entirely inside the frustum
    Inside,
    /// AABB straddles at least one active plane
    Intersect,
}

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

/// Number of frustum planes
pub const PLANE_COUNT: usize = 6;

/// Plane mask with all six planes active
pub const ALL_PLANES_MASK: u8 = 0x3F;

/// Culling state threaded through a hierarchical traversal.
///
/// `plane_mask` holds the planes still worth testing: when a node is fully
/// inside a plane's half-space, that plane is cleared for all descendants.
/// `start_plane` is the plane that most recently rejected a box — testing it
/// first short-circuits quickly for neighboring boxes, which tend to fail on
/// the same plane.
#[derive(Debug, Clone, Copy)]
pub struct CullContext {
    /// Bitmask of planes still active (bit i = plane i)
    pub plane_mask: u8,
    /// Plane index tested first
    pub start_plane: usize,
}

impl CullContext {
    /// Fresh state: all planes active, starting at the left plane.
    pub fn new() -> Self {
        Self { plane_mask: ALL_PLANES_MASK, start_plane: 0 }
    }
}

impl Default for CullContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Six frustum planes for culling.
///
/// Each plane is (A, B, C, D) where Ax + By + Cz + D = 0.
/// Normal (A, B, C) points inward (toward the visible volume).
/// Works with both perspective and orthographic projections.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    /// Frustum planes: left, right, bottom, top, near, far
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix.
    ///
    /// Uses the Gribb & Hartmann method. Works for both perspective
    /// and orthographic projections.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let m = vp.to_cols_array_2d();

        // Gribb & Hartmann: extract planes from rows of the VP matrix
        let mut planes = [
            // Left:   row3 + row0
            Vec4::new(m[0][3] + m[0][0], m[1][3] + m[1][0], m[2][3] + m[2][0], m[3][3] + m[3][0]),
            // Right:  row3 - row0
            Vec4::new(m[0][3] - m[0][0], m[1][3] - m[1][0], m[2][3] - m[2][0], m[3][3] - m[3][0]),
            // Bottom: row3 + row1
            Vec4::new(m[0][3] + m[0][1], m[1][3] + m[1][1], m[2][3] + m[2][1], m[3][3] + m[3][1]),
            // Top:    row3 - row1
            Vec4::new(m[0][3] - m[0][1], m[1][3] - m[1][1], m[2][3] - m[2][1], m[3][3] - m[3][1]),
            // Near:   row3 + row2
            Vec4::new(m[0][3] + m[0][2], m[1][3] + m[1][2], m[2][3] + m[2][2], m[3][3] + m[3][2]),
            // Far:    row3 - row2
            Vec4::new(m[0][3] - m[0][2], m[1][3] - m[1][2], m[2][3] - m[2][2], m[3][3] - m[3][2]),
        ];

        // Normalize each plane
        for plane in &mut planes {
            let normal_len = Vec3::new(plane.x, plane.y, plane.z).length();
            if normal_len > 0.0 {
                *plane /= normal_len;
            }
        }

        Self { planes }
    }

    /// Corner of the box most in the direction of the plane normal.
    #[inline]
    fn p_vertex(normal: Vec3, aabb: &AABB) -> Vec3 {
        Vec3::new(
            if normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
            if normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
            if normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
        )
    }

    /// Corner of the box least in the direction of the plane normal.
    #[inline]
    fn n_vertex(normal: Vec3, aabb: &AABB) -> Vec3 {
        Vec3::new(
            if normal.x >= 0.0 { aabb.min.x } else { aabb.max.x },
            if normal.y >= 0.0 { aabb.min.y } else { aabb.max.y },
            if normal.z >= 0.0 { aabb.min.z } else { aabb.max.z },
        )
    }

    /// Test if an AABB intersects this frustum.
    ///
    /// Uses the "positive vertex" test: for each plane, find the AABB corner
    /// most in the direction of the plane normal. If that corner is outside,
    /// the AABB is fully outside.
    ///
    /// Returns `true` if the AABB is (potentially) inside or intersecting.
    /// May return false positives (conservative), never false negatives.
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        for plane in &self.planes {
            let normal = Vec3::new(plane.x, plane.y, plane.z);
            if normal.dot(Self::p_vertex(normal, aabb)) + plane.w < 0.0 {
                return false;
            }
        }
        true
    }

    /// Classify an AABB against the frustum (3-way test, fresh state).
    pub fn classify_aabb(&self, aabb: &AABB) -> FrustumTest {
        self.classify_with(aabb, &mut CullContext::new())
    }

    /// Classify an AABB using and updating hierarchical culling state.
    ///
    /// Only planes in `ctx.plane_mask` are tested, starting at
    /// `ctx.start_plane`. On return:
    /// - `Outside`: `ctx.start_plane` is the rejecting plane (siblings test
    ///   it first); the mask is unchanged.
    /// - `Inside`/`Intersect`: planes whose half-space fully contains the box
    ///   are cleared from `ctx.plane_mask`; descendants inherit the reduced
    ///   mask and skip those planes entirely.
    pub fn classify_with(&self, aabb: &AABB, ctx: &mut CullContext) -> FrustumTest {
        let mut mask = ctx.plane_mask;

        for step in 0..PLANE_COUNT {
            let p = (ctx.start_plane + step) % PLANE_COUNT;
            let bit = 1u8 << p;
            if mask & bit == 0 {
                continue;
            }

            let plane = &self.planes[p];
            let normal = Vec3::new(plane.x, plane.y, plane.z);

            // p-vertex outside → entire AABB is outside
            if normal.dot(Self::p_vertex(normal, aabb)) + plane.w < 0.0 {
                ctx.start_plane = p;
                return FrustumTest::Outside;
            }

            // n-vertex inside → box fully inside this half-space
            if normal.dot(Self::n_vertex(normal, aabb)) + plane.w >= 0.0 {
                mask &= !bit;
            }
        }

        ctx.plane_mask = mask;
        if mask == 0 {
            FrustumTest::Inside
        } else {
            FrustumTest::Intersect
        }
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
