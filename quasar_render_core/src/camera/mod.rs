/// Camera module — cameras and frustum culling primitives.

mod camera;
mod frustum;

pub use camera::Camera;
pub use frustum::{
    CullContext, Frustum, FrustumTest, ALL_PLANES_MASK, PLANE_BOTTOM, PLANE_COUNT, PLANE_FAR,
    PLANE_LEFT, PLANE_NEAR, PLANE_RIGHT, PLANE_TOP,
};
