/// Light/shadow module — directional cascades and point-light cube faces.

mod cascade;
mod point_light;

pub use cascade::{build_cascades, light_view_matrix, CascadeConfig, ShadowCascade};
pub use point_light::{PointLightShadow, ShadowAtlas, CUBE_FACE_COUNT};
