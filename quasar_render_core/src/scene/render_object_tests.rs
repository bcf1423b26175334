use glam::{Mat4, Vec3};
use std::sync::Arc;
use crate::gpu::{
    BufferDesc, BufferUsage, GraphicsDevice, IndexType, MockGraphicsDevice, PrimitiveTopology,
};
use crate::material::FlatMaterial;
use crate::pass::LayerMask;
use crate::scene::{BatchGeometry, RenderBatch};
use super::*;

fn unit_box() -> AABB {
    AABB::new(Vec3::splat(-1.0), Vec3::splat(1.0))
}

fn make_batch(device: &MockGraphicsDevice) -> RenderBatch {
    let vb = device
        .create_buffer(&BufferDesc { size: 256, usage: BufferUsage::Vertex, cpu_writable: true })
        .unwrap();
    let geometry = BatchGeometry {
        vertex_buffer: vb,
        vertex_byte_offset: 0,
        vertex_stride: 16,
        vertex_count: 3,
        index_buffer: None,
        index_byte_offset: 0,
        index_count: 0,
        index_type: IndexType::U16,
        topology: PrimitiveTopology::TriangleList,
    };
    let material = Arc::new(FlatMaterial::new("test", 1, LayerMask::OPAQUE));
    RenderBatch::new(material, geometry, 0, 0).unwrap()
}

#[test]
fn test_new_object_defaults() {
    let object = RenderObject::new(unit_box());
    assert!(object.matches(RenderObjectFlags::VISIBLE));
    assert!(!object.matches(RenderObjectFlags::ALWAYS_VISIBLE));
    assert_eq!(object.batch_count(), 0);
    assert_eq!(object.tree_node(), None);
}

#[test]
fn test_world_box_follows_transform() {
    let mut object = RenderObject::new(unit_box());
    object.set_world_transform(Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)));
    object.recalculate_world_bounding_box();

    let world = object.world_bounding_box();
    assert_eq!(world.min, Vec3::new(9.0, -1.0, -1.0));
    assert_eq!(world.max, Vec3::new(11.0, 1.0, 1.0));
}

#[test]
fn test_world_box_stale_until_recalculated() {
    let mut object = RenderObject::new(unit_box());
    object.set_world_transform(Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)));

    // Not recalculated yet
    assert_eq!(object.world_bounding_box().center(), Vec3::ZERO);
}

#[test]
fn test_add_and_get_batches() {
    let device = MockGraphicsDevice::new();
    let mut object = RenderObject::new(unit_box());

    let first = object.add_batch(make_batch(&device));
    let second = object.add_batch(make_batch(&device));

    assert_eq!(first, 0);
    assert_eq!(second, 1);
    assert_eq!(object.batch_count(), 2);
    assert!(object.batch(1).is_some());
    assert!(object.batch(2).is_none());
}

#[test]
fn test_flag_manipulation() {
    let mut object = RenderObject::new(unit_box());
    object.add_flag(RenderObjectFlags::CAST_SHADOW);

    assert!(object.matches(RenderObjectFlags::shadow_criteria()));

    object.remove_flag(RenderObjectFlags::VISIBLE);
    assert!(!object.matches(RenderObjectFlags::clip_criteria()));
}
