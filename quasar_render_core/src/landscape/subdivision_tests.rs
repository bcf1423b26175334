use glam::Vec3;
use crate::scene::AABB;
use super::*;

/// 5x5 heightmap (4x4 cells) with one tall corner cell.
fn bumpy_heightmap() -> Heightmap {
    let size = 5u32;
    let mut heights = vec![0.0f32; (size * size) as usize];
    // Peak at sample (1, 1)
    heights[(1 * size + 1) as usize] = 10.0;
    Heightmap::new(size, heights).unwrap()
}

fn world_rect() -> AABB {
    AABB::new(Vec3::new(-100.0, 0.0, -100.0), Vec3::new(100.0, 0.0, 100.0))
}

#[test]
fn test_heightmap_validation() {
    assert!(Heightmap::new(5, vec![0.0; 25]).is_ok());
    // 6-1 = 5 is not a power of two
    assert!(Heightmap::new(6, vec![0.0; 36]).is_err());
    // Wrong data length
    assert!(Heightmap::new(5, vec![0.0; 24]).is_err());
}

#[test]
fn test_bilinear_sampling() {
    let heightmap = bumpy_heightmap();

    // Exactly on the peak sample: u = v = 1/4
    let peak = heightmap.sample_bilinear(0.25, 0.25);
    assert!((peak - 10.0).abs() < 1e-4);

    // Halfway between the peak and a zero neighbor
    let mid = heightmap.sample_bilinear(0.125, 0.25);
    assert!((mid - 5.0).abs() < 1e-3);

    // Far corner is flat
    assert!(heightmap.sample_bilinear(1.0, 1.0).abs() < 1e-4);
}

#[test]
fn test_root_page_box_spans_world() {
    let subdivision = LandscapeSubdivision::new(bumpy_heightmap(), world_rect());
    let root = subdivision.page_world_box(0, 0, 0);

    assert_eq!(root.min.x, -100.0);
    assert_eq!(root.max.x, 100.0);
    assert_eq!(root.min.z, -100.0);
    assert_eq!(root.max.z, 100.0);
    assert_eq!(root.min.y, 0.0);
    assert_eq!(root.max.y, 10.0);
}

#[test]
fn test_fast_path_boxes_contain_peak_only_where_it_is() {
    let subdivision = LandscapeSubdivision::new(bumpy_heightmap(), world_rect());

    // Level 2 = 4x4 pages = one per heightmap cell. The peak sample (1,1)
    // touches the four cells around it.
    for y in 0..4 {
        for x in 0..4 {
            let aabb = subdivision.page_world_box(2, x, y);
            let touches_peak = x <= 1 && y <= 1;
            if touches_peak {
                assert_eq!(aabb.max.y, 10.0, "page ({},{})", x, y);
            } else {
                assert_eq!(aabb.max.y, 0.0, "page ({},{})", x, y);
            }
        }
    }
}

#[test]
fn test_boxes_never_underestimate_sampled_surface() {
    let subdivision = LandscapeSubdivision::new(bumpy_heightmap(), world_rect());

    // Dense sampling under each page of several levels must stay inside the
    // page's box
    for level in 0..=4u32 {
        let pages = 1u32 << level;
        for py in 0..pages {
            for px in 0..pages {
                let aabb = subdivision.page_world_box(level, px, py);
                for sy in 0..=4 {
                    for sx in 0..=4 {
                        let u = (px as f32 + sx as f32 / 4.0) / pages as f32;
                        let v = (py as f32 + sy as f32 / 4.0) / pages as f32;
                        let h = subdivision.heightmap().sample_bilinear(u, v);
                        assert!(
                            h >= aabb.min.y - 1e-4 && h <= aabb.max.y + 1e-4,
                            "level {} page ({},{}): height {} outside [{}, {}]",
                            level, px, py, h, aabb.min.y, aabb.max.y
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn test_slow_path_finer_than_cell() {
    let subdivision = LandscapeSubdivision::new(bumpy_heightmap(), world_rect());
    assert_eq!(subdivision.cell_aligned_levels(), 2);

    // Level 4 = 16x16 pages, four per cell side: sub-cell pages. The page at
    // the exact peak corner must still reach the peak height.
    let aabb = subdivision.page_world_box(4, 3, 3);
    assert!((aabb.max.y - 10.0).abs() < 1e-3);

    // A flat-region page is flat
    let flat = subdivision.page_world_box(4, 12, 12);
    assert!(flat.max.y.abs() < 1e-4);
    assert!(flat.size().y.abs() < 1e-4);
}

#[test]
fn test_flat_heightmap_boxes_are_flat() {
    let subdivision = LandscapeSubdivision::new(
        Heightmap::flat(9, 3.5).unwrap(),
        world_rect(),
    );
    let aabb = subdivision.page_world_box(1, 1, 0);
    assert_eq!(aabb.min.y, 3.5);
    assert_eq!(aabb.max.y, 3.5);
}
