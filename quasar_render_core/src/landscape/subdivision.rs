/// Landscape subdivision — the quadtree of terrain tiles and the heightmap
/// data that bounds them.
///
/// Level L of the quadtree has 2^L × 2^L pages covering the full landscape
/// rectangle. The page manager asks for a world-space bounding box per page;
/// the box must fully contain the terrain surface under the page (an
/// under-estimate would cull visible geometry), which the min/max height
/// chain guarantees for coarse pages and corner evaluation guarantees for
/// sub-cell pages (a bilinear patch attains its extremes at rectangle
/// corners).

use glam::Vec3;
use crate::error::{Error, Result};
use crate::scene::AABB;

/// Heightmap: a square grid of world-space heights.
///
/// `size` samples per side; the cell grid between samples is `size - 1`
/// wide and must be a power of two so quadtree pages align with cells.
pub struct Heightmap {
    size: u32,
    heights: Vec<f32>,
}

impl Heightmap {
    pub fn new(size: u32, heights: Vec<f32>) -> Result<Self> {
        if size < 2 || !(size - 1).is_power_of_two() {
            return Err(Error::InvalidResource(format!(
                "heightmap size {} must be 2^n + 1",
                size
            )));
        }
        if heights.len() != (size * size) as usize {
            return Err(Error::InvalidResource(format!(
                "heightmap data length {} does not match size {}",
                heights.len(),
                size
            )));
        }
        Ok(Self { size, heights })
    }

    /// Flat heightmap at a constant height.
    pub fn flat(size: u32, height: f32) -> Result<Self> {
        Self::new(size, vec![height; (size * size) as usize])
    }

    /// Samples per side.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Cells per side (`size - 1`, a power of two).
    pub fn cells(&self) -> u32 {
        self.size - 1
    }

    /// Raw sample.
    pub fn sample(&self, x: u32, y: u32) -> f32 {
        self.heights[(y * self.size + x) as usize]
    }

    /// Bilinear height at normalized coordinates (u, v) in [0, 1].
    pub fn sample_bilinear(&self, u: f32, v: f32) -> f32 {
        let cells = self.cells() as f32;
        let fx = (u.clamp(0.0, 1.0) * cells).min(cells - f32::EPSILON * cells);
        let fy = (v.clamp(0.0, 1.0) * cells).min(cells - f32::EPSILON * cells);

        let x0 = fx.floor() as u32;
        let y0 = fy.floor() as u32;
        let x0 = x0.min(self.cells() - 1);
        let y0 = y0.min(self.cells() - 1);
        let tx = fx - x0 as f32;
        let ty = fy - y0 as f32;

        let h00 = self.sample(x0, y0);
        let h10 = self.sample(x0 + 1, y0);
        let h01 = self.sample(x0, y0 + 1);
        let h11 = self.sample(x0 + 1, y0 + 1);

        let top = h00 + (h10 - h00) * tx;
        let bottom = h01 + (h11 - h01) * tx;
        top + (bottom - top) * ty
    }
}

/// One min/max pyramid level.
struct MinMaxLevel {
    side: u32,
    entries: Vec<(f32, f32)>,
}

/// Quadtree subdivision over a heightmap and a world rectangle.
pub struct LandscapeSubdivision {
    heightmap: Heightmap,
    /// Landscape extent: X/Z from this box, Y from the heightmap
    world_rect: AABB,
    /// Level 0 = per-cell min/max; each level halves the side
    min_max_chain: Vec<MinMaxLevel>,
}

impl LandscapeSubdivision {
    pub fn new(heightmap: Heightmap, world_rect: AABB) -> Self {
        let min_max_chain = Self::build_chain(&heightmap);
        Self { heightmap, world_rect, min_max_chain }
    }

    /// Per-cell min/max, then a pyramid of 2×2 reductions up to 1×1.
    fn build_chain(heightmap: &Heightmap) -> Vec<MinMaxLevel> {
        let cells = heightmap.cells();
        let mut base = Vec::with_capacity((cells * cells) as usize);
        for y in 0..cells {
            for x in 0..cells {
                let corners = [
                    heightmap.sample(x, y),
                    heightmap.sample(x + 1, y),
                    heightmap.sample(x, y + 1),
                    heightmap.sample(x + 1, y + 1),
                ];
                let min = corners.iter().cloned().fold(f32::INFINITY, f32::min);
                let max = corners.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
                base.push((min, max));
            }
        }

        let mut chain = vec![MinMaxLevel { side: cells, entries: base }];
        while chain.last().unwrap().side > 1 {
            let prev = chain.last().unwrap();
            let side = prev.side / 2;
            let mut entries = Vec::with_capacity((side * side) as usize);
            for y in 0..side {
                for x in 0..side {
                    let mut min = f32::INFINITY;
                    let mut max = f32::NEG_INFINITY;
                    for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                        let (lo, hi) =
                            prev.entries[((y * 2 + dy) * prev.side + x * 2 + dx) as usize];
                        min = min.min(lo);
                        max = max.max(hi);
                    }
                    entries.push((min, max));
                }
            }
            chain.push(MinMaxLevel { side, entries });
        }
        chain
    }

    pub fn heightmap(&self) -> &Heightmap {
        &self.heightmap
    }

    /// Deepest level whose pages still cover at least one heightmap cell.
    pub fn cell_aligned_levels(&self) -> u32 {
        self.heightmap.cells().trailing_zeros()
    }

    /// World-space bounding box of the page `(level, x, y)`.
    ///
    /// Fast path: pages at cell-aligned levels read the min/max chain.
    /// Slow path: pages finer than one heightmap cell evaluate the four
    /// bilinear corner heights, which bound the surface exactly.
    pub fn page_world_box(&self, level: u32, x: u32, y: u32) -> AABB {
        let pages_per_side = 1u32 << level;
        debug_assert!(x < pages_per_side && y < pages_per_side);

        let u0 = x as f32 / pages_per_side as f32;
        let v0 = y as f32 / pages_per_side as f32;
        let u1 = (x + 1) as f32 / pages_per_side as f32;
        let v1 = (y + 1) as f32 / pages_per_side as f32;

        let cells = self.heightmap.cells();
        let (min_h, max_h) = if pages_per_side <= cells {
            // Chain level whose blocks match the page span
            let k = (cells / pages_per_side).trailing_zeros() as usize;
            let level_data = &self.min_max_chain[k];
            debug_assert_eq!(level_data.side, pages_per_side);
            level_data.entries[(y * level_data.side + x) as usize]
        } else {
            // Pages nest inside one cell (both sides are powers of two):
            // bilinear extremes sit on the corners
            let corners = [
                self.heightmap.sample_bilinear(u0, v0),
                self.heightmap.sample_bilinear(u1, v0),
                self.heightmap.sample_bilinear(u0, v1),
                self.heightmap.sample_bilinear(u1, v1),
            ];
            let min = corners.iter().cloned().fold(f32::INFINITY, f32::min);
            let max = corners.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            (min, max)
        };

        let world_size = self.world_rect.size();
        AABB::new(
            Vec3::new(
                self.world_rect.min.x + u0 * world_size.x,
                min_h,
                self.world_rect.min.z + v0 * world_size.z,
            ),
            Vec3::new(
                self.world_rect.min.x + u1 * world_size.x,
                max_h,
                self.world_rect.min.z + v1 * world_size.z,
            ),
        )
    }
}

#[cfg(test)]
#[path = "subdivision_tests.rs"]
mod tests;
