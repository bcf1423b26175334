/// Point-light shadow setup: six 90°-FOV cube-face cameras and tile
/// reservation in a shared shadow atlas.
///
/// This module only does the camera math and atlas bookkeeping; the actual
/// cubemap render path is driven by a shadow pass per reserved face.

use glam::Vec3;
use crate::camera::Camera;
use crate::error::{Error, Result};
use crate::gpu::Rect2D;
use crate::utils::SlotAllocator;

/// Number of cube faces
pub const CUBE_FACE_COUNT: usize = 6;

/// Fixed (direction, up) pair per cube face: +X, -X, +Y, -Y, +Z, -Z.
const FACE_BASES: [(Vec3, Vec3); CUBE_FACE_COUNT] = [
    (Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, -1.0, 0.0)),
    (Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, -1.0, 0.0)),
    (Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 1.0)),
    (Vec3::new(0.0, -1.0, 0.0), Vec3::new(0.0, 0.0, -1.0)),
    (Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, -1.0, 0.0)),
    (Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, -1.0, 0.0)),
];

/// Shared shadow atlas divided into fixed-size square tiles.
pub struct ShadowAtlas {
    size: u32,
    tile_size: u32,
    slots: SlotAllocator,
}

impl ShadowAtlas {
    pub fn new(size: u32, tile_size: u32) -> Result<Self> {
        if tile_size == 0 || size % tile_size != 0 {
            return Err(Error::InvalidResource(format!(
                "atlas size {} not divisible by tile size {}",
                size, tile_size
            )));
        }
        let per_side = size / tile_size;
        Ok(Self {
            size,
            tile_size,
            slots: SlotAllocator::with_capacity(per_side * per_side),
        })
    }

    pub fn tiles_per_side(&self) -> u32 {
        self.size / self.tile_size
    }

    /// Claim a tile; None when the atlas is full (the face simply renders
    /// no shadow this frame).
    pub fn reserve_tile(&mut self) -> Option<(u32, Rect2D)> {
        let id = self.slots.alloc()?;
        let per_side = self.tiles_per_side();
        let col = id % per_side;
        let row = id / per_side;
        Some((
            id,
            Rect2D {
                x: (col * self.tile_size) as i32,
                y: (row * self.tile_size) as i32,
                width: self.tile_size,
                height: self.tile_size,
            },
        ))
    }

    pub fn release_tile(&mut self, id: u32) {
        self.slots.free(id);
    }

    pub fn available(&self) -> u32 {
        self.slots.available()
    }
}

/// Shadow setup for one point light.
pub struct PointLightShadow {
    position: Vec3,
    radius: f32,
    faces_enabled: [bool; CUBE_FACE_COUNT],
    tiles: [Option<(u32, Rect2D)>; CUBE_FACE_COUNT],
}

impl PointLightShadow {
    pub fn new(position: Vec3, radius: f32) -> Self {
        Self {
            position,
            radius,
            faces_enabled: [true; CUBE_FACE_COUNT],
            tiles: [None; CUBE_FACE_COUNT],
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Enable/disable shadow casting for one face.
    pub fn set_face_enabled(&mut self, face: usize, enabled: bool) {
        self.faces_enabled[face] = enabled;
    }

    pub fn face_enabled(&self, face: usize) -> bool {
        self.faces_enabled[face]
    }

    /// 90°-FOV square camera for one cube face.
    pub fn face_camera(&self, face: usize) -> Camera {
        let (dir, up) = FACE_BASES[face];
        let mut camera = Camera::new();
        camera.set_position(self.position);
        camera.set_direction(dir);
        camera.set_up(up);
        camera.setup_perspective(std::f32::consts::FRAC_PI_2, 1.0, 0.05, self.radius.max(0.05));
        camera
    }

    /// Reserve an atlas tile per enabled face; returns how many faces got
    /// one. Faces left without a tile render no shadow this frame.
    pub fn reserve_tiles(&mut self, atlas: &mut ShadowAtlas) -> u32 {
        let mut reserved = 0;
        for face in 0..CUBE_FACE_COUNT {
            if self.tiles[face].is_some() || !self.faces_enabled[face] {
                continue;
            }
            if let Some(tile) = atlas.reserve_tile() {
                self.tiles[face] = Some(tile);
                reserved += 1;
            }
        }
        reserved
    }

    /// Tile reserved for a face, if any.
    pub fn face_tile(&self, face: usize) -> Option<Rect2D> {
        self.tiles[face].map(|(_, rect)| rect)
    }

    /// Return every reserved tile to the atlas.
    pub fn release_tiles(&mut self, atlas: &mut ShadowAtlas) {
        for tile in self.tiles.iter_mut() {
            if let Some((id, _)) = tile.take() {
                atlas.release_tile(id);
            }
        }
    }
}
