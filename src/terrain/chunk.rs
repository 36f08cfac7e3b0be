// src/terrain/chunk.rs
use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::terrain::height_field::HeightField;
use crate::terrain::mesh_builder::MeshBuffers;

/// Key of the sparse chunk map. Chunks tile the xz plane; `y` here is the
/// map-space second axis (world -z in mesh space).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkCoordinate {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoordinate {
    pub fn new(x: i32, y: i32) -> Self {
        ChunkCoordinate { x, y }
    }

    /// The chunk whose bounds contain `position`. Chunks are centered on
    /// `coord * pitch`, so this rounds rather than floors.
    pub fn containing(position: Vec2, pitch: f32) -> Self {
        ChunkCoordinate {
            x: (position.x / pitch).round() as i32,
            y: (position.y / pitch).round() as i32,
        }
    }

    pub fn world_centre(&self, pitch: f32) -> Vec2 {
        Vec2::new(self.x as f32 * pitch, self.y as f32 * pitch)
    }
}

/// Distance between adjacent chunk centers for a given interior resolution.
/// Interior vertices span N-1 units, so tiles meet exactly edge to edge.
pub fn chunk_pitch(resolution: u32) -> f32 {
    (resolution - 1) as f32
}

/// Axis-aligned square footprint of a chunk in map space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkBounds {
    pub centre: Vec2,
    pub half_extent: f32,
}

impl ChunkBounds {
    pub fn new(centre: Vec2, half_extent: f32) -> Self {
        ChunkBounds {
            centre,
            half_extent,
        }
    }

    /// Squared distance from a point to the nearest edge of the bounds;
    /// zero inside. Visibility and LOD selection measure chunks this way
    /// rather than by centre distance.
    pub fn distance_squared(&self, point: Vec2) -> f32 {
        let delta = (point - self.centre).abs() - Vec2::splat(self.half_extent);
        delta.max(Vec2::ZERO).length_squared()
    }

    pub fn distance(&self, point: Vec2) -> f32 {
        self.distance_squared(point).sqrt()
    }
}

/// One entry of the LOD table: chunks within `visible_distance_threshold`
/// render at simplification level `lod`. The table is sorted ascending by
/// threshold; the last threshold is the maximum view distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetailLevel {
    pub lod: u32,
    pub visible_distance_threshold: f32,
}

impl DetailLevel {
    pub fn new(lod: u32, visible_distance_threshold: f32) -> Self {
        DetailLevel {
            lod,
            visible_distance_threshold,
        }
    }
}

/// Per-LOD mesh slot. `requested` latches when a build is submitted and the
/// buffers land when the result is drained; at most one request is ever in
/// flight per slot.
#[derive(Debug, Clone, Default)]
pub struct LodMesh {
    pub lod: u32,
    pub requested: bool,
    pub buffers: Option<MeshBuffers>,
}

impl LodMesh {
    fn new(lod: u32) -> Self {
        LodMesh {
            lod,
            requested: false,
            buffers: None,
        }
    }

    pub fn has_mesh(&self) -> bool {
        self.buffers.is_some()
    }
}

/// Lifecycle snapshot of a chunk, derived from its flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    Unrequested,
    HeightPending,
    HeightReady,
    MeshPending(usize),
    MeshReady(usize),
}

/// One terrain tile. Created the first time it enters view range and then
/// resident for the life of the process; going out of range only hides it.
#[derive(Debug)]
pub struct TerrainChunk {
    pub(crate) coord: ChunkCoordinate,
    pub(crate) bounds: ChunkBounds,
    pub(crate) height_field: Option<Arc<HeightField>>,
    pub(crate) height_requested: bool,
    pub(crate) lod_meshes: Vec<LodMesh>,
    pub(crate) visible: bool,
    pub(crate) previous_lod_index: Option<usize>,
    pub(crate) collision_committed: bool,
}

impl TerrainChunk {
    pub fn new(coord: ChunkCoordinate, pitch: f32, detail_levels: &[DetailLevel]) -> Self {
        let centre = coord.world_centre(pitch);
        TerrainChunk {
            coord,
            bounds: ChunkBounds::new(centre, pitch / 2.0),
            height_field: None,
            height_requested: false,
            lod_meshes: detail_levels.iter().map(|d| LodMesh::new(d.lod)).collect(),
            visible: false,
            previous_lod_index: None,
            collision_committed: false,
        }
    }

    pub fn coord(&self) -> ChunkCoordinate {
        self.coord
    }

    pub fn bounds(&self) -> ChunkBounds {
        self.bounds
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn active_lod_index(&self) -> Option<usize> {
        self.previous_lod_index
    }

    pub fn is_collision_committed(&self) -> bool {
        self.collision_committed
    }

    pub fn height_field(&self) -> Option<&Arc<HeightField>> {
        self.height_field.as_ref()
    }

    pub fn lod_mesh(&self, lod_index: usize) -> Option<&LodMesh> {
        self.lod_meshes.get(lod_index)
    }

    pub fn state(&self) -> ChunkState {
        if !self.height_requested {
            return ChunkState::Unrequested;
        }
        if self.height_field.is_none() {
            return ChunkState::HeightPending;
        }
        if let Some(active) = self.previous_lod_index {
            return ChunkState::MeshReady(active);
        }
        if let Some(pending) = self
            .lod_meshes
            .iter()
            .position(|slot| slot.requested && !slot.has_mesh())
        {
            return ChunkState::MeshPending(pending);
        }
        ChunkState::HeightReady
    }
}
