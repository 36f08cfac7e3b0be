// src/terrain/chunk_manager.rs
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use glam::Vec2;
use log::{debug, info};

use crate::bridge::TerrainBridge;
use crate::config::TerrainConfiguration;
use crate::terrain::chunk::{ChunkCoordinate, ChunkState, DetailLevel, TerrainChunk, chunk_pitch};
use crate::terrain::generator::TerrainGenerator;

/// Scheduler for an endless chunked terrain.
///
/// Owns every chunk ever entered into view range, the generation service and
/// the presentation bridge. `update` is the single entry point: call it with
/// the viewer's map-space position once per frame (or whenever the viewer
/// moves) and the manager keeps a square window of chunks around the viewer
/// generated, meshed at distance-appropriate detail and signalled to the
/// bridge.
///
/// Chunks are never deleted once created; leaving the window only hides
/// them. Replacing the configuration via `apply_settings` is the one event
/// that discards state, since previously generated data no longer matches.
pub struct ChunkManager {
    generator: TerrainGenerator,
    bridge: Box<dyn TerrainBridge>,

    chunks: HashMap<ChunkCoordinate, TerrainChunk>,
    visible_chunks: Vec<ChunkCoordinate>,

    detail_levels: Vec<DetailLevel>,
    max_view_distance: f32,
    chunk_pitch: f32,
    window_radius: i32,

    collider_lod_index: usize,
    collider_generation_distance: f32,
    viewer_move_threshold: f32,
    uniform_scale: f32,

    // Both in map space (already divided by uniform_scale).
    viewer_position: Option<Vec2>,
    last_window_position: Option<Vec2>,
}

impl ChunkManager {
    pub fn new(config: &TerrainConfiguration, bridge: Box<dyn TerrainBridge>) -> Self {
        let mut config = config.clone();
        config.sanitize();

        let pitch = chunk_pitch(config.chunks.resolution);
        let max_view_distance = config
            .chunks
            .detail_levels
            .last()
            .map(|level| level.visible_distance_threshold)
            .unwrap_or(0.0);
        let window_radius = (max_view_distance / pitch).round() as i32;

        info!(
            "chunk manager ready: pitch {}, view distance {}, window radius {}",
            pitch, max_view_distance, window_radius
        );

        ChunkManager {
            generator: TerrainGenerator::new(&config),
            bridge,
            chunks: HashMap::new(),
            visible_chunks: Vec::new(),
            detail_levels: config.chunks.detail_levels.clone(),
            max_view_distance,
            chunk_pitch: pitch,
            window_radius,
            collider_lod_index: config.chunks.collider_lod_index,
            collider_generation_distance: config.chunks.collider_generation_distance,
            viewer_move_threshold: config.chunks.viewer_move_threshold,
            uniform_scale: config.mesh.uniform_scale,
            viewer_position: None,
            last_window_position: None,
        }
    }

    /// Advances the terrain for the viewer's current position.
    ///
    /// Three phases, in order: finished worker results are drained and
    /// routed to their chunks (this also promotes meshes that became ready
    /// while the viewer stood still); any viewer movement reevaluates
    /// collision promotion for visible chunks; movement past
    /// `viewer_move_threshold` since the last window pass recomputes which
    /// chunks fall inside the view window.
    pub fn update(&mut self, viewer_position: Vec2) {
        let scaled = viewer_position / self.uniform_scale;
        let moved = self.viewer_position != Some(scaled);
        self.viewer_position = Some(scaled);

        self.drain_results();

        if moved {
            let visible = self.visible_chunks.clone();
            for coord in visible {
                self.update_collision_mesh(coord);
            }
        }

        let window_due = match self.last_window_position {
            None => true,
            Some(last) => {
                (scaled - last).length_squared()
                    > self.viewer_move_threshold * self.viewer_move_threshold
            }
        };
        if window_due {
            self.last_window_position = Some(scaled);
            self.update_visible_chunks();
        }
    }

    /// Replaces the generation settings. All chunks are discarded: their
    /// heights and meshes were produced under the old parameters. Results
    /// still in flight die with the old generator's queues.
    pub fn apply_settings(&mut self, config: &TerrainConfiguration) {
        let mut config = config.clone();
        config.sanitize();

        info!(
            "applying new terrain settings, discarding {} chunks",
            self.chunks.len()
        );
        let visible = std::mem::take(&mut self.visible_chunks);
        for coord in visible {
            self.bridge.set_chunk_visible(coord, false);
        }
        self.chunks.clear();

        let pitch = chunk_pitch(config.chunks.resolution);
        self.max_view_distance = config
            .chunks
            .detail_levels
            .last()
            .map(|level| level.visible_distance_threshold)
            .unwrap_or(0.0);
        self.window_radius = (self.max_view_distance / pitch).round() as i32;
        self.chunk_pitch = pitch;
        self.detail_levels = config.chunks.detail_levels.clone();
        self.collider_lod_index = config.chunks.collider_lod_index;
        self.collider_generation_distance = config.chunks.collider_generation_distance;
        self.viewer_move_threshold = config.chunks.viewer_move_threshold;
        self.uniform_scale = config.mesh.uniform_scale;
        self.generator = TerrainGenerator::new(&config);

        // Next update re-seeds the window from scratch.
        self.viewer_position = None;
        self.last_window_position = None;
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn visible_chunk_count(&self) -> usize {
        self.visible_chunks.len()
    }

    pub fn visible_chunks(&self) -> &[ChunkCoordinate] {
        &self.visible_chunks
    }

    pub fn chunk(&self, coord: ChunkCoordinate) -> Option<&TerrainChunk> {
        self.chunks.get(&coord)
    }

    pub fn chunk_state(&self, coord: ChunkCoordinate) -> Option<ChunkState> {
        self.chunks.get(&coord).map(|chunk| chunk.state())
    }

    pub fn worker_count(&self) -> usize {
        self.generator.worker_count()
    }

    /// Routes every finished height field and mesh to its chunk, then
    /// reevaluates the affected chunk so newly available data takes effect
    /// immediately. Results for coordinates that were discarded by a
    /// settings change are dropped.
    fn drain_results(&mut self) {
        for result in self.generator.drain_height_fields() {
            let coord = result.coord;
            match self.chunks.get_mut(&coord) {
                Some(chunk) => chunk.height_field = Some(Arc::new(result.field)),
                None => {
                    debug!(
                        "dropping height field for untracked chunk ({}, {})",
                        coord.x, coord.y
                    );
                    continue;
                }
            }
            self.update_chunk(coord);
        }

        for result in self.generator.drain_meshes() {
            let coord = result.coord;
            let lod_index = result.lod_index;
            match self.chunks.get_mut(&coord) {
                Some(chunk) => {
                    let slot = &mut chunk.lod_meshes[lod_index];
                    slot.buffers = Some(result.buffers);
                    slot.requested = false;
                }
                None => {
                    debug!(
                        "dropping LOD {} mesh for untracked chunk ({}, {})",
                        lod_index, coord.x, coord.y
                    );
                    continue;
                }
            }
            self.update_chunk(coord);
            if lod_index == self.collider_lod_index {
                self.update_collision_mesh(coord);
            }
        }
    }

    /// Recomputes the chunk window around the viewer. Previously visible
    /// chunks are reevaluated first (they may fall out of range), then every
    /// coordinate inside the window is created on first sight or refreshed.
    fn update_visible_chunks(&mut self) {
        let Some(viewer) = self.viewer_position else {
            return;
        };

        let mut already_updated = HashSet::new();
        let previous = self.visible_chunks.clone();
        for coord in previous {
            already_updated.insert(coord);
            self.update_chunk(coord);
        }

        let current = ChunkCoordinate::containing(viewer, self.chunk_pitch);
        debug!(
            "recomputing chunk window around ({}, {})",
            current.x, current.y
        );
        for y_offset in -self.window_radius..=self.window_radius {
            for x_offset in -self.window_radius..=self.window_radius {
                let coord = ChunkCoordinate::new(current.x + x_offset, current.y + y_offset);
                if already_updated.contains(&coord) {
                    continue;
                }
                if !self.chunks.contains_key(&coord) {
                    let mut chunk = TerrainChunk::new(coord, self.chunk_pitch, &self.detail_levels);
                    chunk.height_requested = true;
                    self.chunks.insert(coord, chunk);
                    self.generator.request_height_field(coord);
                }
                self.update_chunk(coord);
            }
        }
    }

    /// Reevaluates one chunk against the current viewer position: picks its
    /// detail level, applies or requests the mesh for that level, and
    /// resolves visibility transitions.
    fn update_chunk(&mut self, coord: ChunkCoordinate) {
        let Some(viewer) = self.viewer_position else {
            return;
        };
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };

        let distance = chunk.bounds.distance(viewer);
        let was_visible = chunk.visible;
        let visible = distance <= self.max_view_distance;

        if visible {
            // The first threshold not exceeded wins.
            let mut lod_index = 0;
            for i in 0..self.detail_levels.len() - 1 {
                if distance > self.detail_levels[i].visible_distance_threshold {
                    lod_index = i + 1;
                } else {
                    break;
                }
            }

            if let Some(field) = chunk.height_field.clone() {
                if chunk.previous_lod_index != Some(lod_index) {
                    let slot = &mut chunk.lod_meshes[lod_index];
                    if let Some(buffers) = &slot.buffers {
                        chunk.previous_lod_index = Some(lod_index);
                        self.bridge.apply_visible_mesh(coord, lod_index, buffers);
                    } else if !slot.requested {
                        slot.requested = true;
                        self.generator.request_mesh(coord, lod_index, slot.lod, field);
                    }
                }
            }
        }

        if visible != was_visible {
            chunk.visible = visible;
            if visible {
                self.visible_chunks.push(coord);
            } else {
                self.visible_chunks.retain(|c| *c != coord);
            }
            self.bridge.set_chunk_visible(coord, visible);
        }
    }

    /// Two-gate collision promotion. Inside the collider level's visible
    /// range the collider mesh is requested ahead of need; once the viewer
    /// is within `collider_generation_distance` of the bounds and the mesh
    /// exists, it is committed to the bridge. A committed chunk is final.
    fn update_collision_mesh(&mut self, coord: ChunkCoordinate) {
        let Some(viewer) = self.viewer_position else {
            return;
        };
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        if chunk.collision_committed {
            return;
        }

        let distance_squared = chunk.bounds.distance_squared(viewer);
        let request_threshold =
            self.detail_levels[self.collider_lod_index].visible_distance_threshold;

        if distance_squared < request_threshold * request_threshold {
            if let Some(field) = chunk.height_field.clone() {
                let slot = &mut chunk.lod_meshes[self.collider_lod_index];
                if !slot.requested && !slot.has_mesh() {
                    slot.requested = true;
                    self.generator
                        .request_mesh(coord, self.collider_lod_index, slot.lod, field);
                }
            }
        }

        if distance_squared < self.collider_generation_distance * self.collider_generation_distance
        {
            if let Some(buffers) = chunk.lod_meshes[self.collider_lod_index].buffers.as_ref() {
                chunk.collision_committed = true;
                self.bridge.apply_collision_mesh(coord, buffers);
            }
        }
    }
}
