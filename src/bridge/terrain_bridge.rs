use std::sync::{Arc, Mutex};

use log::error;

use crate::terrain::chunk::ChunkCoordinate;
use crate::terrain::mesh_builder::MeshBuffers;

/// Presentation-side sink for scheduler output.
///
/// The chunk manager drives terrain generation but never touches the engine
/// directly; whatever owns the scene implements this trait and uploads the
/// buffers however it sees fit. Calls arrive on the thread that ticks the
/// manager, never from workers.
pub trait TerrainBridge: Send {
    /// A chunk's render mesh changed: it became visible at `lod_index`, or a
    /// sharper mesh for its current distance finished building.
    fn apply_visible_mesh(&mut self, coord: ChunkCoordinate, lod_index: usize, mesh: &MeshBuffers);

    /// The chunk's collision mesh is ready. Sent once per chunk.
    fn apply_collision_mesh(&mut self, coord: ChunkCoordinate, mesh: &MeshBuffers);

    /// The chunk entered or left the visible window.
    fn set_chunk_visible(&mut self, coord: ChunkCoordinate, visible: bool);
}

/// Bridge that ignores everything. Useful for headless generation runs.
#[derive(Debug, Default)]
pub struct NullBridge;

impl TerrainBridge for NullBridge {
    fn apply_visible_mesh(&mut self, _: ChunkCoordinate, _: usize, _: &MeshBuffers) {}
    fn apply_collision_mesh(&mut self, _: ChunkCoordinate, _: &MeshBuffers) {}
    fn set_chunk_visible(&mut self, _: ChunkCoordinate, _: bool) {}
}

/// One observed bridge call. Mesh payloads are reduced to their vertex count
/// so recordings stay small.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    VisibleMesh {
        coord: ChunkCoordinate,
        lod_index: usize,
        vertex_count: usize,
    },
    CollisionMesh {
        coord: ChunkCoordinate,
        vertex_count: usize,
    },
    Visibility {
        coord: ChunkCoordinate,
        visible: bool,
    },
}

/// Bridge that appends every call to a shared log. Cloning shares the log,
/// so a test can keep one handle while the scheduler owns the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingBridge {
    events: Arc<Mutex<Vec<BridgeEvent>>>,
}

impl RecordingBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far, in call order.
    pub fn events(&self) -> Vec<BridgeEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(e) => {
                error!("bridge event log poisoned: {}", e);
                Vec::new()
            }
        }
    }

    fn record(&self, event: BridgeEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl TerrainBridge for RecordingBridge {
    fn apply_visible_mesh(&mut self, coord: ChunkCoordinate, lod_index: usize, mesh: &MeshBuffers) {
        self.record(BridgeEvent::VisibleMesh {
            coord,
            lod_index,
            vertex_count: mesh.vertex_count(),
        });
    }

    fn apply_collision_mesh(&mut self, coord: ChunkCoordinate, mesh: &MeshBuffers) {
        self.record(BridgeEvent::CollisionMesh {
            coord,
            vertex_count: mesh.vertex_count(),
        });
    }

    fn set_chunk_visible(&mut self, coord: ChunkCoordinate, visible: bool) {
        self.record(BridgeEvent::Visibility { coord, visible });
    }
}
