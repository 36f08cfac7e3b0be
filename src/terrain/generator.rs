// src/terrain/generator.rs
use std::sync::Arc;

use log::{debug, trace};

use crate::config::TerrainConfiguration;
use crate::terrain::chunk::{ChunkCoordinate, chunk_pitch};
use crate::terrain::falloff::generate_falloff_map;
use crate::terrain::height_curve::HeightCurve;
use crate::terrain::height_field::HeightField;
use crate::terrain::mesh_builder::{MeshBuffers, build_terrain_mesh};
use crate::terrain::noise::{NoiseParameters, generate_noise_map};
use crate::threading::{ResultQueue, ThreadPool};

/// Finished height field for a chunk, delivered through the drain queue.
#[derive(Debug)]
pub struct HeightFieldResult {
    pub coord: ChunkCoordinate,
    pub field: HeightField,
}

/// Finished mesh for one (chunk, LOD slot) pair.
#[derive(Debug)]
pub struct MeshResult {
    pub coord: ChunkCoordinate,
    pub lod_index: usize,
    pub buffers: MeshBuffers,
}

/// Immutable inputs shared with every generation worker.
struct GenerationContext {
    noise: NoiseParameters,
    height_multiplier: f32,
    height_curve: HeightCurve,
    use_flat_shading: bool,
    resolution: u32,
    falloff: Option<HeightField>,
}

/// Asynchronous generation service: owns the worker pool and the two result
/// queues. Requests return immediately; completed work is collected with the
/// `drain_*` calls, FIFO within each queue. Generation is pure, so a request
/// never fails — it can only be stale by the time it lands.
pub struct TerrainGenerator {
    context: Arc<GenerationContext>,
    pool: ThreadPool,
    height_results: ResultQueue<HeightFieldResult>,
    mesh_results: ResultQueue<MeshResult>,
}

impl TerrainGenerator {
    pub fn new(config: &TerrainConfiguration) -> Self {
        let resolution = config.chunks.resolution;
        let bordered = resolution as usize + 2;

        // One falloff field serves every chunk; it only depends on size.
        let falloff = if config.chunks.use_falloff {
            debug!("precomputing {0}x{0} falloff field", bordered);
            Some(generate_falloff_map(bordered))
        } else {
            None
        };

        TerrainGenerator {
            context: Arc::new(GenerationContext {
                noise: config.noise.clone(),
                height_multiplier: config.mesh.height_multiplier,
                height_curve: config.mesh.height_curve.clone(),
                use_flat_shading: config.mesh.use_flat_shading,
                resolution,
                falloff,
            }),
            pool: ThreadPool::new(config.max_worker_threads),
            height_results: ResultQueue::new(),
            mesh_results: ResultQueue::new(),
        }
    }

    pub fn resolution(&self) -> u32 {
        self.context.resolution
    }

    pub fn worker_count(&self) -> usize {
        self.pool.num_threads()
    }

    /// Schedules height-field generation for a chunk. The finished field
    /// arrives through `drain_height_fields`.
    pub fn request_height_field(&self, coord: ChunkCoordinate) {
        trace!("requesting height field for chunk ({}, {})", coord.x, coord.y);
        let context = Arc::clone(&self.context);
        let results = self.height_results.clone();
        self.pool.execute(move || {
            let field = generate_chunk_height_field(&context, coord);
            results.push(HeightFieldResult { coord, field });
        });
    }

    /// Schedules a mesh build at simplification level `lod` for the given
    /// slot. The chunk's height field is shared with the worker, not copied.
    pub fn request_mesh(
        &self,
        coord: ChunkCoordinate,
        lod_index: usize,
        lod: u32,
        field: Arc<HeightField>,
    ) {
        trace!(
            "requesting LOD {} mesh for chunk ({}, {})",
            lod, coord.x, coord.y
        );
        let context = Arc::clone(&self.context);
        let results = self.mesh_results.clone();
        self.pool.execute(move || {
            let buffers = build_terrain_mesh(
                &field,
                context.height_multiplier,
                &context.height_curve,
                lod,
                context.use_flat_shading,
            );
            results.push(MeshResult {
                coord,
                lod_index,
                buffers,
            });
        });
    }

    pub fn drain_height_fields(&self) -> Vec<HeightFieldResult> {
        self.height_results.drain()
    }

    pub fn drain_meshes(&self) -> Vec<MeshResult> {
        self.mesh_results.drain()
    }
}

fn generate_chunk_height_field(
    context: &GenerationContext,
    coord: ChunkCoordinate,
) -> HeightField {
    let bordered = context.resolution as usize + 2;
    let centre = coord.world_centre(chunk_pitch(context.resolution));
    let mut field = generate_noise_map(bordered, bordered, &context.noise, centre);

    if let Some(falloff) = &context.falloff {
        for y in 0..bordered {
            for x in 0..bordered {
                let eroded = (field.get(x, y) - falloff.get(x, y)).clamp(0.0, 1.0);
                field.set(x, y, eroded);
            }
        }
    }
    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerrainConfiguration;
    use glam::Vec2;
    use std::time::Duration;

    fn test_config() -> TerrainConfiguration {
        let mut config = TerrainConfiguration::default();
        config.chunks.resolution = 25;
        config.max_worker_threads = 2;
        config.sanitize();
        config
    }

    fn poll<T>(mut drain: impl FnMut() -> Vec<T>) -> Vec<T> {
        for _ in 0..1000 {
            let results = drain();
            if !results.is_empty() {
                return results;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        panic!("no generation result arrived in time");
    }

    #[test]
    fn height_requests_complete_with_bordered_dimensions() {
        let generator = TerrainGenerator::new(&test_config());
        let coord = ChunkCoordinate::new(1, -2);
        generator.request_height_field(coord);

        let results = poll(|| generator.drain_height_fields());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].coord, coord);
        assert_eq!(results[0].field.width(), 27);
        assert_eq!(results[0].field.height(), 27);
    }

    #[test]
    fn generated_fields_match_a_direct_noise_call() {
        let config = test_config();
        let generator = TerrainGenerator::new(&config);
        let coord = ChunkCoordinate::new(3, 4);
        generator.request_height_field(coord);

        let result = poll(|| generator.drain_height_fields()).remove(0);
        let centre = coord.world_centre(chunk_pitch(25));
        let expected = generate_noise_map(27, 27, &config.noise, centre);
        assert_eq!(result.field, expected);
    }

    #[test]
    fn falloff_erodes_heights_toward_the_chunk_edge() {
        let mut config = test_config();
        config.chunks.use_falloff = true;
        let generator = TerrainGenerator::new(&config);

        let coord = ChunkCoordinate::new(0, 0);
        generator.request_height_field(coord);
        let eroded = poll(|| generator.drain_height_fields()).remove(0).field;

        let raw = generate_noise_map(27, 27, &config.noise, Vec2::ZERO);
        let falloff = generate_falloff_map(27);
        for y in 0..27 {
            for x in 0..27 {
                let expected = (raw.get(x, y) - falloff.get(x, y)).clamp(0.0, 1.0);
                assert_eq!(eroded.get(x, y), expected, "cell ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn mesh_requests_complete_for_their_slot() {
        let config = test_config();
        let generator = TerrainGenerator::new(&config);
        let coord = ChunkCoordinate::new(0, 0);
        generator.request_height_field(coord);
        let field = Arc::new(poll(|| generator.drain_height_fields()).remove(0).field);

        generator.request_mesh(coord, 1, 1, field);
        let meshes = poll(|| generator.drain_meshes());
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].coord, coord);
        assert_eq!(meshes[0].lod_index, 1);
        // 25x25 interior at stride 2: 13 vertices per line.
        assert_eq!(meshes[0].buffers.vertex_count(), 13 * 13);
    }

    #[test]
    fn results_from_many_requests_all_arrive() {
        let generator = TerrainGenerator::new(&test_config());
        for x in -2..3 {
            for y in -2..3 {
                generator.request_height_field(ChunkCoordinate::new(x, y));
            }
        }

        let mut received = Vec::new();
        for _ in 0..1000 {
            received.extend(generator.drain_height_fields());
            if received.len() == 25 {
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(received.len(), 25);
    }
}
