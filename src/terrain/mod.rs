// Export all components from the terrain module
pub mod chunk;
pub mod chunk_manager;
pub mod falloff;
pub mod generator;
pub mod height_curve;
pub mod height_field;
pub mod mesh_builder;
pub mod noise;

// Re-export main types for easier access
pub use chunk::{ChunkBounds, ChunkCoordinate, ChunkState, DetailLevel, TerrainChunk, chunk_pitch};
pub use chunk_manager::ChunkManager;
pub use falloff::generate_falloff_map;
pub use generator::{HeightFieldResult, MeshResult, TerrainGenerator};
pub use height_curve::{CurveKey, HeightCurve};
pub use height_field::HeightField;
pub use mesh_builder::{MAX_LOD, MeshBuffers, build_terrain_mesh, lod_stride};
pub use noise::{NoiseParameters, NormalizeMode, generate_noise_map};
