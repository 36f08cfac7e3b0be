//! Procedural terrain generation: fractal noise height fields, LOD meshes
//! with seam-stitched normals, and an endless chunk scheduler that streams
//! work through a fixed worker pool.
//!
//! The crate is engine-agnostic. Plug a [`bridge::TerrainBridge`]
//! implementation into a [`terrain::ChunkManager`], feed it viewer positions,
//! and upload the mesh buffers it hands back:
//!
//! ```no_run
//! use glam::Vec2;
//! use moraine::bridge::NullBridge;
//! use moraine::config::TerrainConfiguration;
//! use moraine::terrain::ChunkManager;
//!
//! let config = TerrainConfiguration::default();
//! let mut manager = ChunkManager::new(&config, Box::new(NullBridge));
//! manager.update(Vec2::new(0.0, 0.0));
//! ```

pub mod bridge;
pub mod config;
pub mod terrain;
pub mod threading;

pub use bridge::{NullBridge, TerrainBridge};
pub use config::{ConfigurationError, ConfigurationManager, TerrainConfiguration};
pub use terrain::{ChunkManager, HeightField, MeshBuffers};
