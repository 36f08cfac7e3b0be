pub mod config_manager;

pub use config_manager::{
    ChunkParameters, ConfigurationError, ConfigurationManager, MeshParameters,
    SUPPORTED_RESOLUTIONS, TerrainConfiguration,
};
