use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

use crate::terrain::chunk::DetailLevel;
use crate::terrain::height_curve::HeightCurve;
use crate::terrain::mesh_builder::{MAX_LOD, lod_stride};
use crate::terrain::noise::NoiseParameters;

/// Interior resolutions the mesh index arithmetic supports: `N - 1` must be
/// divisible by the stride of every detail level in use, and these sizes
/// leave most of the LOD ladder available.
pub const SUPPORTED_RESOLUTIONS: [u32; 3] = [25, 121, 241];

// Core configuration structure, one sub-table per concern
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TerrainConfiguration {
    pub config_version: String,

    // Worker pool size; 0 picks a size from the cpu count
    pub max_worker_threads: usize,

    pub noise: NoiseParameters,
    pub mesh: MeshParameters,
    pub chunks: ChunkParameters,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MeshParameters {
    pub height_multiplier: f32,
    pub use_flat_shading: bool,
    // World-presentation scale; viewer positions are divided by this
    pub uniform_scale: f32,
    pub height_curve: HeightCurve,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChunkParameters {
    // Interior vertices per chunk side; see SUPPORTED_RESOLUTIONS
    pub resolution: u32,
    pub use_falloff: bool,
    pub collider_lod_index: usize,
    pub collider_generation_distance: f32,
    pub viewer_move_threshold: f32,
    pub detail_levels: Vec<DetailLevel>,
}

impl Default for TerrainConfiguration {
    fn default() -> Self {
        TerrainConfiguration {
            config_version: "1.0".to_string(),
            max_worker_threads: 0,
            noise: NoiseParameters::default(),
            mesh: MeshParameters::default(),
            chunks: ChunkParameters::default(),
        }
    }
}

impl Default for MeshParameters {
    fn default() -> Self {
        MeshParameters {
            height_multiplier: 25.0,
            use_flat_shading: false,
            uniform_scale: 1.0,
            height_curve: HeightCurve::identity(),
        }
    }
}

impl Default for ChunkParameters {
    fn default() -> Self {
        ChunkParameters {
            resolution: 241,
            use_falloff: false,
            collider_lod_index: 0,
            collider_generation_distance: 5.0,
            viewer_move_threshold: 25.0,
            detail_levels: vec![
                DetailLevel::new(0, 150.0),
                DetailLevel::new(1, 300.0),
                DetailLevel::new(2, 450.0),
            ],
        }
    }
}

impl TerrainConfiguration {
    /// Clamps every parameter into the range the generator accepts, logging
    /// each correction. Called after deserialization and before the
    /// configuration reaches the scheduler, so out-of-range values degrade
    /// to working ones instead of panicking deep inside a mesh build.
    pub fn sanitize(&mut self) {
        self.noise.sanitize();
        self.mesh.sanitize();
        self.chunks.sanitize();
    }
}

impl MeshParameters {
    fn sanitize(&mut self) {
        self.height_curve.sanitize();
        if self.uniform_scale <= 0.0 {
            warn!(
                "uniform_scale {} is not positive, using 1.0",
                self.uniform_scale
            );
            self.uniform_scale = 1.0;
        }
    }
}

impl ChunkParameters {
    fn sanitize(&mut self) {
        if !SUPPORTED_RESOLUTIONS.contains(&self.resolution) {
            let nearest = SUPPORTED_RESOLUTIONS
                .iter()
                .copied()
                .min_by_key(|r| r.abs_diff(self.resolution))
                .unwrap_or(241);
            warn!(
                "chunk resolution {} is unsupported, using {}",
                self.resolution, nearest
            );
            self.resolution = nearest;
        }

        if self.detail_levels.is_empty() {
            warn!("detail_levels is empty, using the default level ladder");
            self.detail_levels = ChunkParameters::default().detail_levels;
        }

        let n = self.resolution as usize;
        for level in &mut self.detail_levels {
            if level.lod > MAX_LOD {
                warn!("LOD {} exceeds maximum {}, clamping", level.lod, MAX_LOD);
                level.lod = MAX_LOD;
            }
            // LOD 0 always divides, so this terminates.
            let wanted = level.lod;
            while level.lod > 0 && (n - 1) % lod_stride(level.lod) != 0 {
                level.lod -= 1;
            }
            if level.lod != wanted {
                warn!(
                    "LOD {} stride does not divide resolution {} - 1, lowered to {}",
                    wanted, self.resolution, level.lod
                );
            }
        }

        for i in 1..self.detail_levels.len() {
            let previous = self.detail_levels[i - 1].visible_distance_threshold;
            let level = &mut self.detail_levels[i];
            if level.visible_distance_threshold < previous {
                warn!(
                    "detail level {} threshold {} is below the previous level's {}, raising",
                    i, level.visible_distance_threshold, previous
                );
                level.visible_distance_threshold = previous;
            }
        }

        if self.collider_lod_index >= self.detail_levels.len() {
            warn!(
                "collider_lod_index {} is out of range, using {}",
                self.collider_lod_index,
                self.detail_levels.len() - 1
            );
            self.collider_lod_index = self.detail_levels.len() - 1;
        }

        if self.collider_generation_distance < 0.0 {
            warn!("collider_generation_distance is negative, using 0");
            self.collider_generation_distance = 0.0;
        }
        if self.viewer_move_threshold < 0.0 {
            warn!("viewer_move_threshold is negative, using 0");
            self.viewer_move_threshold = 0.0;
        }
    }
}

// Configuration Manager
pub struct ConfigurationManager {
    current_config: TerrainConfiguration,
    config_path: Option<PathBuf>,
}

impl ConfigurationManager {
    // Create a new configuration manager with a specific config
    pub fn with_config(mut config: TerrainConfiguration, config_path: Option<PathBuf>) -> Self {
        config.sanitize();
        Self {
            current_config: config,
            config_path,
        }
    }

    // Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let config_str = fs::read_to_string(path.as_ref())?;
        let mut config: TerrainConfiguration = toml::from_str(&config_str)?;
        config.sanitize();

        Ok(Self {
            current_config: config,
            config_path: Some(path.as_ref().to_path_buf()),
        })
    }

    // Save configuration to the configured path, if any
    pub fn save_to_file(&self) -> Result<(), ConfigurationError> {
        if let Some(path) = &self.config_path {
            let toml_string = toml::to_string_pretty(&self.current_config)?;
            fs::write(path, toml_string)?;
        }
        Ok(())
    }

    // Set a new config path
    pub fn set_config_path<P: AsRef<Path>>(&mut self, path: P) {
        self.config_path = Some(path.as_ref().to_path_buf());
    }

    // Replace the configuration; the replacement is sanitized first
    pub fn update_config(&mut self, mut updates: TerrainConfiguration) {
        updates.sanitize();
        self.current_config = updates;
    }

    pub fn get_config(&self) -> &TerrainConfiguration {
        &self.current_config
    }
}

impl Default for ConfigurationManager {
    fn default() -> Self {
        Self {
            current_config: TerrainConfiguration::default(),
            config_path: None,
        }
    }
}

// Custom error type for configuration errors
#[derive(Debug)]
pub enum ConfigurationError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::Io(e) => write!(f, "configuration io error: {}", e),
            ConfigurationError::Parse(e) => write!(f, "configuration parse error: {}", e),
            ConfigurationError::Serialize(e) => write!(f, "configuration serialize error: {}", e),
        }
    }
}

impl std::error::Error for ConfigurationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigurationError::Io(e) => Some(e),
            ConfigurationError::Parse(e) => Some(e),
            ConfigurationError::Serialize(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigurationError {
    fn from(e: std::io::Error) -> Self {
        ConfigurationError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigurationError {
    fn from(e: toml::de::Error) -> Self {
        ConfigurationError::Parse(e)
    }
}

impl From<toml::ser::Error> for ConfigurationError {
    fn from(e: toml::ser::Error) -> Self {
        ConfigurationError::Serialize(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::noise::NormalizeMode;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn temp_config_path(tag: &str) -> PathBuf {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "moraine_config_{}_{}_{}.toml",
            tag,
            std::process::id(),
            unique
        ))
    }

    #[test]
    fn defaults_survive_sanitize_unchanged() {
        let mut config = TerrainConfiguration::default();
        config.sanitize();
        assert_eq!(config, TerrainConfiguration::default());
    }

    #[test]
    fn sanitize_clamps_out_of_range_values() {
        let mut config = TerrainConfiguration::default();
        config.noise.octaves = -3;
        config.noise.lacunarity = 0.5;
        config.noise.scale = 0.0;
        config.mesh.uniform_scale = -1.0;
        config.chunks.resolution = 100;
        config.chunks.detail_levels = vec![
            DetailLevel::new(0, 300.0),
            DetailLevel::new(9, 150.0),
        ];
        config.chunks.collider_lod_index = 10;
        config.chunks.collider_generation_distance = -4.0;
        config.chunks.viewer_move_threshold = -1.0;

        config.sanitize();

        assert_eq!(config.noise.octaves, 0);
        assert_eq!(config.noise.lacunarity, 1.0);
        assert!(config.noise.scale > 0.0);
        assert_eq!(config.mesh.uniform_scale, 1.0);
        assert_eq!(config.chunks.resolution, 121);
        assert_eq!(config.chunks.detail_levels[1].lod, MAX_LOD);
        // Descending thresholds are raised to the previous level's.
        assert_eq!(
            config.chunks.detail_levels[1].visible_distance_threshold,
            300.0
        );
        assert_eq!(config.chunks.collider_lod_index, 1);
        assert_eq!(config.chunks.collider_generation_distance, 0.0);
        assert_eq!(config.chunks.viewer_move_threshold, 0.0);
    }

    #[test]
    fn sanitize_lowers_lods_whose_stride_does_not_divide() {
        let mut config = TerrainConfiguration::default();
        config.chunks.resolution = 25;
        // Stride 10 does not divide 24; stride 8 does.
        config.chunks.detail_levels = vec![
            DetailLevel::new(0, 150.0),
            DetailLevel::new(5, 300.0),
        ];
        config.sanitize();
        assert_eq!(config.chunks.detail_levels[1].lod, 4);
    }

    #[test]
    fn sanitize_restores_an_empty_level_ladder() {
        let mut config = TerrainConfiguration::default();
        config.chunks.detail_levels.clear();
        config.chunks.collider_lod_index = 0;
        config.sanitize();
        assert!(!config.chunks.detail_levels.is_empty());
    }

    #[test]
    fn toml_round_trip_preserves_a_sanitized_config() {
        let mut config = TerrainConfiguration::default();
        config.noise.seed = 77;
        config.noise.normalize_mode = NormalizeMode::Local;
        config.chunks.resolution = 121;
        config.chunks.use_falloff = true;
        config.sanitize();

        let text = toml::to_string_pretty(&config).expect("serializes");
        let mut reloaded: TerrainConfiguration = toml::from_str(&text).expect("parses");
        reloaded.sanitize();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn load_from_file_parses_and_sanitizes() {
        let path = temp_config_path("load");
        let mut config = TerrainConfiguration::default();
        config.noise.octaves = -2;
        config.noise.seed = 1234;
        let text = toml::to_string_pretty(&config).expect("serializes");
        fs::write(&path, text).expect("temp config written");

        let manager = ConfigurationManager::load_from_file(&path).expect("loads");
        assert_eq!(manager.get_config().noise.seed, 1234);
        assert_eq!(manager.get_config().noise.octaves, 0);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn save_then_load_round_trips() {
        let path = temp_config_path("save");
        let mut config = TerrainConfiguration::default();
        config.noise.seed = 99;
        let manager = ConfigurationManager::with_config(config, Some(path.clone()));
        manager.save_to_file().expect("saves");

        let reloaded = ConfigurationManager::load_from_file(&path).expect("loads");
        assert_eq!(reloaded.get_config(), manager.get_config());
        assert_eq!(reloaded.get_config().noise.seed, 99);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn save_without_a_path_is_a_no_op() {
        let manager = ConfigurationManager::default();
        manager.save_to_file().expect("no-op save");
    }

    #[test]
    fn missing_file_reports_an_io_error() {
        let result = ConfigurationManager::load_from_file("/nonexistent/moraine.toml");
        match result {
            Err(ConfigurationError::Io(_)) => {}
            other => panic!("expected io error, got {:?}", other.err()),
        }
    }

    #[test]
    fn malformed_toml_reports_a_parse_error() {
        let path = temp_config_path("bad");
        fs::write(&path, "config_version = [not toml").expect("temp file written");
        let result = ConfigurationManager::load_from_file(&path);
        match result {
            Err(ConfigurationError::Parse(_)) => {}
            other => panic!("expected parse error, got {:?}", other.err()),
        }
        let _ = fs::remove_file(&path);
    }
}
