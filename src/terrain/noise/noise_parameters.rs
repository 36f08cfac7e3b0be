// src/terrain/noise/noise_parameters.rs
use log::warn;
use serde::{Deserialize, Serialize};

/// How a generated noise field is remapped into the [0, 1] range.
///
/// `Local` stretches each tile over the full range using its own observed
/// min/max, so isolated tiles always span [0, 1] but adjacent tiles disagree
/// about absolute height. `Global` divides by the theoretical amplitude sum
/// instead, which keeps heights comparable across tiles and is the only mode
/// that produces seamless chunk borders in an endless world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalizeMode {
    Local,
    Global,
}

/// Fractal noise inputs, shared between the configuration file and the
/// generation workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseParameters {
    pub seed: u32,
    /// World units per noise unit. Values at or below zero are floored to a
    /// tiny epsilon rather than rejected.
    pub scale: f32,
    /// Number of fractal layers. Stored signed so a negative value from a
    /// config file can be clamped at the boundary instead of wrapping.
    pub octaves: i32,
    /// Amplitude decay per octave, typically in (0, 1].
    pub persistence: f32,
    /// Frequency growth per octave; clamped to >= 1.
    pub lacunarity: f32,
    /// User offset added to every chunk's sampling origin.
    pub offset: [f32; 2],
    pub normalize_mode: NormalizeMode,
    /// Empirical divisor applied to the theoretical amplitude sum in
    /// `Global` mode to pull typical output into [0, 1].
    pub global_normalization_divisor: f32,
}

impl NoiseParameters {
    /// Clamps out-of-range values in place, logging each correction.
    /// Generation itself never validates; bad values stop here.
    pub fn sanitize(&mut self) {
        if self.scale <= 0.0 {
            warn!("noise scale {} is not positive; flooring to epsilon", self.scale);
            self.scale = 1e-4;
        }
        if self.octaves < 0 {
            warn!("octave count {} is negative; clamping to 0", self.octaves);
            self.octaves = 0;
        }
        if self.lacunarity < 1.0 {
            warn!("lacunarity {} is below 1; clamping to 1", self.lacunarity);
            self.lacunarity = 1.0;
        }
        if self.global_normalization_divisor <= 0.0 {
            warn!(
                "global normalization divisor {} is not positive; resetting to 1.75",
                self.global_normalization_divisor
            );
            self.global_normalization_divisor = 1.75;
        }
    }
}

impl Default for NoiseParameters {
    fn default() -> Self {
        NoiseParameters {
            seed: 0,
            scale: 50.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            offset: [0.0, 0.0],
            normalize_mode: NormalizeMode::Global,
            global_normalization_divisor: 1.75,
        }
    }
}
