pub mod noise_map;
pub mod noise_parameters;

pub use noise_map::generate_noise_map;
pub use noise_parameters::{NoiseParameters, NormalizeMode};
