// src/terrain/noise/noise_map.rs
use glam::Vec2;
use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::terrain::height_field::HeightField;
use crate::terrain::noise::noise_parameters::{NoiseParameters, NormalizeMode};

/// Generates a fractal noise field of the given dimensions.
///
/// `centre` is the tile's sampling origin in map units and is added to the
/// configured user offset. Per-octave offsets are drawn as integers from a
/// seeded ChaCha stream: integer offsets keep `cell - half + offset` exact in
/// f32, which is what makes the shared column/row of two adjacent tiles
/// bit-identical in `Global` mode.
///
/// The y component of each octave offset subtracts the caller offset while x
/// adds it, matching the mesh's inverted z axis so northward tiles continue
/// the field seamlessly.
pub fn generate_noise_map(
    width: usize,
    height: usize,
    params: &NoiseParameters,
    centre: Vec2,
) -> HeightField {
    let octaves = params.octaves.max(0) as usize;
    // Boundary sanitization should have caught this; floor again locally so a
    // raw parameter struct can never divide by zero.
    let scale = if params.scale <= 0.0 { 1e-4 } else { params.scale };

    let perlin = Perlin::new(params.seed);
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed as u64);

    let total_offset = Vec2::new(params.offset[0], params.offset[1]) + centre;

    let mut octave_offsets = Vec::with_capacity(octaves);
    let mut max_possible_height = 0.0f32;
    let mut amplitude = 1.0f32;
    for _ in 0..octaves {
        let offset_x = rng.random_range(-100_000..100_000) as f32 + total_offset.x;
        let offset_y = rng.random_range(-100_000..100_000) as f32 - total_offset.y;
        octave_offsets.push(Vec2::new(offset_x, offset_y));

        max_possible_height += amplitude;
        amplitude *= params.persistence;
    }

    let half_width = width as f32 / 2.0;
    let half_height = height as f32 / 2.0;

    let mut field = HeightField::new(width, height);
    let mut min_noise_height = f32::MAX;
    let mut max_noise_height = f32::MIN;

    for y in 0..height {
        for x in 0..width {
            let mut amplitude = 1.0f32;
            let mut frequency = 1.0f32;
            let mut noise_height = 0.0f32;

            for octave_offset in &octave_offsets {
                let sample_x = (x as f32 - half_width + octave_offset.x) / scale * frequency;
                let sample_y = (y as f32 - half_height + octave_offset.y) / scale * frequency;

                let value = perlin.get([sample_x as f64, sample_y as f64]) as f32;
                noise_height += value * amplitude;

                amplitude *= params.persistence;
                frequency *= params.lacunarity;
            }

            if noise_height > max_noise_height {
                max_noise_height = noise_height;
            }
            if noise_height < min_noise_height {
                min_noise_height = noise_height;
            }
            field.set(x, y, noise_height);
        }
    }

    normalize(
        &mut field,
        params,
        min_noise_height,
        max_noise_height,
        max_possible_height,
    );
    field
}

fn normalize(
    field: &mut HeightField,
    params: &NoiseParameters,
    min_noise_height: f32,
    max_noise_height: f32,
    max_possible_height: f32,
) {
    match params.normalize_mode {
        NormalizeMode::Local => {
            let range = max_noise_height - min_noise_height;
            for y in 0..field.height() {
                for x in 0..field.width() {
                    let value = if range > f32::EPSILON {
                        (field.get(x, y) - min_noise_height) / range
                    } else {
                        0.0
                    };
                    field.set(x, y, value);
                }
            }
        }
        NormalizeMode::Global => {
            // With zero octaves the amplitude sum is zero and the whole
            // field degenerates to flat sea level.
            if max_possible_height <= 0.0 {
                for y in 0..field.height() {
                    for x in 0..field.width() {
                        field.set(x, y, 0.0);
                    }
                }
                return;
            }
            let limit = max_possible_height / params.global_normalization_divisor;
            for y in 0..field.height() {
                for x in 0..field.width() {
                    let value = ((field.get(x, y) + 1.0) / limit).max(0.0);
                    field.set(x, y, value);
                }
            }
        }
    }
}
