use crate::terrain::height_field::HeightField;

/// Generates a square (Chebyshev-distance) falloff field: 0 at the center of
/// the grid, rising to 1 at the edges. Subtracting it from a height field
/// pushes terrain toward sea level at chunk borders, for island-style maps.
///
/// Each cell's grid position is mapped endpoint-inclusively to [-1, 1], so
/// corners evaluate to exactly 1. Pure function of `size`; no randomness.
pub fn generate_falloff_map(size: usize) -> HeightField {
    assert!(size >= 2, "falloff field needs at least a 2x2 grid");

    let extent = (size - 1) as f32;
    HeightField::from_fn(size, size, |i, j| {
        let x = i as f32 / extent * 2.0 - 1.0;
        let y = j as f32 / extent * 2.0 - 1.0;
        x.abs().max(y.abs())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_is_zero_and_corners_are_one() {
        for size in [3usize, 5, 17, 243] {
            let field = generate_falloff_map(size);
            let mid = size / 2;
            assert!(
                field.get(mid, mid).abs() < 1e-6,
                "center of size {} was {}",
                size,
                field.get(mid, mid)
            );
            for (cx, cy) in [(0, 0), (size - 1, 0), (0, size - 1), (size - 1, size - 1)] {
                assert!((field.get(cx, cy) - 1.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn smallest_supported_grid_is_all_corners() {
        let field = generate_falloff_map(2);
        for &v in field.values() {
            assert!((v - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn values_grow_monotonically_toward_the_edge() {
        let field = generate_falloff_map(9);
        let mid = 4;
        for i in mid..8 {
            assert!(field.get(i + 1, mid) >= field.get(i, mid));
            assert!(field.get(mid, i + 1) >= field.get(mid, i));
        }
    }

    #[test]
    fn field_is_symmetric() {
        let field = generate_falloff_map(11);
        for y in 0..11 {
            for x in 0..11 {
                let v = field.get(x, y);
                assert_eq!(v, field.get(10 - x, y));
                assert_eq!(v, field.get(x, 10 - y));
                assert_eq!(v, field.get(y, x));
            }
        }
    }

    #[test]
    #[should_panic]
    fn size_below_two_is_rejected() {
        let _ = generate_falloff_map(1);
    }
}
