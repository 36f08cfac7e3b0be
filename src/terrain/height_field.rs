/// A 2D grid of scalar height values, stored row-major.
///
/// Chunk height fields are generated at the bordered dimension
/// `(N + 2) x (N + 2)`: the outermost ring carries the neighboring chunks'
/// edge data so mesh normals can be stitched across seams, and is never
/// rendered. The field is immutable once handed to a chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl HeightField {
    pub fn new(width: usize, height: usize) -> Self {
        HeightField {
            width,
            height,
            values: vec![0.0; width * height],
        }
    }

    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> f32,
    {
        let mut values = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                values.push(f(x, y));
            }
        }
        HeightField {
            width,
            height,
            values,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Interior resolution of a bordered field (grid minus the skirt ring).
    pub fn interior_resolution(&self) -> usize {
        debug_assert!(self.width >= 2 && self.height >= 2);
        self.width - 2
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        self.values[y * self.width + x] = value;
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Smallest and largest value in the field. Empty fields report (0, 0).
    pub fn min_max(&self) -> (f32, f32) {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for &v in &self.values {
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }
        if self.values.is_empty() {
            (0.0, 0.0)
        } else {
            (min, max)
        }
    }
}
