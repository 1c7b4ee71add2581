//! Square grids of normalized height samples

/// Square grid of height samples, stored row-major.
///
/// A chunk's grid is `chunk_size + 2` cells wide: one extra cell on every side
/// forms the border ring used for seam-correct normals.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightGrid {
    size: usize,
    values: Vec<f32>,
}

impl HeightGrid {
    /// Create a grid of `size * size` zeros
    pub fn new(size: usize) -> Self {
        Self {
            size,
            values: vec![0.0; size * size],
        }
    }

    /// Wrap existing row-major samples. Returns `None` if the length is not `size * size`.
    pub fn from_values(size: usize, values: Vec<f32>) -> Option<Self> {
        (values.len() == size * size).then_some(Self { size, values })
    }

    /// Side length in cells
    pub fn size(&self) -> usize {
        self.size
    }

    /// Sample at `(x, y)`
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.size + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        self.values[y * self.size + x] = value;
    }

    /// Row-major samples
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    /// Smallest and largest sample
    pub fn min_max(&self) -> (f32, f32) {
        self.values.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
    }
}
