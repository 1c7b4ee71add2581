//! Square falloff mask for island-shaped terrain

use super::height_grid::HeightGrid;

/// Attenuation grid that is 0 near the center and 1 on the outer edge.
#[derive(Clone, Debug, PartialEq)]
pub struct FalloffMask {
    grid: HeightGrid,
}

impl FalloffMask {
    /// Build the mask for a `size * size` grid.
    ///
    /// Cells are mapped to centered coordinates in `[-1, 1]` and take the
    /// Chebyshev value `max(|x|, |y|)`.
    pub fn generate(size: usize) -> Self {
        let mut grid = HeightGrid::new(size);
        let denom = size.saturating_sub(1).max(1) as f32;

        for y in 0..size {
            for x in 0..size {
                let cx = x as f32 / denom * 2.0 - 1.0;
                let cy = y as f32 / denom * 2.0 - 1.0;
                grid.set(x, y, cx.abs().max(cy.abs()));
            }
        }

        Self { grid }
    }

    pub fn size(&self) -> usize {
        self.grid.size()
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.grid.get(x, y)
    }

    /// Pull `heights` toward zero: `clamp01(h - mask * strength)`.
    ///
    /// Both grids must have the same size.
    pub fn apply(&self, heights: &mut HeightGrid, strength: f32) {
        debug_assert_eq!(heights.size(), self.size());
        for (h, m) in heights.values_mut().iter_mut().zip(self.grid.values()) {
            *h = (*h - m * strength).clamp(0.0, 1.0);
        }
    }
}
