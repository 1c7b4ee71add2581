//! Level of Detail (LOD) table for distance-based mesh simplification
//!
//! Each entry pairs a mesh simplification level with the viewer distance up
//! to which it is used. Entry 0 is the finest and is shown closest to the
//! viewer; the last threshold doubles as the maximum view distance.

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;
use crate::core::updatable::Validate;
use crate::mesh::builder::MAX_SIMPLIFICATION_LEVEL;

/// One row of the LOD table
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LodLevel {
    /// Mesh simplification level (0 = full detail)
    pub level: u32,
    /// Largest viewer distance at which this entry is selected
    pub distance_threshold: f32,
    /// This entry's mesh also backs physics collision
    #[serde(default)]
    pub used_for_collision: bool,
}

impl LodLevel {
    pub const fn new(level: u32, distance_threshold: f32, used_for_collision: bool) -> Self {
        Self { level, distance_threshold, used_for_collision }
    }
}

/// Ordered LOD entries, strictly ascending by distance threshold
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LodTable {
    levels: Vec<LodLevel>,
}

impl Default for LodTable {
    fn default() -> Self {
        Self::new(vec![
            LodLevel::new(0, 200.0, true),
            LodLevel::new(1, 400.0, false),
            LodLevel::new(2, 600.0, false),
            LodLevel::new(4, 1000.0, false),
        ])
    }
}

impl LodTable {
    /// Wrap entries without validating them
    pub fn new(levels: Vec<LodLevel>) -> Self {
        Self { levels }
    }

    pub fn levels(&self) -> &[LodLevel] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LodLevel> {
        self.levels.get(index)
    }

    /// Distance beyond which chunks are hidden
    pub fn max_view_distance(&self) -> f32 {
        self.levels.last().map_or(0.0, |lod| lod.distance_threshold)
    }

    /// Index of the first entry whose threshold `distance` does not exceed,
    /// or the coarsest entry when it exceeds them all.
    pub fn select(&self, distance: f32) -> usize {
        self.levels
            .iter()
            .position(|lod| distance <= lod.distance_threshold)
            .unwrap_or(self.levels.len().saturating_sub(1))
    }

    /// Index of the entry backing collision
    pub fn collision_index(&self) -> Option<usize> {
        self.levels.iter().position(|lod| lod.used_for_collision)
    }
}

impl Validate for LodTable {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.levels.is_empty() {
            return Err(ConfigError::EmptyLodTable);
        }

        let mut previous = 0.0;
        for (index, lod) in self.levels.iter().enumerate() {
            if lod.level > MAX_SIMPLIFICATION_LEVEL {
                return Err(ConfigError::InvalidSimplification {
                    level: lod.level,
                    max: MAX_SIMPLIFICATION_LEVEL,
                });
            }
            let threshold = lod.distance_threshold;
            if !threshold.is_finite() || threshold <= previous {
                return Err(ConfigError::NonMonotonicLod { index, previous, threshold });
            }
            previous = threshold;
        }

        let collision = self.levels.iter().filter(|lod| lod.used_for_collision).count();
        if collision != 1 {
            return Err(ConfigError::CollisionLod(collision));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> LodTable {
        LodTable::new(vec![
            LodLevel::new(0, 100.0, true),
            LodLevel::new(2, 250.0, false),
            LodLevel::new(4, 400.0, false),
        ])
    }

    #[test]
    fn test_default_table_is_valid() {
        let lods = LodTable::default();
        assert!(lods.validate().is_ok());
        assert_eq!(lods.max_view_distance(), 1000.0);
        assert_eq!(lods.collision_index(), Some(0));
    }

    #[test]
    fn test_select_boundaries() {
        let lods = table();
        assert_eq!(lods.select(0.0), 0);
        assert_eq!(lods.select(100.0), 0);
        assert_eq!(lods.select(100.5), 1);
        assert_eq!(lods.select(250.0), 1);
        assert_eq!(lods.select(399.0), 2);
        // Beyond the view distance the coarsest entry is used
        assert_eq!(lods.select(10_000.0), 2);
    }

    #[test]
    fn test_select_is_monotonic() {
        let lods = table();
        let mut last = 0;
        for step in 0..600 {
            let index = lods.select(step as f32);
            assert!(index >= last, "LOD index decreased at distance {}", step);
            last = index;
        }
    }

    #[test]
    fn test_rejects_empty_table() {
        assert_eq!(LodTable::new(Vec::new()).validate(), Err(ConfigError::EmptyLodTable));
    }

    #[test]
    fn test_rejects_non_ascending_thresholds() {
        let lods = LodTable::new(vec![
            LodLevel::new(0, 200.0, true),
            LodLevel::new(1, 200.0, false),
        ]);
        assert_eq!(
            lods.validate(),
            Err(ConfigError::NonMonotonicLod { index: 1, previous: 200.0, threshold: 200.0 })
        );
    }

    #[test]
    fn test_rejects_collision_count() {
        let none = LodTable::new(vec![LodLevel::new(0, 100.0, false)]);
        assert_eq!(none.validate(), Err(ConfigError::CollisionLod(0)));

        let two = LodTable::new(vec![
            LodLevel::new(0, 100.0, true),
            LodLevel::new(1, 200.0, true),
        ]);
        assert_eq!(two.validate(), Err(ConfigError::CollisionLod(2)));
    }

    #[test]
    fn test_rejects_excessive_simplification() {
        let lods = LodTable::new(vec![LodLevel::new(7, 100.0, true)]);
        assert_eq!(
            lods.validate(),
            Err(ConfigError::InvalidSimplification { level: 7, max: 6 })
        );
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{ "levels": [
            { "level": 0, "distance_threshold": 150.0, "used_for_collision": true },
            { "level": 3, "distance_threshold": 300.0 }
        ] }"#;
        let lods: LodTable = serde_json::from_str(json).unwrap();
        assert!(lods.validate().is_ok());
        assert_eq!(lods.get(1), Some(&LodLevel::new(3, 300.0, false)));
    }
}
