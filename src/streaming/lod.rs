//! Distance-based level of detail selection
//!
//! A chunk's mesh detail is chosen from an ordered list of detail levels.
//! Each level pairs a vertex skip factor with the furthest edge distance it
//! is used at; the last level also covers everything beyond its threshold.

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// One entry of the detail-level list
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetailLevel {
    /// Mesh vertex skip factor (1 = full detail)
    pub lod: u32,
    /// Furthest edge distance, in world units, this level is used at
    pub distance_threshold: f32,
}

impl DetailLevel {
    pub fn new(lod: u32, distance_threshold: f32) -> Self {
        Self { lod, distance_threshold }
    }

    /// Squared threshold, for comparisons against squared distances
    pub fn sqr_threshold(&self) -> f32 {
        self.distance_threshold * self.distance_threshold
    }
}

/// Detail levels ordered by strictly increasing distance threshold
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetailLevels(Vec<DetailLevel>);

impl Default for DetailLevels {
    /// Skip factors 1, 2, 4, 8 out to 300 world units
    fn default() -> Self {
        Self(vec![
            DetailLevel::new(1, 100.0),
            DetailLevel::new(2, 175.0),
            DetailLevel::new(4, 250.0),
            DetailLevel::new(8, 300.0),
        ])
    }
}

impl DetailLevels {
    /// Wrap levels without checking them; see [`DetailLevels::validate`]
    pub fn new(levels: Vec<DetailLevel>) -> Self {
        Self(levels)
    }

    pub fn levels(&self) -> &[DetailLevel] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DetailLevel> {
        self.0.get(index)
    }

    /// Check ordering and that every skip factor divides `resolution`.
    pub fn validate(&self, resolution: usize) -> Result<()> {
        if self.0.is_empty() {
            return Err(Error::DetailLevels("at least one detail level is required".to_string()));
        }

        for (i, level) in self.0.iter().enumerate() {
            if level.lod == 0 {
                return Err(Error::DetailLevels(format!("level {} has skip factor 0", i)));
            }
            if resolution % level.lod as usize != 0 {
                return Err(Error::DetailLevels(format!(
                    "level {} skip factor {} does not divide chunk resolution {}",
                    i, level.lod, resolution
                )));
            }
            if level.distance_threshold.is_nan() {
                return Err(Error::DetailLevels(format!("level {} threshold is NaN", i)));
            }
        }

        for (i, pair) in self.0.windows(2).enumerate() {
            if pair[1].distance_threshold <= pair[0].distance_threshold {
                return Err(Error::DetailLevels(format!(
                    "thresholds must strictly increase: level {} ({}) <= level {} ({})",
                    i + 1,
                    pair[1].distance_threshold,
                    i,
                    pair[0].distance_threshold
                )));
            }
        }
        Ok(())
    }

    /// Index of the first level whose threshold covers `distance`,
    /// or the last level when none does.
    ///
    /// # Examples
    /// ```
    /// use terrastream::streaming::lod::{DetailLevel, DetailLevels};
    ///
    /// let levels = DetailLevels::new(vec![
    ///     DetailLevel::new(1, 200.0),
    ///     DetailLevel::new(2, 400.0),
    ///     DetailLevel::new(4, f32::INFINITY),
    /// ]);
    /// assert_eq!(levels.lod_index(50.0), 0);
    /// assert_eq!(levels.lod_index(250.0), 1);
    /// assert_eq!(levels.lod_index(5000.0), 2);
    /// ```
    pub fn lod_index(&self, distance: f32) -> usize {
        self.0
            .iter()
            .position(|level| distance <= level.distance_threshold)
            .unwrap_or(self.0.len().saturating_sub(1))
    }

    /// Threshold of the last level, the furthest distance any level names
    pub fn max_threshold(&self) -> Option<f32> {
        self.0.last().map(|level| level.distance_threshold)
    }
}
