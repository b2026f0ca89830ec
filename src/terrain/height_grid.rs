//! Heightfield generation for a single chunk

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::height_curve::HeightCurve;
use super::noise_field::{NoiseField, NoiseSettings};

/// Noise parameters plus the mapping from raw samples to display height.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightMapSettings {
    pub noise: NoiseSettings,
    pub height_multiplier: f32,
    pub height_curve: HeightCurve,
}

impl Default for HeightMapSettings {
    fn default() -> Self {
        Self {
            noise: NoiseSettings::default(),
            height_multiplier: 40.0,
            height_curve: HeightCurve::linear(),
        }
    }
}

impl HeightMapSettings {
    /// Display height for a raw stored sample (curve, then multiplier)
    pub fn height_from_sample(&self, raw: f32) -> f32 {
        self.height_curve.evaluate(raw) * self.height_multiplier
    }

    /// Lowest display height the curve can produce for samples in `[0, 1]`
    pub fn min_height(&self) -> f32 {
        self.height_multiplier * self.height_curve.evaluate(0.0)
    }

    /// Highest display height the curve can produce for samples in `[0, 1]`
    pub fn max_height(&self) -> f32 {
        self.height_multiplier * self.height_curve.evaluate(1.0)
    }
}

/// Row-major grid of raw height samples.
///
/// Holds the normalized, falloff-attenuated noise values exactly as sampled;
/// display heights are derived on read through [`HeightMapSettings`].
#[derive(Clone, Debug, PartialEq)]
pub struct HeightGrid {
    width: usize,
    height: usize,
    values: Vec<f32>,
    min_value: f32,
    max_value: f32,
}

impl HeightGrid {
    /// Sample `settings` over a `width x height` grid centered on `sample_center`.
    ///
    /// Deterministic: identical inputs always produce identical grids.
    pub fn generate(width: usize, height: usize, settings: &NoiseSettings, sample_center: Vec2) -> Self {
        let field = NoiseField::new(settings, sample_center);
        let half_width = width as f64 / 2.0;
        let half_height = height as f64 / 2.0;

        let mut values = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                values.push(field.sample(x as f64 - half_width, y as f64 - half_height));
            }
        }

        Self::from_values(width, height, values)
    }

    /// Grid of zeros, used for flat (water) meshes
    pub fn flat(width: usize, height: usize) -> Self {
        Self::from_values(width, height, vec![0.0; width * height])
    }

    /// Wrap existing row-major samples.
    ///
    /// # Panics
    /// Panics if `values.len() != width * height`.
    pub fn from_values(width: usize, height: usize, values: Vec<f32>) -> Self {
        assert_eq!(values.len(), width * height, "height grid size mismatch");
        let min_value = values.iter().copied().fold(f32::INFINITY, f32::min);
        let max_value = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        Self {
            width,
            height,
            values,
            min_value,
            max_value,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw sample at `(x, y)`.
    ///
    /// # Panics
    /// Panics when out of range; use [`HeightGrid::try_get`] for checked access.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        debug_assert!(x < self.width && y < self.height);
        self.values[y * self.width + x]
    }

    /// Raw sample at `(x, y)`, or `None` when out of range
    pub fn try_get(&self, x: usize, y: usize) -> Option<f32> {
        (x < self.width && y < self.height).then(|| self.values[y * self.width + x])
    }

    /// All samples, row-major
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Smallest sample in the grid
    pub fn min_value(&self) -> f32 {
        self.min_value
    }

    /// Largest sample in the grid
    pub fn max_value(&self) -> f32 {
        self.max_value
    }
}
