//! Procedural heightfield generation

pub mod noise_field;
pub mod height_curve;
pub mod height_grid;

pub use noise_field::{NoiseField, NoiseSettings, falloff};
pub use height_curve::HeightCurve;
pub use height_grid::{HeightGrid, HeightMapSettings};
