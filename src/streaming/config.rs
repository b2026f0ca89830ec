//! Streaming configuration, loaded once and read-only afterwards

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::lod::{DetailLevel, DetailLevels};
use super::task_queue::WorkerConfig;
use crate::core::{Error, Result};
use crate::mesh::MeshSettings;
use crate::terrain::HeightMapSettings;

/// Largest window half-width, in chunks, a config may ask for
pub const MAX_CHECK_RADIUS: i32 = 64;

/// Flat water plane streamed alongside terrain
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterSettings {
    /// World height of the water surface
    pub surface_height: f32,
}

impl Default for WaterSettings {
    fn default() -> Self {
        Self { surface_height: 2.0 }
    }
}

/// Everything the streaming manager and its chunks need to know
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    pub mesh: MeshSettings,
    pub height_map: HeightMapSettings,
    pub detail_levels: DetailLevels,
    /// Detail level whose mesh becomes the collision mesh
    pub collider_lod_index: usize,
    /// Edge distance beyond which chunks are hidden
    pub max_view_distance: f32,
    /// Observer displacement that triggers a full window rescan
    pub chunk_update_threshold: f32,
    /// Edge distance at which a chunk's collision mesh is finalized
    pub collider_update_threshold: f32,
    /// Extra chunks scanned on every side of the view radius
    pub window_padding: u32,
    /// Free hidden chunks after this many scans outside the window; `None` keeps them forever
    pub evict_after_scans: Option<u32>,
    pub workers: WorkerConfig,
    pub water: Option<WaterSettings>,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            mesh: MeshSettings::default(),
            height_map: HeightMapSettings::default(),
            detail_levels: DetailLevels::default(),
            collider_lod_index: 0,
            max_view_distance: 300.0,
            chunk_update_threshold: 25.0,
            collider_update_threshold: 5.0,
            window_padding: 0,
            evict_after_scans: None,
            workers: WorkerConfig::PerTask,
            water: None,
        }
    }
}

impl StreamingConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Save as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject configurations that would misbehave while streaming
    pub fn validate(&self) -> Result<()> {
        self.mesh.validate()?;
        self.detail_levels.validate(self.mesh.resolution())?;

        if self.collider_lod_index >= self.detail_levels.len() {
            return Err(Error::Config(format!(
                "collider_lod_index {} out of range ({} detail levels)",
                self.collider_lod_index,
                self.detail_levels.len()
            )));
        }
        if !(self.max_view_distance > 0.0 && self.max_view_distance.is_finite()) {
            return Err(Error::Config(format!(
                "max_view_distance must be positive and finite, got {}",
                self.max_view_distance
            )));
        }
        let radius = (f64::from(self.max_view_distance) / f64::from(self.chunk_world_size())).round()
            + f64::from(self.window_padding);
        if radius > f64::from(MAX_CHECK_RADIUS) {
            return Err(Error::Config(format!(
                "scan radius {} chunks exceeds {} (max_view_distance {}, window_padding {})",
                radius, MAX_CHECK_RADIUS, self.max_view_distance, self.window_padding
            )));
        }
        if !(self.chunk_update_threshold >= 0.0) {
            return Err(Error::Config(format!(
                "chunk_update_threshold must be non-negative, got {}",
                self.chunk_update_threshold
            )));
        }
        if !(self.collider_update_threshold >= 0.0) {
            return Err(Error::Config(format!(
                "collider_update_threshold must be non-negative, got {}",
                self.collider_update_threshold
            )));
        }
        if let WorkerConfig::Pooled { threads: 0 } = self.workers {
            return Err(Error::Config("pooled worker count must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Side length of one chunk in world units
    pub fn chunk_world_size(&self) -> f32 {
        self.mesh.mesh_world_size()
    }

    /// Half-width, in chunks, of the square window scanned around the observer.
    /// Only meaningful for configs that pass [`validate`](Self::validate).
    pub fn check_radius(&self) -> i32 {
        (self.max_view_distance / self.chunk_world_size()).round() as i32 + self.window_padding as i32
    }

    /// Detail level used for collision
    pub fn collider_level(&self) -> Option<&DetailLevel> {
        self.detail_levels.get(self.collider_lod_index)
    }
}
