//! Mesh dimensions shared by every chunk

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Extra rows/columns around each chunk used only for normal baking
pub const NUM_BORDER_VERTICES: usize = 2;

/// Chunk resolutions (cells per side) that every configured LOD divides evenly
pub const SUPPORTED_CHUNK_SIZES: [usize; 9] = [48, 72, 96, 120, 144, 168, 192, 216, 240];

/// Mesh layout for a chunk
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshSettings {
    /// Index into [`SUPPORTED_CHUNK_SIZES`]
    pub chunk_size_index: usize,
    /// World units per grid cell
    pub scale: f32,
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self {
            chunk_size_index: SUPPORTED_CHUNK_SIZES.len() - 1,
            scale: 1.0,
        }
    }
}

impl MeshSettings {
    /// Settings for the given supported resolution, if it is one.
    pub fn with_resolution(resolution: usize, scale: f32) -> Option<Self> {
        SUPPORTED_CHUNK_SIZES
            .iter()
            .position(|&size| size == resolution)
            .map(|chunk_size_index| Self { chunk_size_index, scale })
    }

    /// Cells per chunk side at full detail
    pub fn resolution(&self) -> usize {
        SUPPORTED_CHUNK_SIZES[self.chunk_size_index.min(SUPPORTED_CHUNK_SIZES.len() - 1)]
    }

    /// Grid vertices per side, including the border ring
    pub fn vertices_per_line(&self) -> usize {
        self.resolution() + 1 + NUM_BORDER_VERTICES
    }

    /// Side length of a chunk in world units
    pub fn mesh_world_size(&self) -> f32 {
        self.resolution() as f32 * self.scale
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size_index >= SUPPORTED_CHUNK_SIZES.len() {
            return Err(Error::Config(format!(
                "chunk_size_index {} out of range (0..{})",
                self.chunk_size_index,
                SUPPORTED_CHUNK_SIZES.len()
            )));
        }
        if !(self.scale > 0.0 && self.scale.is_finite()) {
            return Err(Error::Config(format!("mesh scale must be positive, got {}", self.scale)));
        }
        Ok(())
    }
}
