//! Chunk mesh generation

pub mod settings;
pub mod payload;
pub mod builder;

pub use settings::{MeshSettings, NUM_BORDER_VERTICES, SUPPORTED_CHUNK_SIZES};
pub use payload::{MeshPayload, TerrainVertex, vertex_bytes};
pub use builder::MeshBuilder;
