//! Chunk streaming around a moving observer, with async generation and LOD

pub mod task_queue;
pub mod lod;
pub mod config;
pub mod events;
pub mod chunk;
pub mod terrain_chunk;
pub mod water_chunk;
pub mod manager;

pub use task_queue::{TaskQueue, TaskSpawner, WorkerConfig};
pub use lod::{DetailLevel, DetailLevels};
pub use config::{StreamingConfig, WaterSettings, MAX_CHECK_RADIUS};
pub use events::{ChunkEvent, ChunkListener};
pub use chunk::{ChunkBase, ChunkCoord, ChunkEnv, ChunkKey, StreamState, StreamedChunk};
pub use terrain_chunk::{LodSlot, LodSlotState, TerrainChunk};
pub use water_chunk::WaterChunk;
pub use manager::{ChunkStreamingManager, ObserverSource};
