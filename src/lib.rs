//! Terrastream - streaming procedural heightfield terrain
//!
//! Chunks of noise-generated terrain are created, meshed at a distance-based
//! level of detail and hidden or freed as an observer moves. Generation runs
//! off-thread; results are applied on the thread that ticks the
//! [`streaming::ChunkStreamingManager`].

pub mod core;
pub mod math;
pub mod terrain;
pub mod mesh;
pub mod streaming;
