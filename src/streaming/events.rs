//! Chunk lifecycle notifications for external collaborators

use super::chunk::ChunkCoord;

/// Something that happened to a chunk during a tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkEvent {
    /// Height data (or the flat mesh, for water) is available; fired once per chunk
    Loaded(ChunkCoord),
    /// The chunk crossed the view boundary; fired once per transition
    VisibilityChanged(ChunkCoord, bool),
    /// The chunk was freed; per-chunk content should be released
    Evicted(ChunkCoord),
}

impl ChunkEvent {
    pub fn coord(&self) -> ChunkCoord {
        match *self {
            ChunkEvent::Loaded(coord) => coord,
            ChunkEvent::VisibilityChanged(coord, _) => coord,
            ChunkEvent::Evicted(coord) => coord,
        }
    }
}

/// Receives chunk events from a [`ChunkStreamingManager`](super::ChunkStreamingManager).
///
/// Called on the ticking thread, after the work that produced the event.
pub trait ChunkListener<T> {
    fn chunk_loaded(&mut self, _chunk: &T) {}

    fn chunk_visibility_changed(&mut self, _chunk: &T, _visible: bool) {}

    /// The chunk is already gone; only its coordinate remains
    fn chunk_evicted(&mut self, _coord: ChunkCoord) {}
}
