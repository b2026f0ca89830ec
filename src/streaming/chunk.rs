//! Shared chunk state and the trait the streaming manager drives
//!
//! Chunks never hold references to the manager. Everything they need while
//! updating (observer position, a task spawner, the event buffer) is passed
//! in as a [`ChunkEnv`]. Async results come back through
//! [`StreamState::apply`], which looks the chunk up again by key so results
//! for chunks that have since been freed are simply dropped.

use std::collections::HashMap;

use glam::{IVec2, Vec2};

use super::events::ChunkEvent;
use super::task_queue::TaskSpawner;
use crate::math::Aabb;

/// Integer chunk grid coordinate
pub type ChunkCoord = IVec2;

/// Identifies one chunk instance; a chunk re-created at the same
/// coordinate gets a new id
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkKey {
    pub coord: ChunkCoord,
    pub id: u64,
}

/// Per-tick context handed to chunks by the streaming manager
pub struct ChunkEnv<T> {
    viewer: Vec2,
    tasks: TaskSpawner<StreamState<T>>,
    events: Vec<ChunkEvent>,
}

impl<T> ChunkEnv<T> {
    pub(crate) fn new(viewer: Vec2, tasks: TaskSpawner<StreamState<T>>) -> Self {
        Self {
            viewer,
            tasks,
            events: Vec::new(),
        }
    }

    /// Observer position sampled this tick
    pub fn viewer(&self) -> Vec2 {
        self.viewer
    }

    pub(crate) fn set_viewer(&mut self, viewer: Vec2) {
        self.viewer = viewer;
    }

    /// Spawner for off-thread work whose results are applied to the chunk map
    pub fn tasks(&self) -> &TaskSpawner<StreamState<T>> {
        &self.tasks
    }

    pub fn emit(&mut self, event: ChunkEvent) {
        self.events.push(event);
    }

    pub(crate) fn events_mut(&mut self) -> &mut Vec<ChunkEvent> {
        &mut self.events
    }

    pub(crate) fn take_events(&mut self) -> Vec<ChunkEvent> {
        std::mem::take(&mut self.events)
    }
}

pub(crate) struct ChunkEntry<T> {
    pub(crate) chunk: T,
    /// Consecutive full scans this chunk spent hidden and outside the window
    pub(crate) idle_scans: u32,
}

/// Chunk map plus environment; the context async results are applied to
pub struct StreamState<T> {
    pub(crate) chunks: HashMap<ChunkCoord, ChunkEntry<T>>,
    pub(crate) env: ChunkEnv<T>,
}

impl<T: StreamedChunk> StreamState<T> {
    /// Run `f` on the chunk identified by `key`, if it still exists.
    ///
    /// Returns `false` (and does nothing) when the chunk was freed or
    /// replaced since the work was submitted.
    pub fn apply<F>(&mut self, key: ChunkKey, f: F) -> bool
    where
        F: FnOnce(&mut T, &mut ChunkEnv<T>),
    {
        let Self { chunks, env } = self;
        match chunks.get_mut(&key.coord) {
            Some(entry) if entry.chunk.base().id() == key.id => {
                f(&mut entry.chunk, env);
                true
            }
            _ => {
                log::trace!("Dropping result for freed chunk {:?}", key.coord);
                false
            }
        }
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&T> {
        self.chunks.get(&coord).map(|entry| &entry.chunk)
    }
}

/// Placement and visibility shared by every chunk kind
#[derive(Clone, Debug)]
pub struct ChunkBase {
    coord: ChunkCoord,
    id: u64,
    position: Vec2,
    bounds: Aabb,
    max_view_distance: f32,
    visible: bool,
}

impl ChunkBase {
    /// New hidden chunk at `coord`
    pub fn new(coord: ChunkCoord, chunk_world_size: f32, max_view_distance: f32) -> Self {
        let position = coord.as_vec2() * chunk_world_size;
        Self {
            coord,
            id: 0,
            position,
            bounds: Aabb::from_center_size(position, Vec2::splat(chunk_world_size)),
            max_view_distance,
            visible: false,
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: u64) {
        self.id = id;
    }

    pub fn key(&self) -> ChunkKey {
        ChunkKey {
            coord: self.coord,
            id: self.id,
        }
    }

    /// World-space centre of the chunk
    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Distance from `point` to the nearest edge of the chunk (zero inside)
    pub fn edge_distance(&self, point: Vec2) -> f32 {
        self.bounds.distance(point)
    }

    pub fn sqr_edge_distance(&self, point: Vec2) -> f32 {
        self.bounds.sqr_distance(point)
    }

    pub fn is_within_view(&self, viewer: Vec2) -> bool {
        self.edge_distance(viewer) <= self.max_view_distance
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Set visibility, emitting an event only when it actually changes
    pub fn set_visible(&mut self, visible: bool, events: &mut Vec<ChunkEvent>) {
        if self.visible != visible {
            self.visible = visible;
            events.push(ChunkEvent::VisibilityChanged(self.coord, visible));
        }
    }
}

/// A chunk kind the streaming manager can create, load and update
pub trait StreamedChunk: Sized + 'static {
    fn base(&self) -> &ChunkBase;

    fn base_mut(&mut self) -> &mut ChunkBase;

    /// Start async loading. Called once, right after the chunk is inserted.
    fn load(&mut self, env: &mut ChunkEnv<Self>);

    /// Kind-specific work after visibility was re-evaluated
    fn update_step(&mut self, env: &mut ChunkEnv<Self>);

    /// Collision mesh maintenance, run every tick the observer moves
    fn update_collider(&mut self, _env: &mut ChunkEnv<Self>) {}

    /// Re-evaluate visibility from the observer's edge distance, then run
    /// [`StreamedChunk::update_step`]
    fn update(&mut self, env: &mut ChunkEnv<Self>) {
        let visible = self.base().is_within_view(env.viewer());
        self.base_mut().set_visible(visible, env.events_mut());
        self.update_step(env);
    }
}
