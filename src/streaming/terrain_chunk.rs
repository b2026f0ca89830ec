//! Heightfield terrain chunk with per-LOD meshes and a collision mesh

use std::sync::Arc;

use glam::Vec2;

use super::chunk::{ChunkBase, ChunkCoord, ChunkEnv, StreamState, StreamedChunk};
use super::config::StreamingConfig;
use super::events::ChunkEvent;
use crate::mesh::{MeshBuilder, MeshPayload};
use crate::terrain::HeightGrid;

/// Progress of one LOD mesh. Only ever moves forward.
#[derive(Clone, Debug, Default)]
pub enum LodSlotState {
    #[default]
    Unrequested,
    Requested,
    Received(Arc<MeshPayload>),
}

/// Mesh slot for one configured detail level
#[derive(Clone, Debug)]
pub struct LodSlot {
    lod: u32,
    state: LodSlotState,
}

impl LodSlot {
    pub fn new(lod: u32) -> Self {
        Self {
            lod,
            state: LodSlotState::Unrequested,
        }
    }

    /// Skip factor this slot's mesh is built with
    pub fn lod(&self) -> u32 {
        self.lod
    }

    pub fn state(&self) -> &LodSlotState {
        &self.state
    }

    pub fn has_requested(&self) -> bool {
        !matches!(self.state, LodSlotState::Unrequested)
    }

    pub fn has_mesh(&self) -> bool {
        matches!(self.state, LodSlotState::Received(_))
    }

    pub fn mesh(&self) -> Option<&Arc<MeshPayload>> {
        match &self.state {
            LodSlotState::Received(mesh) => Some(mesh),
            _ => None,
        }
    }

    fn mark_requested(&mut self) {
        debug_assert!(!self.has_requested(), "LOD slot (skip {}) requested twice", self.lod);
        self.state = LodSlotState::Requested;
    }

    fn receive(&mut self, mesh: Arc<MeshPayload>) {
        debug_assert!(
            matches!(self.state, LodSlotState::Requested),
            "LOD slot (skip {}) received a mesh it never requested",
            self.lod
        );
        self.state = LodSlotState::Received(mesh);
    }
}

/// One tile of procedurally generated terrain.
///
/// Lifecycle: created hidden, height grid requested on [`StreamedChunk::load`];
/// once it arrives the chunk emits [`ChunkEvent::Loaded`] and starts
/// requesting meshes for whichever detail level its edge distance selects.
pub struct TerrainChunk {
    base: ChunkBase,
    config: Arc<StreamingConfig>,
    sample_center: Vec2,
    height_grid: Option<Arc<HeightGrid>>,
    lod_slots: Vec<LodSlot>,
    current_lod: Option<usize>,
    active_mesh: Option<Arc<MeshPayload>>,
    collision_mesh: Option<Arc<MeshPayload>>,
    has_set_collider: bool,
}

impl TerrainChunk {
    pub fn new(coord: ChunkCoord, config: Arc<StreamingConfig>) -> Self {
        let base = ChunkBase::new(coord, config.chunk_world_size(), config.max_view_distance);
        let sample_center = base.position() / config.mesh.scale;
        let lod_slots = config
            .detail_levels
            .levels()
            .iter()
            .map(|level| LodSlot::new(level.lod))
            .collect();

        Self {
            base,
            config,
            sample_center,
            height_grid: None,
            lod_slots,
            current_lod: None,
            active_mesh: None,
            collision_mesh: None,
            has_set_collider: false,
        }
    }

    /// Chunk position in noise space
    pub fn sample_center(&self) -> Vec2 {
        self.sample_center
    }

    pub fn height_grid(&self) -> Option<&HeightGrid> {
        self.height_grid.as_deref()
    }

    pub fn is_height_ready(&self) -> bool {
        self.height_grid.is_some()
    }

    /// Display height at grid cell `(x, y)`, with the height curve and
    /// multiplier applied. `None` until height data arrives or when out of range.
    pub fn height_at(&self, x: usize, y: usize) -> Option<f32> {
        let raw = self.height_grid.as_ref()?.try_get(x, y)?;
        Some(self.config.height_map.height_from_sample(raw))
    }

    pub fn lod_slots(&self) -> &[LodSlot] {
        &self.lod_slots
    }

    /// Index of the detail level currently displayed
    pub fn current_lod(&self) -> Option<usize> {
        self.current_lod
    }

    /// Mesh a renderer should display
    pub fn active_mesh(&self) -> Option<&Arc<MeshPayload>> {
        self.active_mesh.as_ref()
    }

    pub fn collision_mesh(&self) -> Option<&Arc<MeshPayload>> {
        self.collision_mesh.as_ref()
    }

    /// Whether the collision mesh has been finalized; it never changes after
    pub fn has_set_collider(&self) -> bool {
        self.has_set_collider
    }

    pub fn on_height_grid_received(&mut self, grid: HeightGrid, env: &mut ChunkEnv<Self>) {
        log::trace!("Height grid ready for chunk {:?}", self.base.coord());
        self.height_grid = Some(Arc::new(grid));
        env.emit(ChunkEvent::Loaded(self.base.coord()));
        self.update(env);
    }

    pub fn on_mesh_received(&mut self, lod_index: usize, mesh: MeshPayload, env: &mut ChunkEnv<Self>) {
        let Some(slot) = self.lod_slots.get_mut(lod_index) else {
            return;
        };
        slot.receive(Arc::new(mesh));

        self.update(env);
        if lod_index == self.config.collider_lod_index {
            self.update_collider(env);
        }
    }

    fn request_mesh(&mut self, lod_index: usize, env: &mut ChunkEnv<Self>) {
        let Some(grid) = self.height_grid.clone() else {
            return;
        };
        let slot = &mut self.lod_slots[lod_index];
        slot.mark_requested();

        let skip = slot.lod();
        let config = Arc::clone(&self.config);
        let key = self.base.key();
        log::trace!("Requesting LOD {} mesh for chunk {:?}", skip, key.coord);

        env.tasks().submit(
            move || {
                MeshBuilder::new(&config.mesh, skip)
                    .build_with_heights(&grid, |raw| config.height_map.height_from_sample(raw))
            },
            move |state: &mut StreamState<TerrainChunk>, mesh| {
                state.apply(key, |chunk, env| chunk.on_mesh_received(lod_index, mesh, env));
            },
        );
    }
}

impl StreamedChunk for TerrainChunk {
    fn base(&self) -> &ChunkBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ChunkBase {
        &mut self.base
    }

    fn load(&mut self, env: &mut ChunkEnv<Self>) {
        let vertices_per_line = self.config.mesh.vertices_per_line();
        let noise = self.config.height_map.noise.clone();
        let sample_center = self.sample_center;
        let key = self.base.key();

        env.tasks().submit(
            move || HeightGrid::generate(vertices_per_line, vertices_per_line, &noise, sample_center),
            move |state: &mut StreamState<TerrainChunk>, grid| {
                state.apply(key, |chunk, env| chunk.on_height_grid_received(grid, env));
            },
        );
    }

    fn update_step(&mut self, env: &mut ChunkEnv<Self>) {
        if !self.base.is_visible() || self.height_grid.is_none() {
            return;
        }

        let distance = self.base.edge_distance(env.viewer());
        let lod_index = self.config.detail_levels.lod_index(distance);
        if self.current_lod != Some(lod_index) {
            match self.lod_slots[lod_index].state() {
                LodSlotState::Received(mesh) => {
                    self.active_mesh = Some(Arc::clone(mesh));
                    self.current_lod = Some(lod_index);
                }
                LodSlotState::Unrequested => self.request_mesh(lod_index, env),
                LodSlotState::Requested => {}
            }
        }

        // A stationary observer still needs its collider
        if !self.has_set_collider {
            self.update_collider(env);
        }
    }

    fn update_collider(&mut self, env: &mut ChunkEnv<Self>) {
        if self.has_set_collider || self.height_grid.is_none() {
            return;
        }
        let index = self.config.collider_lod_index;
        let Some(level) = self.config.collider_level().copied() else {
            return;
        };

        let sqr_distance = self.base.sqr_edge_distance(env.viewer());

        if !self.lod_slots[index].has_requested() && sqr_distance < level.sqr_threshold() {
            self.request_mesh(index, env);
        }

        let finalize = self.config.collider_update_threshold;
        if sqr_distance < finalize * finalize {
            if let Some(mesh) = self.lod_slots[index].mesh() {
                self.collision_mesh = Some(Arc::clone(mesh));
                self.has_set_collider = true;
                log::debug!("Collision mesh set for chunk {:?}", self.base.coord());
            }
        }
    }
}
