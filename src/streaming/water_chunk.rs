//! Flat water plane chunk

use std::sync::Arc;

use super::chunk::{ChunkBase, ChunkCoord, ChunkEnv, StreamState, StreamedChunk};
use super::config::{StreamingConfig, WaterSettings};
use super::events::ChunkEvent;
use crate::mesh::{MeshBuilder, MeshPayload};

/// A full-detail flat plane at the water surface height.
///
/// The mesh is requested on the first update, whether or not the chunk is
/// visible, and is never rebuilt.
pub struct WaterChunk {
    base: ChunkBase,
    config: Arc<StreamingConfig>,
    surface_height: f32,
    mesh_requested: bool,
    mesh: Option<Arc<MeshPayload>>,
}

impl WaterChunk {
    pub fn new(coord: ChunkCoord, config: Arc<StreamingConfig>) -> Self {
        let surface_height = config
            .water
            .as_ref()
            .map(|water| water.surface_height)
            .unwrap_or_else(|| WaterSettings::default().surface_height);
        Self {
            base: ChunkBase::new(coord, config.chunk_world_size(), config.max_view_distance),
            config,
            surface_height,
            mesh_requested: false,
            mesh: None,
        }
    }

    /// World height the mesh should be placed at
    pub fn surface_height(&self) -> f32 {
        self.surface_height
    }

    pub fn mesh(&self) -> Option<&Arc<MeshPayload>> {
        self.mesh.as_ref()
    }

    pub fn on_mesh_received(&mut self, mesh: MeshPayload, env: &mut ChunkEnv<Self>) {
        self.mesh = Some(Arc::new(mesh));
        env.emit(ChunkEvent::Loaded(self.base.coord()));
    }

    fn request_mesh(&mut self, env: &mut ChunkEnv<Self>) {
        self.mesh_requested = true;
        let config = Arc::clone(&self.config);
        let key = self.base.key();

        env.tasks().submit(
            move || MeshBuilder::new(&config.mesh, 1).build_flat(),
            move |state: &mut StreamState<WaterChunk>, mesh| {
                state.apply(key, |chunk, env| chunk.on_mesh_received(mesh, env));
            },
        );
    }
}

impl StreamedChunk for WaterChunk {
    fn base(&self) -> &ChunkBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ChunkBase {
        &mut self.base
    }

    fn load(&mut self, _env: &mut ChunkEnv<Self>) {}

    fn update_step(&mut self, env: &mut ChunkEnv<Self>) {
        if !self.mesh_requested {
            self.request_mesh(env);
        }
    }
}
