//! Chunk streaming around a moving observer
//!
//! The manager owns the coordinate to chunk map and everything chunks share.
//! Once per tick it samples the observer, applies finished async work,
//! refreshes collision meshes when the observer moved, and rescans the
//! square window of coordinates around the observer once it has moved far
//! enough since the last scan.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use glam::{IVec2, Vec2};

use super::chunk::{ChunkCoord, ChunkEntry, ChunkEnv, StreamState, StreamedChunk};
use super::config::StreamingConfig;
use super::events::{ChunkEvent, ChunkListener};
use super::task_queue::TaskQueue;
use super::terrain_chunk::TerrainChunk;
use super::water_chunk::WaterChunk;
use crate::core::Result;

/// Supplies the observer's world position (x, z) once per tick
pub trait ObserverSource {
    fn position(&self) -> Vec2;
}

impl<F> ObserverSource for F
where
    F: Fn() -> Vec2,
{
    fn position(&self) -> Vec2 {
        self()
    }
}

type ChunkFactory<T> = Box<dyn FnMut(ChunkCoord) -> T>;

/// Streams chunks of kind `T` in and out around an observer
pub struct ChunkStreamingManager<T: StreamedChunk> {
    observer: Box<dyn ObserverSource>,
    factory: ChunkFactory<T>,
    queue: TaskQueue<StreamState<T>>,
    state: StreamState<T>,
    listeners: Vec<Box<dyn ChunkListener<T>>>,
    /// Events synced into `visible` but not yet handed to listeners
    undelivered: Vec<ChunkEvent>,
    visible: HashSet<ChunkCoord>,
    chunk_world_size: f32,
    check_radius: i32,
    chunk_update_threshold: f32,
    evict_after_scans: Option<u32>,
    last_position: Vec2,
    last_scan_position: Vec2,
    next_id: u64,
}

impl ChunkStreamingManager<TerrainChunk> {
    /// Terrain streaming with the standard chunk factory
    pub fn terrain(config: Arc<StreamingConfig>, observer: impl ObserverSource + 'static) -> Result<Self> {
        let factory_config = Arc::clone(&config);
        Self::initialize(&config, observer, move |coord| {
            TerrainChunk::new(coord, Arc::clone(&factory_config))
        })
    }
}

impl ChunkStreamingManager<WaterChunk> {
    /// Water plane streaming with the standard chunk factory
    pub fn water(config: Arc<StreamingConfig>, observer: impl ObserverSource + 'static) -> Result<Self> {
        let factory_config = Arc::clone(&config);
        Self::initialize(&config, observer, move |coord| {
            WaterChunk::new(coord, Arc::clone(&factory_config))
        })
    }
}

impl<T: StreamedChunk> ChunkStreamingManager<T> {
    /// Validate `config`, then run the first full scan around the
    /// observer's current position.
    pub fn initialize<O, F>(config: &StreamingConfig, observer: O, factory: F) -> Result<Self>
    where
        O: ObserverSource + 'static,
        F: FnMut(ChunkCoord) -> T + 'static,
    {
        config.validate()?;

        let queue = TaskQueue::new(&config.workers)?;
        let position = observer.position();
        let state = StreamState {
            chunks: HashMap::new(),
            env: ChunkEnv::new(position, queue.spawner()),
        };

        let mut manager = Self {
            observer: Box::new(observer),
            factory: Box::new(factory),
            queue,
            state,
            listeners: Vec::new(),
            undelivered: Vec::new(),
            visible: HashSet::new(),
            chunk_world_size: config.chunk_world_size(),
            check_radius: config.check_radius(),
            chunk_update_threshold: config.chunk_update_threshold,
            evict_after_scans: config.evict_after_scans,
            last_position: position,
            last_scan_position: position,
            next_id: 1,
        };

        log::info!(
            "Chunk streaming initialized: chunk size {}, view distance {}, check radius {}",
            manager.chunk_world_size,
            config.max_view_distance,
            manager.check_radius
        );

        manager.update_visible_chunks();
        manager.sync_events();
        Ok(manager)
    }

    /// Register a collaborator to receive chunk events.
    ///
    /// Events from the initial scan are delivered on the first tick, so
    /// listeners added before it see every chunk's first transition.
    pub fn add_listener(&mut self, listener: impl ChunkListener<T> + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Advance one frame. Never blocks on background work.
    ///
    /// Order: sample the observer, apply finished work, refresh collision
    /// meshes if the observer moved, rescan if it moved past the update
    /// threshold, then notify listeners. When eviction is enabled, events
    /// raised so far are delivered before idle chunks are freed.
    pub fn tick(&mut self) {
        let position = self.observer.position();
        self.state.env.set_viewer(position);

        self.queue.drain(&mut self.state);
        self.sync_events();

        if position != self.last_position {
            self.last_position = position;
            self.update_colliders();
            self.sync_events();
        }

        let threshold = self.chunk_update_threshold;
        if position.distance_squared(self.last_scan_position) > threshold * threshold {
            self.last_scan_position = position;
            let window = self.update_visible_chunks();
            self.sync_events();

            if let Some(limit) = self.evict_after_scans {
                // Listeners see a chunk's last transitions while it still exists
                self.dispatch_events();
                self.evict_idle_chunks(&window, limit);
                self.sync_events();
            }
        }

        self.dispatch_events();
    }

    /// Coordinate of the chunk containing `position`
    pub fn coord_at(&self, position: Vec2) -> ChunkCoord {
        (position / self.chunk_world_size).round().as_ivec2()
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&T> {
        self.state.chunk(coord)
    }

    pub fn chunks(&self) -> impl Iterator<Item = (&ChunkCoord, &T)> {
        self.state.chunks.iter().map(|(coord, entry)| (coord, &entry.chunk))
    }

    pub fn chunk_count(&self) -> usize {
        self.state.chunks.len()
    }

    pub fn visible_coords(&self) -> &HashSet<ChunkCoord> {
        &self.visible
    }

    pub fn is_visible(&self, coord: ChunkCoord) -> bool {
        self.visible.contains(&coord)
    }

    /// Observer position sampled on the last tick
    pub fn viewer_position(&self) -> Vec2 {
        self.state.env.viewer()
    }

    /// Half-width of the scanned window, in chunks
    pub fn check_radius(&self) -> i32 {
        self.check_radius
    }

    pub fn chunk_world_size(&self) -> f32 {
        self.chunk_world_size
    }

    /// Background tasks not yet delivered
    pub fn pending_tasks(&self) -> usize {
        self.queue.pending_count()
    }

    fn update_colliders(&mut self) {
        let StreamState { chunks, env } = &mut self.state;
        for coord in &self.visible {
            if let Some(entry) = chunks.get_mut(coord) {
                entry.chunk.update_collider(env);
            }
        }
    }

    /// Full scan of the window around the observer. Returns the scanned
    /// coordinates.
    fn update_visible_chunks(&mut self) -> HashSet<ChunkCoord> {
        let centre = self.coord_at(self.state.env.viewer());
        let radius = self.check_radius;
        let mut window = HashSet::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);
        let mut created = 0usize;

        for y_offset in -radius..=radius {
            for x_offset in -radius..=radius {
                let coord = centre + IVec2::new(x_offset, y_offset);
                window.insert(coord);

                let StreamState { chunks, env } = &mut self.state;
                if let Some(entry) = chunks.get_mut(&coord) {
                    entry.idle_scans = 0;
                    entry.chunk.update(env);
                } else {
                    self.spawn_chunk(coord);
                    created += 1;
                }
            }
        }

        // Chunks that left the window are hidden even if still in view range
        let StreamState { chunks, env } = &mut self.state;
        for coord in self.visible.difference(&window) {
            if let Some(entry) = chunks.get_mut(coord) {
                entry.chunk.base_mut().set_visible(false, env.events_mut());
            }
        }

        log::debug!(
            "Scanned window around {:?}: {} created, {} loaded",
            centre,
            created,
            chunks.len()
        );
        window
    }

    /// Free chunks that have been hidden and outside `window` for more than
    /// `limit` consecutive scans
    fn evict_idle_chunks(&mut self, window: &HashSet<ChunkCoord>, limit: u32) {
        let StreamState { chunks, env } = &mut self.state;
        let before = chunks.len();
        chunks.retain(|coord, entry| {
            if window.contains(coord) || entry.chunk.base().is_visible() {
                return true;
            }
            entry.idle_scans += 1;
            if entry.idle_scans > limit {
                env.emit(ChunkEvent::Evicted(*coord));
                false
            } else {
                true
            }
        });
        let evicted = before - chunks.len();
        if evicted > 0 {
            log::info!("Evicted {} idle chunks ({} remain)", evicted, chunks.len());
        }
    }

    fn spawn_chunk(&mut self, coord: ChunkCoord) {
        let id = self.next_id;
        self.next_id += 1;

        let mut chunk = (self.factory)(coord);
        debug_assert_eq!(chunk.base().coord(), coord, "factory built a chunk for the wrong coordinate");
        chunk.base_mut().assign_id(id);

        let StreamState { chunks, env } = &mut self.state;
        let fresh = ChunkEntry { chunk, idle_scans: 0 };
        let entry = match chunks.entry(coord) {
            Entry::Vacant(vacant) => vacant.insert(fresh),
            Entry::Occupied(mut occupied) => {
                debug_assert!(false, "chunk {:?} inserted twice", coord);
                log::warn!("Replacing existing chunk {:?}", coord);
                occupied.insert(fresh);
                occupied.into_mut()
            }
        };
        log::debug!("Created chunk {:?}", coord);

        entry.chunk.load(env);
        entry.chunk.update(env);
    }

    /// Apply chunk events to the visible set and queue them for listeners
    fn sync_events(&mut self) {
        let events = self.state.env.take_events();
        for event in &events {
            match *event {
                ChunkEvent::VisibilityChanged(coord, true) => {
                    log::debug!("Chunk {:?} shown", coord);
                    self.visible.insert(coord);
                }
                ChunkEvent::VisibilityChanged(coord, false) => {
                    log::debug!("Chunk {:?} hidden", coord);
                    self.visible.remove(&coord);
                }
                ChunkEvent::Evicted(coord) => {
                    self.visible.remove(&coord);
                }
                ChunkEvent::Loaded(_) => {}
            }
        }
        self.undelivered.extend(events);
    }

    /// Hand this tick's events to listeners, in the order they happened
    fn dispatch_events(&mut self) {
        let events = std::mem::take(&mut self.undelivered);
        if events.is_empty() {
            return;
        }
        log::trace!("Dispatching {} chunk events", events.len());

        for listener in &mut self.listeners {
            for event in &events {
                match *event {
                    ChunkEvent::Loaded(coord) => {
                        if let Some(chunk) = self.state.chunk(coord) {
                            listener.chunk_loaded(chunk);
                        }
                    }
                    ChunkEvent::VisibilityChanged(coord, visible) => {
                        if let Some(chunk) = self.state.chunk(coord) {
                            listener.chunk_visibility_changed(chunk, visible);
                        }
                    }
                    ChunkEvent::Evicted(coord) => listener.chunk_evicted(coord),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshSettings;
    use crate::streaming::chunk::ChunkBase;
    use crate::streaming::lod::{DetailLevel, DetailLevels};
    use crate::streaming::task_queue::WorkerConfig;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::sync::{Condvar, Mutex};
    use std::time::{Duration, Instant};

    /// Blocks counter load tasks until opened
    #[derive(Default)]
    struct Gate {
        open: Mutex<bool>,
        cvar: Condvar,
    }

    impl Gate {
        fn wait(&self) {
            let mut open = self.open.lock().unwrap();
            while !*open {
                open = self.cvar.wait(open).unwrap();
            }
        }

        fn open(&self) {
            *self.open.lock().unwrap() = true;
            self.cvar.notify_all();
        }
    }

    /// Minimal chunk that counts how the manager drives it
    struct Counter {
        base: ChunkBase,
        gate: Option<Arc<Gate>>,
        steps: u32,
        collider_checks: u32,
        loads: u32,
    }

    impl StreamedChunk for Counter {
        fn base(&self) -> &ChunkBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ChunkBase {
            &mut self.base
        }

        fn load(&mut self, env: &mut ChunkEnv<Self>) {
            let gate = self.gate.clone();
            let key = self.base.key();
            env.tasks().submit(
                move || {
                    if let Some(gate) = gate {
                        gate.wait();
                    }
                },
                move |state: &mut StreamState<Counter>, _| {
                    state.apply(key, |chunk, env| {
                        chunk.loads += 1;
                        env.emit(ChunkEvent::Loaded(chunk.base.coord()));
                    });
                },
            );
        }

        fn update_step(&mut self, _env: &mut ChunkEnv<Self>) {
            self.steps += 1;
        }

        fn update_collider(&mut self, _env: &mut ChunkEnv<Self>) {
            self.collider_checks += 1;
        }
    }

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<ChunkEvent>>>);

    impl Recorder {
        fn events(&self) -> Vec<ChunkEvent> {
            self.0.borrow().clone()
        }
    }

    impl<T: StreamedChunk> ChunkListener<T> for Recorder {
        fn chunk_loaded(&mut self, chunk: &T) {
            self.0.borrow_mut().push(ChunkEvent::Loaded(chunk.base().coord()));
        }

        fn chunk_visibility_changed(&mut self, chunk: &T, visible: bool) {
            self.0
                .borrow_mut()
                .push(ChunkEvent::VisibilityChanged(chunk.base().coord(), visible));
        }

        fn chunk_evicted(&mut self, coord: ChunkCoord) {
            self.0.borrow_mut().push(ChunkEvent::Evicted(coord));
        }
    }

    fn small_config() -> StreamingConfig {
        StreamingConfig {
            mesh: MeshSettings::with_resolution(48, 1.0).unwrap(),
            detail_levels: DetailLevels::new(vec![
                DetailLevel::new(1, 30.0),
                DetailLevel::new(2, 60.0),
                DetailLevel::new(4, 100.0),
            ]),
            max_view_distance: 100.0,
            ..Default::default()
        }
    }

    fn counting_manager(
        config: &StreamingConfig,
        observer: &Rc<Cell<Vec2>>,
        gate: Option<Arc<Gate>>,
    ) -> ChunkStreamingManager<Counter> {
        let size = config.chunk_world_size();
        let view = config.max_view_distance;
        let observer = Rc::clone(observer);
        ChunkStreamingManager::initialize(config, move || observer.get(), move |coord| Counter {
            base: ChunkBase::new(coord, size, view),
            gate: gate.clone(),
            steps: 0,
            collider_checks: 0,
            loads: 0,
        })
        .unwrap()
    }

    fn settle<T: StreamedChunk>(manager: &mut ChunkStreamingManager<T>) {
        let deadline = Instant::now() + Duration::from_secs(60);
        loop {
            manager.tick();
            if manager.pending_tasks() == 0 {
                break;
            }
            assert!(Instant::now() < deadline, "timed out waiting for chunk tasks");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_scan_covers_three_by_three_window() {
        let config = StreamingConfig::default();
        let observer = Rc::new(Cell::new(Vec2::ZERO));
        let manager = counting_manager(&config, &observer, None);

        assert_eq!(manager.check_radius(), 1);
        assert_eq!(manager.chunk_count(), 9);
        for y in -1..=1 {
            for x in -1..=1 {
                let counter = manager.chunk(IVec2::new(x, y)).unwrap();
                assert_eq!(counter.steps, 1);
            }
        }
        // Every chunk's nearest edge is within 300 of the origin
        assert_eq!(manager.visible_coords().len(), 9);
    }

    #[test]
    fn test_initial_scan_centres_on_observer() {
        let config = StreamingConfig::default();
        let observer = Rc::new(Cell::new(Vec2::new(1000.0, 500.0)));
        let manager = counting_manager(&config, &observer, None);

        assert_eq!(manager.coord_at(Vec2::new(1000.0, 500.0)), IVec2::new(4, 2));
        assert!(manager.chunk(IVec2::new(4, 2)).is_some());
        assert!(manager.chunk(IVec2::new(3, 1)).is_some());
        assert!(manager.chunk(IVec2::ZERO).is_none());
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let config = StreamingConfig {
            max_view_distance: -1.0,
            ..Default::default()
        };
        let result = ChunkStreamingManager::terrain(Arc::new(config), || Vec2::ZERO);
        assert!(result.is_err());
    }

    #[test]
    fn test_rescan_waits_for_update_threshold() {
        let config = StreamingConfig::default();
        let observer = Rc::new(Cell::new(Vec2::ZERO));
        let mut manager = counting_manager(&config, &observer, None);

        observer.set(Vec2::new(10.0, 0.0));
        manager.tick();
        let origin = manager.chunk(IVec2::ZERO).unwrap();
        assert_eq!(origin.steps, 1);
        assert_eq!(origin.collider_checks, 1);

        // Standing still: no collider pass either
        manager.tick();
        assert_eq!(manager.chunk(IVec2::ZERO).unwrap().collider_checks, 1);

        // 30 from the last scan position exceeds 25
        observer.set(Vec2::new(30.0, 0.0));
        manager.tick();
        let origin = manager.chunk(IVec2::ZERO).unwrap();
        assert_eq!(origin.steps, 2);
        assert_eq!(origin.collider_checks, 2);
    }

    #[test]
    fn test_chunks_leaving_window_are_hidden_not_freed() {
        let config = StreamingConfig::default();
        let observer = Rc::new(Cell::new(Vec2::ZERO));
        let mut manager = counting_manager(&config, &observer, None);
        let recorder = Recorder::default();
        manager.add_listener(recorder.clone());

        observer.set(Vec2::new(2400.0, 0.0));
        manager.tick();

        assert_eq!(manager.chunk_count(), 18);
        assert!(!manager.chunk(IVec2::ZERO).unwrap().base().is_visible());
        for coord in manager.visible_coords() {
            assert!((coord.x - 10).abs() <= 1 && coord.y.abs() <= 1, "stale visible {:?}", coord);
        }

        let events = recorder.events();
        assert!(events.contains(&ChunkEvent::VisibilityChanged(IVec2::ZERO, false)));
        assert!(events.contains(&ChunkEvent::VisibilityChanged(IVec2::new(10, 0), true)));
        assert!(!events.iter().any(|e| matches!(e, ChunkEvent::Evicted(_))));
    }

    #[test]
    fn test_visibility_events_exactly_once_per_crossing() {
        let config = StreamingConfig {
            window_padding: 1,
            chunk_update_threshold: 0.0,
            ..small_config()
        };
        let observer = Rc::new(Cell::new(Vec2::new(-40.0, 0.0)));
        let mut manager = counting_manager(&config, &observer, None);
        let recorder = Recorder::default();
        manager.add_listener(recorder.clone());

        // Chunk (2, 0) spans x in [72, 120]: 112 away at x = -40, 72 away at x = 0
        let target = IVec2::new(2, 0);
        assert!(!manager.chunk(target).unwrap().base().is_visible());

        let crossings = 7;
        for i in 0..crossings {
            let x = if i % 2 == 0 { 0.0 } else { -40.0 };
            observer.set(Vec2::new(x, 0.0));
            manager.tick();
            // A tick without movement never re-announces anything
            manager.tick();
        }

        let events = recorder.events();
        let target_changes: Vec<bool> = events
            .iter()
            .filter_map(|e| match *e {
                ChunkEvent::VisibilityChanged(coord, visible) if coord == target => Some(visible),
                _ => None,
            })
            .collect();
        assert_eq!(target_changes.len(), crossings);
        for (i, visible) in target_changes.iter().enumerate() {
            assert_eq!(*visible, i % 2 == 0);
        }

        // No chunk ever reports the same state twice in a row
        let mut last: HashMap<ChunkCoord, bool> = HashMap::new();
        for event in events {
            if let ChunkEvent::VisibilityChanged(coord, visible) = event {
                assert_ne!(last.insert(coord, visible), Some(visible), "repeat for {:?}", coord);
            }
        }
    }

    #[test]
    fn test_eviction_drops_stale_results() {
        let config = StreamingConfig {
            evict_after_scans: Some(0),
            ..small_config()
        };
        let gate = Arc::new(Gate::default());
        let observer = Rc::new(Cell::new(Vec2::ZERO));
        let mut manager = counting_manager(&config, &observer, Some(Arc::clone(&gate)));
        let recorder = Recorder::default();
        manager.add_listener(recorder.clone());

        let radius = manager.check_radius();
        let window = ((2 * radius + 1) * (2 * radius + 1)) as usize;
        assert_eq!(manager.chunk_count(), window);

        // Leave before any load finishes
        observer.set(Vec2::new(4800.0, 0.0));
        manager.tick();
        assert_eq!(manager.chunk_count(), window);
        assert!(manager.chunk(IVec2::ZERO).is_none());
        let evicted = recorder
            .events()
            .iter()
            .filter(|e| matches!(e, ChunkEvent::Evicted(_)))
            .count();
        assert_eq!(evicted, window);

        // Come back; the first generation's results must not reach the new chunks
        gate.open();
        observer.set(Vec2::ZERO);
        settle(&mut manager);

        for y in -radius..=radius {
            for x in -radius..=radius {
                let coord = IVec2::new(x, y);
                assert_eq!(manager.chunk(coord).unwrap().loads, 1, "chunk {:?}", coord);
                let loaded = recorder
                    .events()
                    .iter()
                    .filter(|e| **e == ChunkEvent::Loaded(coord))
                    .count();
                assert_eq!(loaded, 1, "chunk {:?}", coord);
            }
        }
    }

    #[test]
    fn test_evicted_chunks_are_hidden_first() {
        let config = StreamingConfig {
            evict_after_scans: Some(0),
            ..small_config()
        };
        let observer = Rc::new(Cell::new(Vec2::ZERO));
        let mut manager = counting_manager(&config, &observer, None);
        let recorder = Recorder::default();
        manager.add_listener(recorder.clone());
        manager.tick();
        assert!(recorder.events().contains(&ChunkEvent::VisibilityChanged(IVec2::ZERO, true)));

        // Shown, hidden and freed within a single scan
        observer.set(Vec2::new(4800.0, 0.0));
        manager.tick();
        assert!(manager.chunk(IVec2::ZERO).is_none());

        let origin: Vec<ChunkEvent> = recorder
            .events()
            .into_iter()
            .filter(|e| e.coord() == IVec2::ZERO && !matches!(e, ChunkEvent::Loaded(_)))
            .collect();
        assert_eq!(
            origin,
            vec![
                ChunkEvent::VisibilityChanged(IVec2::ZERO, true),
                ChunkEvent::VisibilityChanged(IVec2::ZERO, false),
                ChunkEvent::Evicted(IVec2::ZERO),
            ]
        );

        // Every chunk a listener saw shown was reported hidden before eviction
        let mut shown: HashSet<ChunkCoord> = HashSet::new();
        for event in recorder.events() {
            match event {
                ChunkEvent::VisibilityChanged(coord, true) => {
                    shown.insert(coord);
                }
                ChunkEvent::VisibilityChanged(coord, false) => {
                    shown.remove(&coord);
                }
                ChunkEvent::Evicted(coord) => assert!(!shown.contains(&coord), "{:?} never hidden", coord),
                ChunkEvent::Loaded(_) => {}
            }
        }
    }

    #[test]
    fn test_stationary_observer_gets_collider() {
        let config = Arc::new(StreamingConfig {
            collider_lod_index: 1,
            ..small_config()
        });
        let mut manager = ChunkStreamingManager::terrain(config, || Vec2::ZERO).unwrap();
        settle(&mut manager);

        let origin = manager.chunk(IVec2::ZERO).unwrap();
        assert_eq!(origin.current_lod(), Some(0));
        assert!(origin.lod_slots()[1].has_mesh());
        assert!(origin.has_set_collider());
    }

    #[test]
    fn test_terrain_streaming_end_to_end() {
        let config = Arc::new(StreamingConfig {
            workers: WorkerConfig::Pooled { threads: 2 },
            ..small_config()
        });
        let observer = Rc::new(Cell::new(Vec2::ZERO));
        let position = Rc::clone(&observer);
        let mut manager = ChunkStreamingManager::terrain(Arc::clone(&config), move || position.get()).unwrap();

        struct HeightCheck(Rc<Cell<usize>>);
        impl ChunkListener<TerrainChunk> for HeightCheck {
            fn chunk_loaded(&mut self, chunk: &TerrainChunk) {
                assert!(chunk.height_at(1, 1).is_some());
                self.0.set(self.0.get() + 1);
            }
        }
        let loaded = Rc::new(Cell::new(0));
        manager.add_listener(HeightCheck(Rc::clone(&loaded)));

        settle(&mut manager);
        assert_eq!(manager.chunk_count(), 25);
        assert_eq!(loaded.get(), 25);

        for coord in manager.visible_coords() {
            let chunk = manager.chunk(*coord).unwrap();
            assert!(chunk.active_mesh().is_some(), "visible chunk {:?} has no mesh", coord);
        }

        let origin = manager.chunk(IVec2::ZERO).unwrap();
        assert_eq!(origin.current_lod(), Some(0));
        assert!(origin.has_set_collider());

        // 72 from the edge: coarsest level
        assert_eq!(manager.chunk(IVec2::new(2, 0)).unwrap().current_lod(), Some(2));
        // Corner chunk is ~102 from its nearest edge: hidden, never meshed
        let corner = manager.chunk(IVec2::new(2, 2)).unwrap();
        assert!(!corner.base().is_visible());
        assert!(corner.active_mesh().is_none());

        observer.set(Vec2::new(200.0, 0.0));
        settle(&mut manager);
        assert!(manager.chunk(IVec2::new(6, 0)).is_some());
        assert!(manager.is_visible(IVec2::new(5, 0)));
        assert!(!manager.is_visible(IVec2::new(-1, 0)));
    }

    #[test]
    fn test_water_streaming_meshes_every_chunk() {
        let config = Arc::new(StreamingConfig {
            water: Some(Default::default()),
            ..small_config()
        });
        let mut manager = ChunkStreamingManager::water(config, || Vec2::ZERO).unwrap();
        settle(&mut manager);

        assert_eq!(manager.chunk_count(), 25);
        for (_, chunk) in manager.chunks() {
            assert!(chunk.mesh().is_some());
            assert_eq!(chunk.surface_height(), 2.0);
        }
    }
}
