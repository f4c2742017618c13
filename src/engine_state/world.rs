//! # World
//!
//! The single surface the host talks to. `World` owns the chunk store, the
//! terrain generator, the mesh scheduler, the water system and the renderer's
//! uploader, and wires them together:
//!
//! * reads and writes go through [`World::get_block`] / [`World::set_block`]
//! * the host moves the focus with [`World::ensure_chunks_around`]
//! * the host calls [`World::advance`] once per frame
//!
//! Edits made through `set_block` are remembered so they can be captured as a
//! [`BlockSnapshot`] and replayed on top of freshly generated terrain.

use std::{collections::BTreeSet, sync::Arc};

use cgmath::Point3;
use log::{debug, info};

use crate::{
    core::{EngineConfig, Result},
    engine_state::{
        rendering::{
            meshing::{MeshContext, MeshScheduler, SchedulerStats},
            MeshUploader,
        },
        voxels::{
            block::{BlockId, BlockRegistry, WATER},
            chunk::{offset, Chunk, ChunkCoord, ChunkDimensions},
            chunk_store::{ChunkStore, SetBlockOptions},
            snapshot::{BlockSnapshot, RestoreReport, SnapshotEntry},
            terrain::TerrainGenerator,
            water::WaterSystem,
        },
    },
};

/// Ticks between periodic stats log lines.
const STATS_LOG_INTERVAL: u64 = 600;

/// A point-in-time summary of the world.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldStats {
    /// Chunks held in memory, generated or not.
    pub chunks: usize,
    pub generated_chunks: usize,
    /// Chunks currently owning GPU meshes.
    pub loaded_chunks: usize,
    pub non_air_blocks: u64,
    pub pending_generation: usize,
    pub pending_meshes: usize,
    pub meshes_in_flight: usize,
    pub pending_water: usize,
    pub edits: usize,
    pub scheduler: SchedulerStats,
}

pub struct World {
    config: EngineConfig,
    registry: Arc<dyn BlockRegistry>,
    store: ChunkStore,
    terrain: TerrainGenerator,
    scheduler: MeshScheduler,
    water: WaterSystem,
    uploader: Box<dyn MeshUploader>,
    /// Cells written through `set_block` or restored from a snapshot.
    edits: BTreeSet<(i32, i32, i32)>,
    focus: Option<ChunkCoord>,
    ticks: u64,
}

impl World {
    /// Creates an empty world. Nothing is generated until the focus is set or
    /// a chunk is touched.
    ///
    /// # Errors
    /// `Error::InvalidConfig` if the configuration fails validation.
    pub fn new(
        config: EngineConfig,
        registry: Arc<dyn BlockRegistry>,
        uploader: Box<dyn MeshUploader>,
    ) -> Result<Self> {
        config.validate()?;
        let dims = ChunkDimensions::from_config(&config.world);
        let context = MeshContext::new(dims, Arc::clone(&registry));
        info!(
            "Creating world: seed {}, chunks {}x{}x{}, view radius {}",
            config.world.seed, dims.width, dims.height, dims.depth, config.world.view_radius
        );

        Ok(World {
            store: ChunkStore::new(dims),
            terrain: TerrainGenerator::new(&config.world),
            scheduler: MeshScheduler::new(&config.scheduler, context),
            water: WaterSystem::new(&config.water),
            config,
            registry,
            uploader,
            edits: BTreeSet::new(),
            focus: None,
            ticks: 0,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn dims(&self) -> ChunkDimensions {
        self.store.dims()
    }

    /// Read access to the chunk store, for inspection.
    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.store.chunk(coord)
    }

    /// The block at `pos`; air outside the world or in an ungenerated chunk.
    pub fn get_block(&self, pos: Point3<i32>) -> BlockId {
        self.store.get_block(pos)
    }

    /// Whether `pos` lies inside the world's vertical range.
    pub fn is_within_world(&self, pos: Point3<i32>) -> bool {
        self.store.is_within_world(pos)
    }

    /// The water level at `pos`, or `None` if the cell is not water.
    pub fn get_water_level(&self, pos: Point3<i32>) -> Option<u8> {
        self.store.get_water_level(pos)
    }

    /// Writes a block, generating the owning chunk first if needed.
    ///
    /// Water placed without `skip_water_propagation` is source water. Unless
    /// propagation is skipped, a change next to water wakes the water system.
    ///
    /// # Returns
    /// `true` if the cell changed. Writes outside the world return `false`.
    pub fn set_block(&mut self, pos: Point3<i32>, block: BlockId, opts: SetBlockOptions) -> bool {
        if !self.store.is_within_world(pos) {
            return false;
        }
        let coord = self.store.dims().chunk_at(pos.x, pos.z);
        self.generate_chunk(coord);

        let opts = SetBlockOptions {
            water_source: opts.water_source || (block == WATER && !opts.skip_water_propagation),
            ..opts
        };
        let water_before = self.store.water_cell(pos);
        let prev = self.store.set_block(pos, block, &opts);
        let changed = prev != block || self.store.water_cell(pos) != water_before;
        if !changed {
            return false;
        }

        self.edits.insert((pos.x, pos.y, pos.z));
        if !opts.skip_water_propagation && (block == WATER || prev == WATER || self.touches_water(pos)) {
            self.water.enqueue_around(pos);
        }
        true
    }

    fn touches_water(&self, pos: Point3<i32>) -> bool {
        [
            offset(pos, -1, 0, 0),
            offset(pos, 1, 0, 0),
            offset(pos, 0, -1, 0),
            offset(pos, 0, 1, 0),
            offset(pos, 0, 0, -1),
            offset(pos, 0, 0, 1),
        ]
        .into_iter()
        .any(|neighbor| self.store.get_block(neighbor) == WATER)
    }

    /// Generates a chunk synchronously.
    ///
    /// # Returns
    /// `false` if it was already generated.
    pub fn generate_chunk(&mut self, coord: ChunkCoord) -> bool {
        self.scheduler
            .generate_now(&mut self.store, &self.terrain, coord)
    }

    /// The designated spawn column and its surface height.
    pub fn spawn_point(&self) -> Point3<i32> {
        self.terrain.spawn_point()
    }

    /// Moves the streaming focus to the world column `(focus_x, focus_z)`.
    ///
    /// Every chunk within the view radius (a square, in chunks) is wanted:
    /// ungenerated ones are queued for generation and ones that lost their
    /// meshes are dirtied so they remesh. Chunks outside the radius release
    /// their GPU meshes but keep their blocks.
    pub fn ensure_chunks_around(&mut self, focus_x: f64, focus_z: f64) {
        let dims = self.store.dims();
        let center = dims.chunk_at(focus_x.floor() as i32, focus_z.floor() as i32);
        let radius = self.config.world.view_radius;

        let mut released = Vec::new();
        for chunk in self.store.chunks_mut() {
            if chunk.should_be_loaded && chunk.coord.distance(center) > i64::from(radius) {
                chunk.should_be_loaded = false;
                released.extend(chunk.take_meshes());
            }
        }
        if !released.is_empty() {
            debug!("Releasing {} meshes outside the view radius", released.len());
        }
        for handle in released {
            self.uploader.dispose(handle);
        }

        for dz in -radius..=radius {
            for dx in -radius..=radius {
                let coord = center.offset(dx, dz);
                let chunk = self.store.chunk_or_create(coord);
                let entering = !chunk.should_be_loaded;
                let (generated, loaded) = (chunk.generated, chunk.loaded);
                chunk.should_be_loaded = true;

                if !generated {
                    self.scheduler.queue_generation(&mut self.store, coord);
                    continue;
                }
                if entering && !loaded {
                    self.store.mark_dirty(coord);
                }
                self.scheduler.queue_mesh(&mut self.store, coord);
            }
        }

        if self.focus != Some(center) {
            self.focus = Some(center);
            self.scheduler.reprioritize(center);
        }
    }

    /// Runs one frame of background work: generation, mesh dispatch, worker
    /// collection, mesh upload and water relaxation, each under its budget.
    pub fn advance(&mut self) {
        self.scheduler
            .tick(&mut self.store, &self.terrain, self.uploader.as_mut());
        self.water.update(&mut self.store);
        if let Some(focus) = self.focus {
            self.scheduler.reprioritize(focus);
        }

        self.ticks += 1;
        if self.ticks % STATS_LOG_INTERVAL == 0 {
            let stats = self.stats();
            info!(
                "tick {}: {} chunks generated, {} loaded, {} meshes applied, {} stale, last mesh {:.2} ms",
                self.ticks,
                stats.generated_chunks,
                stats.loaded_chunks,
                stats.scheduler.results_applied,
                stats.scheduler.stale_results,
                stats.scheduler.last_mesh_ms
            );
        }
    }

    /// No generation, meshing or water work is outstanding.
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle() && self.water.pending() == 0
    }

    /// Advances until idle or until `max_ticks` ticks have run.
    ///
    /// # Returns
    /// `true` if the world became idle.
    pub fn settle(&mut self, max_ticks: usize) -> bool {
        for _ in 0..max_ticks {
            if self.is_idle() {
                return true;
            }
            self.advance();
        }
        self.is_idle()
    }

    /// Runs the water system to its fixpoint, ignoring the per-tick budget.
    pub fn drain_water(&mut self) -> usize {
        self.water.drain(&mut self.store)
    }

    pub fn stats(&self) -> WorldStats {
        let (mut generated_chunks, mut loaded_chunks) = (0, 0);
        for chunk in self.store.chunks() {
            generated_chunks += chunk.generated as usize;
            loaded_chunks += chunk.loaded as usize;
        }
        WorldStats {
            chunks: self.store.len(),
            generated_chunks,
            loaded_chunks,
            non_air_blocks: self.store.non_air_block_count(),
            pending_generation: self.scheduler.pending_generation(),
            pending_meshes: self.scheduler.pending_meshes(),
            meshes_in_flight: self.scheduler.in_flight(),
            pending_water: self.water.pending(),
            edits: self.edits.len(),
            scheduler: self.scheduler.stats().clone(),
        }
    }

    /// Captures the current contents of every edited cell, ordered by position.
    pub fn snapshot(&self) -> BlockSnapshot {
        let entries = self
            .edits
            .iter()
            .map(|&(x, y, z)| {
                let pos = Point3::new(x, y, z);
                SnapshotEntry::new(pos, self.store.get_block(pos), self.store.water_cell(pos))
            })
            .collect();
        BlockSnapshot { entries }
    }

    /// Replays a snapshot on top of the current world.
    ///
    /// Each entry is validated on its own; a bad key, an unknown block, an
    /// out-of-range water level or a position outside the world skips only
    /// that entry. Restored water is re-settled by the water system.
    pub fn restore_snapshot(&mut self, snapshot: &BlockSnapshot) -> RestoreReport {
        let mut report = RestoreReport::default();
        for entry in &snapshot.entries {
            let Some(cell) = entry
                .validate(self.registry.as_ref())
                .filter(|cell| self.store.is_within_world(cell.pos))
            else {
                debug!("Skipping snapshot entry {entry:?}");
                report.skipped += 1;
                continue;
            };

            let coord = self.store.dims().chunk_at(cell.pos.x, cell.pos.z);
            self.generate_chunk(coord);
            let opts = SetBlockOptions {
                water_level: cell.water_level,
                water_source: cell.source,
                skip_water_propagation: true,
            };
            let prev = self.store.set_block(cell.pos, cell.block, &opts);
            self.edits.insert((cell.pos.x, cell.pos.y, cell.pos.z));
            if cell.block == WATER || prev == WATER || self.touches_water(cell.pos) {
                self.water.enqueue_around(cell.pos);
            }
            report.applied += 1;
        }

        if report.skipped > 0 {
            info!(
                "Restored snapshot: {} entries applied, {} skipped",
                report.applied, report.skipped
            );
        }
        report
    }

    pub fn snapshot_json(&self) -> Result<String> {
        self.snapshot().to_json()
    }

    /// Parses and restores a JSON snapshot document.
    ///
    /// Structurally malformed entries are counted as skipped alongside the
    /// entries rejected by [`restore_snapshot`](Self::restore_snapshot).
    ///
    /// # Errors
    /// Only if the document as a whole is not a snapshot.
    pub fn restore_snapshot_json(&mut self, json: &str) -> Result<RestoreReport> {
        let (snapshot, dropped) = BlockSnapshot::from_json_lenient(json)?;
        let mut report = self.restore_snapshot(&snapshot);
        report.skipped += dropped;
        Ok(report)
    }
}
