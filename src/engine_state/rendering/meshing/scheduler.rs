//! # Mesh Scheduler
//!
//! Moves chunks through generation, meshing and upload a little at a time so a
//! frame never stalls on a large batch of work.
//!
//! ## Queues
//!
//! - generation: chunks wanted but not generated yet
//! - mesh requests: generated, wanted, dirty chunks; each at most once
//! - apply: finished meshes waiting to be uploaded
//!
//! Each queue is drained under its own millisecond budget, always making
//! progress on at least one item per tick. Dispatch is additionally capped by a
//! job count.
//!
//! ## Job Identity
//!
//! Every dispatched job gets a fresh id which the chunk records. A result whose
//! id no longer matches its chunk, or whose chunk left the streaming radius, is
//! dropped without upload. A chunk edited while its job is out is remeshed as
//! soon as the result lands.
//!
//! ## Worker Failure
//!
//! If the workers cannot be spawned or one of them disconnects, the scheduler
//! switches to meshing on the calling thread for good. Jobs lost with the pool
//! are queued again.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use log::{debug, info, warn};
use web_time::Instant;

use super::MeshContext;
use crate::{
    core::SchedulerConfig,
    engine_state::{
        rendering::{
            tasks::{MeshJob, MeshResult},
            MeshUploader,
        },
        task_management::{task::Task, PublishError, TaskManager, WorkQueue},
        voxels::{
            block::RenderGroup,
            chunk::ChunkCoord,
            chunk_store::ChunkStore,
            terrain::TerrainGenerator,
        },
    },
};

/// Counters describing the scheduler's work so far.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SchedulerStats {
    pub chunks_generated: u64,
    pub jobs_dispatched: u64,
    pub results_applied: u64,
    /// Results dropped because their chunk moved on.
    pub stale_results: u64,
    /// Mesher time of the most recently applied result.
    pub last_mesh_ms: f64,
    /// Submission-to-completion time of the most recently applied result.
    pub last_latency_ms: f64,
    /// Meshing runs on the calling thread.
    pub synchronous: bool,
}

pub struct MeshScheduler {
    config: SchedulerConfig,
    context: Arc<MeshContext>,
    generation: WorkQueue<ChunkCoord>,
    mesh_requests: WorkQueue<ChunkCoord>,
    apply: WorkQueue<MeshResult>,
    workers: Option<TaskManager<MeshJob>>,
    /// Outstanding jobs by id.
    in_flight: HashMap<u64, ChunkCoord>,
    next_job_id: u64,
    stats: SchedulerStats,
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

impl MeshScheduler {
    /// Creates a scheduler and, if `config.worker_count` is non-zero, its
    /// worker pool. A pool that fails to start leaves the scheduler synchronous.
    pub fn new(config: &SchedulerConfig, context: Arc<MeshContext>) -> Self {
        let workers = if config.worker_count == 0 {
            info!("Meshing on the calling thread");
            None
        } else {
            match TaskManager::new(config.worker_count, "mesh-worker") {
                Ok(workers) => Some(workers),
                Err(err) => {
                    warn!("{err}; meshing on the calling thread");
                    None
                }
            }
        };

        MeshScheduler {
            config: config.clone(),
            context,
            generation: WorkQueue::new(),
            mesh_requests: WorkQueue::new(),
            apply: WorkQueue::new(),
            stats: SchedulerStats {
                synchronous: workers.is_none(),
                ..SchedulerStats::default()
            },
            workers,
            in_flight: HashMap::new(),
            next_job_id: 1,
        }
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    pub fn pending_generation(&self) -> usize {
        self.generation.len()
    }

    pub fn pending_meshes(&self) -> usize {
        self.mesh_requests.len()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Nothing is queued, in flight or waiting for upload.
    pub fn is_idle(&self) -> bool {
        self.generation.is_empty()
            && self.mesh_requests.is_empty()
            && self.apply.is_empty()
            && self.in_flight.is_empty()
    }

    /// Queues a chunk for generation unless it is generated or already queued.
    pub fn queue_generation(&mut self, store: &mut ChunkStore, coord: ChunkCoord) -> bool {
        let chunk = store.chunk_or_create(coord);
        if chunk.generated || chunk.gen_queued {
            return false;
        }
        chunk.gen_queued = true;
        self.generation.push(coord);
        true
    }

    /// Queues a chunk for meshing if it is generated, wanted, dirty, and not
    /// already queued or in flight.
    pub fn queue_mesh(&mut self, store: &mut ChunkStore, coord: ChunkCoord) -> bool {
        let Some(chunk) = store.chunk_mut(coord) else {
            return false;
        };
        if !chunk.generated
            || !chunk.should_be_loaded
            || !chunk.dirty
            || chunk.mesh_queued
            || chunk.mesh_in_flight
        {
            return false;
        }
        chunk.mesh_queued = true;
        self.mesh_requests.push(coord);
        true
    }

    /// Queues every chunk that became dirty since the last call.
    pub fn collect_dirty(&mut self, store: &mut ChunkStore) {
        for coord in store.take_dirtied() {
            self.queue_mesh(store, coord);
        }
    }

    /// Orders pending generation and mesh work nearest-first around `focus`.
    pub fn reprioritize(&mut self, focus: ChunkCoord) {
        self.generation.sort_by_key(|coord| coord.distance_squared(focus));
        self.mesh_requests.sort_by_key(|coord| coord.distance_squared(focus));
    }

    /// Generates queued chunks until the generation budget is spent.
    ///
    /// Chunks that were generated meanwhile or left the streaming radius are
    /// dropped from the queue.
    ///
    /// # Returns
    /// Number of chunks generated.
    pub fn run_generation(&mut self, store: &mut ChunkStore, terrain: &TerrainGenerator) -> usize {
        let started = Instant::now();
        let mut generated = 0;
        while let Some(coord) = self.generation.pop() {
            let Some(chunk) = store.chunk_mut(coord) else {
                continue;
            };
            chunk.gen_queued = false;
            if chunk.generated || !chunk.should_be_loaded {
                continue;
            }
            if self.generate_now(store, terrain, coord) {
                generated += 1;
            }
            if elapsed_ms(started) >= self.config.generation_budget_ms {
                break;
            }
        }
        generated
    }

    /// Generates one chunk immediately, outside any budget.
    ///
    /// A queued entry for the same chunk is skipped when it comes up.
    pub fn generate_now(&mut self, store: &mut ChunkStore, terrain: &TerrainGenerator, coord: ChunkCoord) -> bool {
        if !terrain.generate(store, coord) {
            return false;
        }
        self.stats.chunks_generated += 1;
        true
    }

    /// Hands queued mesh requests to the workers, or meshes them inline.
    ///
    /// # Returns
    /// Number of jobs dispatched.
    pub fn dispatch(&mut self, store: &mut ChunkStore) -> usize {
        let started = Instant::now();
        let cap = self.config.max_dispatch_per_tick.max(1);
        let mut dispatched = 0;

        while dispatched < cap {
            if self.workers.as_ref().is_some_and(|workers| !workers.has_capacity()) {
                break;
            }
            let Some(coord) = self.mesh_requests.pop() else {
                break;
            };
            let Some(job) = self.prepare_job(store, coord) else {
                continue;
            };
            self.submit(store, job);
            dispatched += 1;
            if elapsed_ms(started) >= self.config.mesh_dispatch_budget_ms {
                break;
            }
        }
        dispatched
    }

    /// Snapshots a queued chunk into a job and marks it in flight.
    fn prepare_job(&mut self, store: &mut ChunkStore, coord: ChunkCoord) -> Option<MeshJob> {
        let job_id = self.next_job_id;
        let chunk = store.chunk_mut(coord)?;
        chunk.mesh_queued = false;
        if !chunk.generated || !chunk.should_be_loaded || !chunk.dirty || chunk.mesh_in_flight {
            return None;
        }
        chunk.mesh_in_flight = true;
        chunk.mesh_job = Some(job_id);
        let blocks = chunk.blocks.clone();
        let neighbors = store.extract_neighbor_faces(coord);

        self.next_job_id += 1;
        self.in_flight.insert(job_id, coord);
        self.stats.jobs_dispatched += 1;

        Some(MeshJob {
            job_id,
            coord,
            blocks,
            neighbors,
            context: Arc::clone(&self.context),
            submitted: Instant::now(),
        })
    }

    fn submit(&mut self, store: &mut ChunkStore, job: MeshJob) {
        let Some(workers) = self.workers.as_mut() else {
            self.apply.push(job.process());
            return;
        };
        if let Err(err) = workers.publish_task(job) {
            let disconnected = matches!(err, PublishError::Disconnected(_));
            self.apply.push(err.into_task().process());
            if disconnected {
                self.fall_back_to_sync(store, "mesh worker disconnected");
            }
        }
    }

    /// Moves finished worker results into the apply queue.
    pub fn collect(&mut self, store: &mut ChunkStore) {
        let Some(workers) = self.workers.as_mut() else {
            return;
        };
        let mut completed = Vec::new();
        let result = workers.collect_completed(&mut completed);
        for output in completed {
            self.apply.push(output);
        }
        if let Err(err) = result {
            self.fall_back_to_sync(store, &err.to_string());
        }
    }

    /// Drops the worker pool and requeues every job whose result was lost.
    fn fall_back_to_sync(&mut self, store: &mut ChunkStore, reason: &str) {
        warn!("{reason}; switching to synchronous meshing");
        self.workers = None;
        self.stats.synchronous = true;

        let landed: HashSet<u64> = self.apply.iter().map(|result| result.job_id).collect();
        let lost: Vec<(u64, ChunkCoord)> = self
            .in_flight
            .iter()
            .filter(|(job_id, _)| !landed.contains(*job_id))
            .map(|(&job_id, &coord)| (job_id, coord))
            .collect();

        for (job_id, coord) in lost {
            self.in_flight.remove(&job_id);
            if let Some(chunk) = store.chunk_mut(coord) {
                if chunk.mesh_job == Some(job_id) {
                    chunk.mesh_job = None;
                    chunk.mesh_in_flight = false;
                    chunk.mesh_needs_rebuild = false;
                    chunk.dirty = true;
                }
            }
            self.queue_mesh(store, coord);
        }
    }

    /// Uploads finished meshes until the apply budget is spent.
    ///
    /// # Returns
    /// Number of results applied (stale ones excluded).
    pub fn apply(&mut self, store: &mut ChunkStore, uploader: &mut dyn MeshUploader) -> usize {
        let started = Instant::now();
        let mut applied = 0;
        while let Some(result) = self.apply.pop() {
            if self.apply_result(store, uploader, result) {
                applied += 1;
            }
            if elapsed_ms(started) >= self.config.mesh_apply_budget_ms {
                break;
            }
        }
        applied
    }

    fn apply_result(&mut self, store: &mut ChunkStore, uploader: &mut dyn MeshUploader, result: MeshResult) -> bool {
        self.in_flight.remove(&result.job_id);
        let coord = result.coord;

        let Some(chunk) = store.chunk_mut(coord) else {
            self.stats.stale_results += 1;
            return false;
        };
        if chunk.mesh_job != Some(result.job_id) {
            debug!("Dropping stale mesh job {} for chunk {coord:?}", result.job_id);
            self.stats.stale_results += 1;
            return false;
        }
        chunk.mesh_job = None;
        chunk.mesh_in_flight = false;

        if !chunk.should_be_loaded {
            debug!("Dropping mesh for unloaded chunk {coord:?}");
            chunk.mesh_needs_rebuild = false;
            chunk.dirty = true;
            self.stats.stale_results += 1;
            return false;
        }

        for group in RenderGroup::ALL {
            if let Some(handle) = chunk.take_mesh(group) {
                uploader.dispose(handle);
            }
            let buffers = result.buffers.group(group);
            if !buffers.is_empty() {
                chunk.meshes[group.index()] = Some(uploader.upload(coord, group, buffers));
            }
        }
        chunk.loaded = true;
        let rebuild = std::mem::take(&mut chunk.mesh_needs_rebuild);
        chunk.dirty = rebuild;

        self.stats.results_applied += 1;
        self.stats.last_mesh_ms = result.timing_ms;
        self.stats.last_latency_ms = result.latency_ms;

        if rebuild {
            self.queue_mesh(store, coord);
        }
        true
    }

    /// One scheduling step: generate, pick up dirty chunks, dispatch, collect
    /// and apply.
    pub fn tick(&mut self, store: &mut ChunkStore, terrain: &TerrainGenerator, uploader: &mut dyn MeshUploader) {
        self.run_generation(store, terrain);
        self.collect_dirty(store);
        self.dispatch(store);
        self.collect(store);
        self.apply(store, uploader);
    }
}
