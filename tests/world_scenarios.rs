use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use cgmath::Point3;
use voxel_world::{
    BlockSnapshot, BlockType, ChunkCoord, DefaultBlockRegistry, EngineConfig, GroupBuffers, MeshHandle,
    MeshUploader, RenderGroup, SchedulerConfig, SetBlockOptions, SnapshotEntry, World, WorldConfig, AIR,
    WATER,
};

#[derive(Default)]
struct Recording {
    next_handle: u64,
    live: HashMap<MeshHandle, ChunkCoord>,
    latest: HashMap<(ChunkCoord, RenderGroup), GroupBuffers>,
    uploads: usize,
}

/// An uploader whose record outlives the world that owns it.
#[derive(Clone, Default)]
struct RecordingUploader(Arc<Mutex<Recording>>);

impl RecordingUploader {
    fn live_for(&self, coord: ChunkCoord) -> usize {
        let recording = self.0.lock().unwrap();
        recording.live.values().filter(|&&owner| owner == coord).count()
    }

    fn latest_for(&self, coord: ChunkCoord) -> Vec<Option<GroupBuffers>> {
        let recording = self.0.lock().unwrap();
        RenderGroup::ALL
            .iter()
            .map(|&group| recording.latest.get(&(coord, group)).cloned())
            .collect()
    }

    fn uploads(&self) -> usize {
        self.0.lock().unwrap().uploads
    }
}

impl MeshUploader for RecordingUploader {
    fn upload(&mut self, coord: ChunkCoord, group: RenderGroup, buffers: &GroupBuffers) -> MeshHandle {
        let mut recording = self.0.lock().unwrap();
        recording.next_handle += 1;
        let handle = MeshHandle(recording.next_handle);
        recording.live.insert(handle, coord);
        recording.latest.insert((coord, group), buffers.clone());
        recording.uploads += 1;
        handle
    }

    fn dispose(&mut self, handle: MeshHandle) {
        let removed = self.0.lock().unwrap().live.remove(&handle);
        assert!(removed.is_some(), "disposed {handle:?} twice");
    }
}

fn config(view_radius: i32, worker_count: usize) -> EngineConfig {
    EngineConfig {
        world: WorldConfig {
            view_radius,
            ..WorldConfig::default()
        },
        scheduler: SchedulerConfig {
            worker_count,
            ..SchedulerConfig::default()
        },
        ..EngineConfig::default()
    }
}

fn world_with(config: EngineConfig) -> (World, RecordingUploader) {
    let uploader = RecordingUploader::default();
    let world = World::new(config, Arc::new(DefaultBlockRegistry), Box::new(uploader.clone())).unwrap();
    (world, uploader)
}

fn settle(world: &mut World) {
    for _ in 0..20_000 {
        if world.is_idle() {
            return;
        }
        world.advance();
        if world.stats().meshes_in_flight > 0 {
            thread::sleep(Duration::from_millis(1));
        }
    }
    panic!("world did not settle: {:?}", world.stats());
}

#[test]
fn spawn_scenario_water_falls_onto_dry_land() {
    let (mut world, _) = world_with(config(2, 0));
    world.generate_chunk(ChunkCoord::new(0, 0));

    let spawn = world.spawn_point();
    let ground = world.get_block(spawn);
    assert_ne!(ground, AIR);
    assert_ne!(ground, WATER);

    let source = Point3::new(spawn.x, spawn.y + 5, spawn.z);
    let below = Point3::new(spawn.x, spawn.y + 4, spawn.z);
    let below_was_air = world.get_block(below) == AIR;
    assert!(world.set_block(
        source,
        WATER,
        SetBlockOptions {
            water_level: Some(7),
            ..SetBlockOptions::default()
        },
    ));
    world.drain_water();

    assert_eq!(world.get_water_level(source), Some(7));
    if below_was_air {
        let level = world.get_water_level(below).expect("water below the source");
        assert!(level <= 1, "level {level}");
    }
}

#[test]
fn generation_is_deterministic_across_worlds() {
    let (mut a, _) = world_with(config(2, 0));
    let (mut b, _) = world_with(config(2, 0));
    let coord = ChunkCoord::new(3, -2);
    assert!(a.generate_chunk(coord));
    assert!(b.generate_chunk(coord));
    assert!(!b.generate_chunk(coord));

    let (ca, cb) = (a.chunk(coord).unwrap(), b.chunk(coord).unwrap());
    assert!(ca.blocks == cb.blocks);
    assert!(ca.water == cb.water);
    assert_eq!(a.stats().non_air_blocks, b.stats().non_air_blocks);
}

#[test]
fn repeated_write_changes_nothing() {
    let (mut world, _) = world_with(config(1, 0));
    let pos = Point3::new(-5, 60, 20);
    let log = BlockType::LOG as u16;

    assert!(world.set_block(pos, log, SetBlockOptions::default()));
    let before = world.stats();
    assert!(!world.set_block(pos, log, SetBlockOptions::default()));
    let after = world.stats();
    assert_eq!(before.non_air_blocks, after.non_air_blocks);
    assert_eq!(before.edits, after.edits);
}

#[test]
fn streaming_meshes_every_chunk_in_radius() {
    let (mut world, uploader) = world_with(config(1, 0));
    world.ensure_chunks_around(8.0, 8.0);
    settle(&mut world);

    let stats = world.stats();
    assert_eq!(stats.scheduler.chunks_generated, 9);
    assert_eq!(stats.loaded_chunks, 9);
    for dz in -1..=1 {
        for dx in -1..=1 {
            let chunk = world.chunk(ChunkCoord::new(dx, dz)).unwrap();
            assert!(chunk.generated && chunk.loaded && !chunk.dirty, "chunk ({dx}, {dz})");
        }
    }
    assert!(uploader.live_for(ChunkCoord::new(0, 0)) > 0);
}

#[test]
fn leaving_and_returning_reuses_generated_blocks() {
    let (mut world, uploader) = world_with(config(1, 0));
    let home = ChunkCoord::new(0, 0);
    world.ensure_chunks_around(8.0, 8.0);
    settle(&mut world);
    let meshed = uploader.latest_for(home);
    assert!(meshed.iter().any(Option::is_some));

    world.ensure_chunks_around(8.0 + 16.0 * 10.0, 8.0);
    settle(&mut world);
    let away = world.chunk(home).unwrap();
    assert!(!away.loaded);
    assert!(away.generated);
    assert_eq!(uploader.live_for(home), 0);
    assert_eq!(world.stats().scheduler.chunks_generated, 18);

    let uploads_before_return = uploader.uploads();
    world.ensure_chunks_around(8.0, 8.0);
    settle(&mut world);
    assert!(world.chunk(home).unwrap().loaded);
    assert!(uploader.uploads() > uploads_before_return);
    assert_eq!(uploader.latest_for(home), meshed);
    assert_eq!(world.stats().scheduler.chunks_generated, 18);
}

#[test]
fn worker_meshes_match_synchronous_meshes() {
    let (mut sync_world, sync_uploader) = world_with(config(1, 0));
    let (mut pooled_world, pooled_uploader) = world_with(config(1, 2));
    for world in [&mut sync_world, &mut pooled_world] {
        world.ensure_chunks_around(8.0, 8.0);
        settle(world);
    }

    assert!(!pooled_world.stats().scheduler.synchronous);
    for dz in -1..=1 {
        for dx in -1..=1 {
            let coord = ChunkCoord::new(dx, dz);
            assert_eq!(sync_uploader.latest_for(coord), pooled_uploader.latest_for(coord));
        }
    }
}

#[test]
fn edits_remesh_loaded_chunks() {
    let (mut world, uploader) = world_with(config(1, 0));
    world.ensure_chunks_around(8.0, 8.0);
    settle(&mut world);
    let uploads = uploader.uploads();

    let spawn = world.spawn_point();
    let glass = BlockType::GLASS as u16;
    // A boundary cell dirties the neighbouring chunk as well.
    assert!(world.set_block(Point3::new(0, spawn.y + 3, spawn.z), glass, SetBlockOptions::default()));
    settle(&mut world);

    assert!(uploader.uploads() > uploads);
    let cutout = uploader.latest_for(ChunkCoord::new(0, 0))[RenderGroup::Cutout as usize].clone();
    assert!(cutout.is_some_and(|buffers| buffers.quad_count() > 0));
    assert!(!world.chunk(ChunkCoord::new(-1, 0)).unwrap().dirty);
}

#[test]
fn snapshot_restores_edits_into_a_fresh_world() {
    let (mut original, _) = world_with(config(1, 0));
    let spawn = original.spawn_point();
    let edits = [
        (Point3::new(spawn.x, spawn.y + 2, spawn.z), BlockType::GLASS as u16),
        (Point3::new(-20, 62, 33), BlockType::LOG as u16),
        (spawn, AIR),
    ];
    for (pos, block) in edits {
        original.set_block(pos, block, SetBlockOptions::default());
    }
    let json = original.snapshot_json().unwrap();

    let (mut restored, _) = world_with(config(1, 0));
    let report = restored.restore_snapshot_json(&json).unwrap();
    assert_eq!(report.applied, 3);
    assert_eq!(report.skipped, 0);
    for (pos, block) in edits {
        assert_eq!(restored.get_block(pos), block, "at {pos:?}");
    }
    assert_eq!(restored.snapshot(), original.snapshot());
}

#[test]
fn snapshot_restore_skips_malformed_entries() {
    let (mut world, _) = world_with(config(1, 0));
    let snapshot = BlockSnapshot {
        entries: vec![
            SnapshotEntry::new(Point3::new(2, 58, 2), BlockType::GLASS as u16, None),
            SnapshotEntry {
                key: "2,58".to_owned(),
                block: 1,
                water_level: None,
                source: false,
            },
            SnapshotEntry {
                key: "3,58,3".to_owned(),
                block: 999,
                water_level: None,
                source: false,
            },
            SnapshotEntry {
                key: "4,58,4".to_owned(),
                block: WATER,
                water_level: Some(12),
                source: false,
            },
            SnapshotEntry {
                key: "5,-3,5".to_owned(),
                block: 1,
                water_level: None,
                source: false,
            },
        ],
    };

    let report = world.restore_snapshot(&snapshot);
    assert_eq!(report.applied, 1);
    assert_eq!(report.skipped, 4);
    assert_eq!(world.get_block(Point3::new(2, 58, 2)), BlockType::GLASS as u16);
    assert_eq!(world.get_block(Point3::new(3, 58, 3)), AIR);
    assert_eq!(world.get_block(Point3::new(4, 58, 4)), AIR);
}

#[test]
fn removing_a_source_drains_its_flow() {
    let (mut world, _) = world_with(config(1, 0));
    world.generate_chunk(ChunkCoord::new(0, 0));
    let spawn = world.spawn_point();
    let source = Point3::new(spawn.x, spawn.y + 1, spawn.z);

    world.set_block(source, WATER, SetBlockOptions::default());
    world.drain_water();
    assert_eq!(world.get_water_level(source), Some(0));

    world.set_block(source, AIR, SetBlockOptions::default());
    world.drain_water();
    for dz in -3..=3 {
        for dx in -3..=3 {
            let pos = Point3::new(source.x + dx, source.y, source.z + dz);
            assert_ne!(world.get_block(pos), WATER, "water left at {pos:?}");
        }
    }
}
