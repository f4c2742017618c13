//! # Water Module
//!
//! Liquid levels relaxed by a breadth-first worklist.
//!
//! A water cell stores a level from 0 to [`MAX_WATER_LEVEL`] counting its flow
//! distance from a source. A cell with solid ground below spreads sideways at
//! `level + 1` until the level reaches the maximum; a cell with air below pours
//! into it first. Source cells hold their level forever, every other cell is
//! re-derived from its neighbourhood and dries up once nothing sustains it.
//!
//! Only cells near an edit are ever looked at. The queue is drained under a
//! per-tick cell count and millisecond budget; leftovers carry over.

use std::collections::{HashSet, VecDeque};

use cgmath::Point3;
use web_time::Instant;

use super::{
    block::{AIR, WATER},
    chunk::{offset, MAX_WATER_LEVEL},
    chunk_store::{ChunkStore, SetBlockOptions},
};
use crate::core::WaterConfig;

/// Level of water poured into the cell below a water cell.
const FALLING_LEVEL: u8 = 1;

type CellKey = (i32, i32, i32);

fn key(pos: Point3<i32>) -> CellKey {
    (pos.x, pos.y, pos.z)
}

fn laterals(pos: Point3<i32>) -> [Point3<i32>; 4] {
    [
        offset(pos, -1, 0, 0),
        offset(pos, 1, 0, 0),
        offset(pos, 0, 0, -1),
        offset(pos, 0, 0, 1),
    ]
}

fn above(pos: Point3<i32>) -> Point3<i32> {
    offset(pos, 0, 1, 0)
}

fn below(pos: Point3<i32>) -> Point3<i32> {
    offset(pos, 0, -1, 0)
}

/// The flood queue and its per-tick limits.
pub struct WaterSystem {
    queue: VecDeque<Point3<i32>>,
    queued: HashSet<CellKey>,
    max_cells_per_tick: usize,
    budget_ms: f64,
}

impl WaterSystem {
    pub fn new(config: &WaterConfig) -> Self {
        WaterSystem {
            queue: VecDeque::new(),
            queued: HashSet::new(),
            max_cells_per_tick: config.max_cells_per_tick.max(1),
            budget_ms: config.budget_ms,
        }
    }

    /// Number of cells waiting for re-evaluation.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Queues one cell unless it is already waiting.
    pub fn enqueue(&mut self, pos: Point3<i32>) {
        if pos.y < 0 {
            return;
        }
        if self.queued.insert(key(pos)) {
            self.queue.push_back(pos);
        }
    }

    /// Queues a cell and its six face neighbours.
    pub fn enqueue_around(&mut self, pos: Point3<i32>) {
        self.enqueue(pos);
        self.enqueue(above(pos));
        self.enqueue(below(pos));
        for lateral in laterals(pos) {
            self.enqueue(lateral);
        }
    }

    fn pop(&mut self) -> Option<Point3<i32>> {
        let pos = self.queue.pop_front()?;
        self.queued.remove(&key(pos));
        Some(pos)
    }

    /// Processes queued cells until the tick's cell or time budget runs out.
    ///
    /// At least one cell is processed when the queue is not empty.
    ///
    /// # Returns
    /// Number of cells processed.
    pub fn update(&mut self, store: &mut ChunkStore) -> usize {
        let started = Instant::now();
        let mut processed = 0;
        while let Some(pos) = self.pop() {
            self.update_cell(store, pos);
            processed += 1;
            if processed >= self.max_cells_per_tick
                || started.elapsed().as_secs_f64() * 1000.0 >= self.budget_ms
            {
                break;
            }
        }
        processed
    }

    /// Processes the queue until it is empty.
    ///
    /// Terminates because levels only move within `[0, 7]` and every
    /// unsustained cell eventually dries.
    pub fn drain(&mut self, store: &mut ChunkStore) -> usize {
        let mut processed = 0;
        while let Some(pos) = self.pop() {
            self.update_cell(store, pos);
            processed += 1;
        }
        processed
    }

    /// Whether flowing water may be placed at `pos`.
    fn can_flow_into(store: &ChunkStore, pos: Point3<i32>) -> bool {
        store.is_within_world(pos) && store.is_generated_at(pos) && store.get_block(pos) == AIR
    }

    /// Re-evaluates one cell. Cells that are not water are ignored.
    pub fn update_cell(&mut self, store: &mut ChunkStore, pos: Point3<i32>) {
        let Some((level, source)) = store.water_cell(pos) else {
            return;
        };

        let down = below(pos);
        let falling = Self::can_flow_into(store, down);
        if falling {
            store.set_block(down, WATER, &SetBlockOptions::flowing(FALLING_LEVEL));
            self.enqueue_around(down);
        } else if level < MAX_WATER_LEVEL {
            for lateral in laterals(pos) {
                if Self::can_flow_into(store, lateral) {
                    store.set_block(lateral, WATER, &SetBlockOptions::flowing(level + 1));
                    self.enqueue_around(lateral);
                }
            }
        }

        if source {
            return;
        }

        let mut sustain: Option<u8> = store.get_water_level(above(pos)).map(|_| FALLING_LEVEL);
        for lateral in laterals(pos) {
            if let Some(neighbor) = store.get_water_level(lateral) {
                let offered = neighbor + 1;
                sustain = Some(sustain.map_or(offered, |current| current.min(offered)));
            }
        }

        match sustain.filter(|&offered| offered <= MAX_WATER_LEVEL) {
            None => {
                let opts = SetBlockOptions {
                    skip_water_propagation: true,
                    ..SetBlockOptions::default()
                };
                store.set_block(pos, AIR, &opts);
                self.enqueue_around(pos);
            }
            Some(offered) => {
                let target = offered.clamp(1, MAX_WATER_LEVEL);
                if target != level {
                    store.set_water_level(pos, target, false);
                    self.enqueue_around(pos);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::chunk::{ChunkCoord, ChunkDimensions};

    const STONE: u16 = 1;

    /// A generated 24x8x24 chunk with a stone floor at y = 0.
    fn floor_store() -> ChunkStore {
        let dims = ChunkDimensions::new(24, 8, 24);
        let mut store = ChunkStore::new(dims);
        store.populate_with(ChunkCoord::new(0, 0), |chunk| {
            for z in 0..dims.depth {
                for x in 0..dims.width {
                    chunk.blocks[dims.index(x, 0, z)] = STONE;
                }
            }
        });
        store
    }

    fn water_system() -> WaterSystem {
        WaterSystem::new(&WaterConfig::default())
    }

    #[test]
    fn test_source_converges_to_distance_levels() {
        let mut store = floor_store();
        let mut water = water_system();
        let source = Point3::new(12, 1, 12);
        store.set_block(
            source,
            WATER,
            &SetBlockOptions {
                water_level: Some(0),
                water_source: true,
                ..Default::default()
            },
        );
        water.enqueue_around(source);
        water.drain(&mut store);

        assert_eq!(store.get_water_level(source), Some(0));
        for step in 1..=7 {
            assert_eq!(
                store.get_water_level(Point3::new(12 + step, 1, 12)),
                Some(step as u8),
                "step {step}"
            );
            assert_eq!(store.get_water_level(Point3::new(12, 1, 12 - step)), Some(step as u8));
        }
        assert_eq!(store.get_block(Point3::new(20, 1, 12)), AIR);
        assert_eq!(store.get_block(Point3::new(12, 1, 4)), AIR);
        assert_eq!(water.pending(), 0);
    }

    #[test]
    fn test_unsustained_water_dries() {
        let mut store = floor_store();
        let mut water = water_system();
        let pos = Point3::new(5, 1, 5);
        store.set_block(pos, WATER, &SetBlockOptions::flowing(3));
        for wall in laterals(pos).into_iter().chain([above(pos)]) {
            store.set_block(wall, STONE, &SetBlockOptions::default());
        }
        water.enqueue_around(pos);
        water.drain(&mut store);
        assert_eq!(store.get_block(pos), AIR);
        assert_eq!(store.get_water_level(pos), None);
    }

    #[test]
    fn test_water_falls_at_level_one() {
        let mut store = floor_store();
        let mut water = water_system();
        let top = Point3::new(3, 6, 3);
        store.set_block(
            top,
            WATER,
            &SetBlockOptions {
                water_level: Some(7),
                water_source: true,
                ..Default::default()
            },
        );
        water.enqueue_around(top);
        water.drain(&mut store);

        for y in 1..6 {
            assert_eq!(store.get_water_level(Point3::new(3, y, 3)), Some(1), "y {y}");
        }
        // Falling water does not spread sideways until it lands.
        assert_eq!(store.get_block(Point3::new(4, 3, 3)), AIR);
        assert_eq!(store.get_water_level(Point3::new(4, 1, 3)), Some(2));
    }

    #[test]
    fn test_removing_source_drains_flow() {
        let mut store = floor_store();
        let mut water = water_system();
        let source = Point3::new(10, 1, 10);
        let opts = SetBlockOptions {
            water_level: Some(0),
            water_source: true,
            ..Default::default()
        };
        store.set_block(source, WATER, &opts);
        water.enqueue_around(source);
        water.drain(&mut store);

        store.set_block(source, STONE, &SetBlockOptions::default());
        water.enqueue_around(source);
        water.drain(&mut store);

        let any_water = (0..24)
            .flat_map(|x| (0..24).map(move |z| Point3::new(x, 1, z)))
            .any(|pos| store.get_block(pos) == WATER);
        assert!(!any_water);
    }

    #[test]
    fn test_levels_stay_in_range() {
        let mut store = floor_store();
        let mut water = water_system();
        for (x, level) in [(4, 0u8), (9, 5), (14, 7)] {
            let pos = Point3::new(x, 1, 12);
            store.set_block(pos, WATER, &SetBlockOptions::flowing(level));
            water.enqueue_around(pos);
        }
        let source = Point3::new(20, 3, 20);
        store.set_block(
            source,
            WATER,
            &SetBlockOptions {
                water_level: Some(2),
                water_source: true,
                ..Default::default()
            },
        );
        water.enqueue_around(source);

        while water.pending() > 0 {
            water.update(&mut store);
            for chunk in store.chunks() {
                for (index, &block) in chunk.blocks.iter().enumerate() {
                    if block == WATER {
                        let (level, _) = crate::engine_state::voxels::chunk::decode_water(chunk.water[index])
                            .expect("water cell without level");
                        assert!(level <= MAX_WATER_LEVEL);
                    }
                }
            }
        }
    }

    #[test]
    fn test_enqueue_skips_duplicates() {
        let mut water = water_system();
        let pos = Point3::new(1, 1, 1);
        water.enqueue(pos);
        water.enqueue(pos);
        water.enqueue_around(pos);
        assert_eq!(water.pending(), 7);
    }

    #[test]
    fn test_update_respects_cell_budget() {
        let mut store = floor_store();
        let mut water = WaterSystem::new(&WaterConfig {
            max_cells_per_tick: 3,
            budget_ms: 1000.0,
        });
        water.enqueue_around(Point3::new(2, 2, 2));
        assert_eq!(water.update(&mut store), 3);
        assert_eq!(water.pending(), 4);
    }
}
