pub mod block;
pub mod index;
pub mod query;
pub mod terrain;

use std::collections::HashSet;

use block::{Block, BlockKey, FallState};
use glam::Vec3;
use index::CellIndex;
use slotmap::SlotMap;
use terrain::Terrain;

use crate::config::SimConfig;

/// Every block plus the static terrain they stand on.
///
/// This is the spatial substrate. Stepping lives in `sim::Simulation`, which
/// is the only caller of the `pub(crate)` mutators below.
pub struct World {
    blocks: SlotMap<BlockKey, Block>,
    index: CellIndex,
    terrain: Terrain,
    /// Blocks currently in `FallState::Falling`: the only ones a step visits.
    falling: HashSet<BlockKey>,
    footprint_inset: f32,
    occupancy_extent: f32,
}

impl World {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            blocks: SlotMap::with_key(),
            index: CellIndex::new(),
            terrain: Terrain::new(config.default_cell_size, config.floor_z),
            falling: HashSet::new(),
            footprint_inset: config.footprint_inset,
            occupancy_extent: config.occupancy_extent,
        }
    }

    pub fn get(&self, key: BlockKey) -> Option<&Block> {
        self.blocks.get(key)
    }

    pub fn contains(&self, key: BlockKey) -> bool {
        self.blocks.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockKey, &Block)> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn index(&self) -> &CellIndex {
        &self.index
    }

    pub fn footprint_inset(&self) -> f32 {
        self.footprint_inset
    }

    pub fn falling_count(&self) -> usize {
        self.falling.len()
    }

    /// Falling blocks ordered bottom-up (ties broken by key), so a block is
    /// always processed after whatever it may be resting on.
    pub fn falling_bottom_up(&self) -> Vec<BlockKey> {
        let mut keys: Vec<(f32, BlockKey)> = self
            .falling
            .iter()
            .filter_map(|key| self.blocks.get(*key).map(|b| (b.position.z, *key)))
            .collect();
        keys.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        keys.into_iter().map(|(_, key)| key).collect()
    }

    pub(crate) fn insert(&mut self, block: Block) -> BlockKey {
        let (center, cell_size) = (block.position, block.cell_size);
        let falling = block.is_falling();
        let key = self.blocks.insert(block);
        self.index.insert(key, center, cell_size);
        if falling {
            self.falling.insert(key);
        }
        key
    }

    pub(crate) fn remove(&mut self, key: BlockKey) -> Option<Block> {
        let block = self.blocks.remove(key)?;
        self.index.remove(key, block.position, block.cell_size);
        self.falling.remove(&key);
        Some(block)
    }

    /// Mutable access for fields that neither the index nor the falling set
    /// depend on (velocity, health, armed flag, display state).
    pub(crate) fn block_mut(&mut self, key: BlockKey) -> Option<&mut Block> {
        self.blocks.get_mut(key)
    }

    pub(crate) fn set_position(&mut self, key: BlockKey, position: Vec3) {
        if let Some(block) = self.blocks.get_mut(key) {
            let from = std::mem::replace(&mut block.position, position);
            self.index.relocate(key, block.cell_size, from, position);
        }
    }

    pub(crate) fn set_fall_state(&mut self, key: BlockKey, state: FallState) {
        if let Some(block) = self.blocks.get_mut(key) {
            block.fall_state = state;
            match state {
                FallState::Falling => self.falling.insert(key),
                FallState::Resting => self.falling.remove(&key),
            };
        }
    }
}
