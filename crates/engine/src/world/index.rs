use std::collections::HashSet;

use dashmap::DashMap;
use glam::Vec3;

use super::block::BlockKey;
use crate::grid::{Aabb, CellPos};

/// Bucket key: the bit pattern of a block's `cell_size` plus the lattice
/// cell (at that size) holding the block's centre.
type BucketKey = (u32, CellPos);

/// Spatial hash from lattice cell to the blocks centred in it.
///
/// Every block lives in exactly one bucket, on the lattice of its own
/// `cell_size`, so inserts and moves cost the same whatever the size. A
/// query visits each size layer separately, widening the region by half that
/// layer's cell so any footprint reaching into it is found. Takes `&self`
/// for writes because `DashMap` shards its own locks.
pub struct CellIndex {
    cells: DashMap<BucketKey, Vec<BlockKey>>,
    /// Every indexed key, grouped by cell size.
    layers: DashMap<u32, HashSet<BlockKey>>,
}

impl Default for CellIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl CellIndex {
    pub fn new() -> Self {
        Self {
            cells: DashMap::new(),
            layers: DashMap::new(),
        }
    }

    fn bucket(center: Vec3, cell_size: f32) -> BucketKey {
        (cell_size.to_bits(), CellPos::containing(center, cell_size))
    }

    pub fn insert(&self, key: BlockKey, center: Vec3, cell_size: f32) {
        self.layers.entry(cell_size.to_bits()).or_default().insert(key);
        let mut bucket = self.cells.entry(Self::bucket(center, cell_size)).or_default();
        if !bucket.contains(&key) {
            bucket.push(key);
        }
    }

    pub fn remove(&self, key: BlockKey, center: Vec3, cell_size: f32) {
        self.unlink(key, Self::bucket(center, cell_size));
        let bits = cell_size.to_bits();
        let layer_empty = match self.layers.get_mut(&bits) {
            Some(mut layer) => {
                layer.remove(&key);
                layer.is_empty()
            }
            None => false,
        };
        if layer_empty {
            self.layers.remove_if(&bits, |_, layer| layer.is_empty());
        }
    }

    fn unlink(&self, key: BlockKey, cell: BucketKey) {
        let now_empty = match self.cells.get_mut(&cell) {
            Some(mut bucket) => {
                bucket.retain(|k| *k != key);
                bucket.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.cells.remove_if(&cell, |_, bucket| bucket.is_empty());
        }
    }

    /// Move `key` between centres. Only touches the map when the centre
    /// crosses into another cell.
    pub fn relocate(&self, key: BlockKey, cell_size: f32, from: Vec3, to: Vec3) {
        let old = Self::bucket(from, cell_size);
        let new = Self::bucket(to, cell_size);
        if old == new {
            return;
        }
        self.unlink(key, old);
        let mut bucket = self.cells.entry(new).or_default();
        if !bucket.contains(&key) {
            bucket.push(key);
        }
    }

    /// Every key whose footprint may touch `region`, deduplicated.
    ///
    /// A layer with fewer blocks than the cells the region spans is scanned
    /// whole instead, so a tiny layer never costs more than its size.
    pub fn candidates(&self, region: &Aabb) -> Vec<BlockKey> {
        let mut out = Vec::new();
        for layer in self.layers.iter() {
            let cell_size = f32::from_bits(*layer.key());
            let reach = Vec3::splat(cell_size * 0.5);
            let widened = Aabb::new(region.min - reach, region.max + reach);

            if span(&widened, cell_size) > layer.value().len() as f64 {
                out.extend(layer.value().iter().copied());
                continue;
            }
            for cell in widened.cells(cell_size) {
                if let Some(bucket) = self.cells.get(&(*layer.key(), cell)) {
                    out.extend(bucket.iter().copied());
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Number of non-empty buckets.
    pub fn bucket_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of distinct cell sizes indexed.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}

/// How many lattice cells of `cell_size` the box touches.
fn span(region: &Aabb, cell_size: f32) -> f64 {
    let lo = CellPos::containing(region.min, cell_size);
    let hi = CellPos::containing(region.max, cell_size);
    let axis = |a: i64, b: i64| (b - a + 1).max(0) as f64;
    axis(lo.x, hi.x) * axis(lo.y, hi.y) * axis(lo.z, hi.z)
}
