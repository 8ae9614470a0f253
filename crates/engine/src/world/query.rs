//! Read-only spatial queries: the Occupancy Query and the vertical probes.
//!
//! Nothing here mutates the world. Keys found in the index that no longer
//! resolve to a block are skipped, never dereferenced.

use glam::Vec3;

use super::World;
use super::block::BlockKey;
use crate::grid::Aabb;

/// The spawn-time authority on "is this cell free?".
///
/// Handed to spawners and movers explicitly instead of being looked up
/// through any global registry.
pub trait Occupancy {
    /// Whether a block of `cell_size` centred at `position` would overlap
    /// anything solid.
    fn is_occupied(&self, position: Vec3, cell_size: f32) -> bool;
}

/// What a vertical probe ran into first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeHit {
    Terrain {
        distance: f32,
        /// Height of the surface that was hit.
        surface_z: f32,
    },
    Block {
        key: BlockKey,
        distance: f32,
        surface_z: f32,
        /// The occupant is mid-fall and cannot support anything.
        transient: bool,
        velocity: f32,
    },
}

impl ProbeHit {
    pub fn distance(&self) -> f32 {
        match self {
            ProbeHit::Terrain { distance, .. } | ProbeHit::Block { distance, .. } => *distance,
        }
    }

    pub fn surface_z(&self) -> f32 {
        match self {
            ProbeHit::Terrain { surface_z, .. } | ProbeHit::Block { surface_z, .. } => *surface_z,
        }
    }

    pub fn block(&self) -> Option<BlockKey> {
        match self {
            ProbeHit::Block { key, .. } => Some(*key),
            ProbeHit::Terrain { .. } => None,
        }
    }
}

impl World {
    /// The occupancy test box for a block of `cell_size` at `position`.
    pub fn occupancy_box(&self, position: Vec3, cell_size: f32) -> Aabb {
        Aabb::from_center_half_extents(position, Vec3::splat(cell_size * self.occupancy_extent))
    }

    /// [`Occupancy::is_occupied`], ignoring one block (typically the one asking).
    pub fn is_occupied_except(&self, position: Vec3, cell_size: f32, except: Option<BlockKey>) -> bool {
        let region = self.occupancy_box(position, cell_size);
        if self.terrain.overlaps(&region) {
            return true;
        }
        self.index
            .candidates(&region)
            .into_iter()
            .filter(|key| Some(*key) != except)
            .filter_map(|key| self.blocks.get(key))
            .any(|block| block.footprint(self.footprint_inset).overlaps(&region))
    }

    /// First thing below a square of half edge `half_width` centred on
    /// `origin`, within `length`, skipping `except`. Pass the asking block's
    /// footprint half edge so nothing under any part of it is missed.
    pub fn probe_down(
        &self,
        origin: Vec3,
        half_width: f32,
        length: f32,
        except: Option<BlockKey>,
    ) -> Option<ProbeHit> {
        let column = Aabb::new(
            Vec3::new(origin.x - half_width, origin.y - half_width, origin.z - length),
            Vec3::new(origin.x + half_width, origin.y + half_width, origin.z),
        );
        let mut best = self
            .terrain
            .probe_down(origin, half_width, length)
            .map(|distance| ProbeHit::Terrain {
                distance,
                surface_z: origin.z - distance,
            });

        for key in self.index.candidates(&column) {
            if Some(key) == except {
                continue;
            }
            let Some(block) = self.blocks.get(key) else {
                continue;
            };
            let fp = block.footprint(self.footprint_inset);
            if !fp.overlaps_xy(&column) || fp.min.z > origin.z {
                continue;
            }
            let distance = (origin.z - fp.max.z).max(0.0);
            if distance > length {
                continue;
            }
            if best.is_none_or(|b| distance < b.distance()) {
                best = Some(ProbeHit::Block {
                    key,
                    distance,
                    surface_z: fp.max.z,
                    transient: block.is_transient(),
                    velocity: block.vertical_velocity,
                });
            }
        }
        best
    }

    /// First block above a square of half edge `half_width` centred on
    /// `origin`, within `length`, skipping `except`. Terrain overhead is not
    /// reported: only blocks can be woken.
    pub fn probe_up(
        &self,
        origin: Vec3,
        half_width: f32,
        length: f32,
        except: Option<BlockKey>,
    ) -> Option<ProbeHit> {
        let column = Aabb::new(
            Vec3::new(origin.x - half_width, origin.y - half_width, origin.z),
            Vec3::new(origin.x + half_width, origin.y + half_width, origin.z + length),
        );
        let mut best: Option<ProbeHit> = None;

        for key in self.index.candidates(&column) {
            if Some(key) == except {
                continue;
            }
            let Some(block) = self.blocks.get(key) else {
                continue;
            };
            let fp = block.footprint(self.footprint_inset);
            if !fp.overlaps_xy(&column) || fp.max.z < origin.z {
                continue;
            }
            let distance = (fp.min.z - origin.z).max(0.0);
            if distance > length {
                continue;
            }
            if best.is_none_or(|b| distance < b.distance()) {
                best = Some(ProbeHit::Block {
                    key,
                    distance,
                    surface_z: fp.min.z,
                    transient: block.is_transient(),
                    velocity: block.vertical_velocity,
                });
            }
        }
        best
    }

    /// Whether any block footprint overlaps `region`.
    pub fn any_block_overlaps(&self, region: &Aabb) -> bool {
        self.index
            .candidates(region)
            .into_iter()
            .filter_map(|key| self.blocks.get(key))
            .any(|block| block.footprint(self.footprint_inset).overlaps(region))
    }
}

impl Occupancy for World {
    fn is_occupied(&self, position: Vec3, cell_size: f32) -> bool {
        self.is_occupied_except(position, cell_size, None)
    }
}
