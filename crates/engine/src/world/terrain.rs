use dashmap::DashSet;
use glam::Vec3;

use crate::grid::{Aabb, CellPos};

/// Static solid ground: an optional infinite floor plane plus individual
/// solid cells. Terrain always supports and always counts as occupied.
///
/// Cells are edited through `Simulation::set_terrain_solid` and
/// `Simulation::clear_terrain`, which keep the blocks around them consistent.
pub struct Terrain {
    cell_size: f32,
    floor_z: Option<f32>,
    cells: DashSet<CellPos>,
}

impl Terrain {
    pub fn new(cell_size: f32, floor_z: Option<f32>) -> Self {
        Self {
            cell_size,
            floor_z,
            cells: DashSet::new(),
        }
    }

    pub fn floor_z(&self) -> Option<f32> {
        self.floor_z
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub(crate) fn set_solid(&self, cell: CellPos) {
        self.cells.insert(cell);
    }

    /// Returns whether the cell was solid.
    pub(crate) fn clear(&self, cell: CellPos) -> bool {
        self.cells.remove(&cell).is_some()
    }

    pub fn is_solid(&self, cell: CellPos) -> bool {
        self.cells.contains(&cell)
    }

    pub fn solid_count(&self) -> usize {
        self.cells.len()
    }

    pub fn cell_box(&self, cell: CellPos) -> Aabb {
        Aabb::cube(cell.center(self.cell_size), self.cell_size)
    }

    pub fn overlaps(&self, region: &Aabb) -> bool {
        if let Some(floor) = self.floor_z {
            if region.min.z < floor {
                return true;
            }
        }
        region
            .cells(self.cell_size)
            .any(|cell| self.is_solid(cell) && self.cell_box(cell).overlaps(region))
    }

    /// Distance from `origin` down to the first terrain surface under a
    /// square of half edge `half_width` centred on it, if one lies within
    /// `length`.
    pub fn probe_down(&self, origin: Vec3, half_width: f32, length: f32) -> Option<f32> {
        let mut best = self
            .floor_z
            .map(|floor| origin.z - floor)
            .filter(|d| *d >= 0.0 && *d <= length);

        let reach = Vec3::new(half_width, half_width, 0.0);
        let lo = CellPos::containing(origin - reach - Vec3::Z * length, self.cell_size);
        let hi = CellPos::containing(origin + reach, self.cell_size);
        for x in lo.x..=hi.x {
            for y in lo.y..=hi.y {
                let Some(z) = (lo.z..=hi.z)
                    .rev()
                    .find(|z| self.is_solid(CellPos::new(x, y, *z)))
                else {
                    continue;
                };
                let surface = CellPos::new(x, y, z).floor_z(self.cell_size) + self.cell_size;
                let distance = (origin.z - surface).max(0.0);
                if distance <= length {
                    best = Some(best.map_or(distance, |b: f32| b.min(distance)));
                }
            }
        }
        best
    }
}
