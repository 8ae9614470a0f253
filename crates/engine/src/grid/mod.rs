//! Grid geometry: pure functions between continuous positions and the lattice.
//!
//! Nothing in here holds state. Every block kind may use its own `cell_size`,
//! so the size is always passed in rather than baked into the types.

pub mod position;

pub use position::CellPos;

use glam::Vec3;

/// Snap a continuous position onto the lattice.
///
/// Horizontal axes round to the nearest multiple of `cell_size`. The vertical
/// axis rounds the block's *bottom face* (`z - cell_size / 2`) to the nearest
/// multiple, then adds the half cell back.
pub fn snap(position: Vec3, cell_size: f32) -> Vec3 {
    let half = cell_size * 0.5;
    Vec3::new(
        (position.x / cell_size).round() * cell_size,
        (position.y / cell_size).round() * cell_size,
        ((position.z - half) / cell_size).round() * cell_size + half,
    )
}

/// Snap only the horizontal axes, keeping `z`. Where a falling block is
/// spawned: on a lattice column, at any height.
pub fn snap_horizontal(position: Vec3, cell_size: f32) -> Vec3 {
    let snapped = snap(position, cell_size);
    Vec3::new(snapped.x, snapped.y, position.z)
}

/// True if `position` is exactly where [`snap`] would put it.
pub fn is_aligned(position: Vec3, cell_size: f32) -> bool {
    snap(position, cell_size) == position
}

/// Axis-aligned box used for footprints, occupancy tests and probe segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// A cube of edge `edge` centred on `center`.
    pub fn cube(center: Vec3, edge: f32) -> Self {
        Self::from_center_half_extents(center, Vec3::splat(edge * 0.5))
    }

    /// A zero-width vertical segment from `bottom_z` to `top_z` at `(x, y)`.
    pub fn vertical_segment(x: f32, y: f32, bottom_z: f32, top_z: f32) -> Self {
        Self {
            min: Vec3::new(x, y, bottom_z),
            max: Vec3::new(x, y, top_z),
        }
    }

    /// Strict overlap: boxes that merely share a face do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    /// Strict overlap of the horizontal projections only.
    pub fn overlaps_xy(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Every lattice cell this box touches (inclusive of boundary cells).
    pub fn cells(&self, cell_size: f32) -> impl Iterator<Item = CellPos> + use<> {
        let lo = CellPos::containing(self.min, cell_size);
        let hi = CellPos::containing(self.max, cell_size);
        (lo.x..=hi.x).flat_map(move |x| {
            (lo.y..=hi.y).flat_map(move |y| (lo.z..=hi.z).map(move |z| CellPos::new(x, y, z)))
        })
    }
}

/// Physical footprint of a block centred at `center`: a cube of edge
/// `cell_size * inset`, so lattice neighbours never share a face.
pub fn footprint(center: Vec3, cell_size: f32, inset: f32) -> Aabb {
    Aabb::cube(center, cell_size * inset)
}
