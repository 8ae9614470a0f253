use glam::Vec3;

/// Integer lattice coordinate of one cell. `z` is the vertical axis.
///
/// Cell `(i, j, k)` of a lattice with spacing `c` spans
/// `x in [(i - 0.5) c, (i + 0.5) c]`, the same for `y`, and `z in [k c, (k + 1) c]`:
/// horizontal centres sit on multiples of `c`, bottom faces sit on multiples of `c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellPos {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl CellPos {
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// The cell whose volume contains `point`.
    pub fn containing(point: Vec3, cell_size: f32) -> Self {
        Self {
            x: (point.x / cell_size + 0.5).floor() as i64,
            y: (point.y / cell_size + 0.5).floor() as i64,
            z: (point.z / cell_size).floor() as i64,
        }
    }

    /// World-space centre of this cell.
    pub fn center(&self, cell_size: f32) -> Vec3 {
        Vec3::new(
            self.x as f32 * cell_size,
            self.y as f32 * cell_size,
            self.z as f32 * cell_size + cell_size * 0.5,
        )
    }

    /// Height of the cell's bottom face.
    pub fn floor_z(&self, cell_size: f32) -> f32 {
        self.z as f32 * cell_size
    }

    pub const fn above(&self) -> Self {
        Self::new(self.x, self.y, self.z + 1)
    }

    pub const fn below(&self) -> Self {
        Self::new(self.x, self.y, self.z - 1)
    }

    /// The six cardinal neighbors.
    pub const fn neighbors(&self) -> [CellPos; 6] {
        [
            Self::new(self.x + 1, self.y, self.z),
            Self::new(self.x - 1, self.y, self.z),
            Self::new(self.x, self.y + 1, self.z),
            Self::new(self.x, self.y - 1, self.z),
            Self::new(self.x, self.y, self.z + 1),
            Self::new(self.x, self.y, self.z - 1),
        ]
    }
}
