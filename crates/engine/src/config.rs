/// Tunables for one simulation. All ratios are fractions of a block's `cell_size`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Vertical acceleration in units/s². Negative: `z` points up.
    pub gravity: f32,
    /// Lattice spacing used when a spawn request does not name one, and the
    /// bucket size of the spatial index and terrain cells.
    pub default_cell_size: f32,
    /// Footprint edge as a fraction of `cell_size`.
    pub footprint_inset: f32,
    /// Half edge of the occupancy test box (0.4 gives an 80% box).
    pub occupancy_extent: f32,
    /// Shortest support probe, measured down from the block centre.
    pub probe_min_ratio: f32,
    /// The wake probe reaches `cell_size * (1 + wake_margin_ratio)` upward.
    pub wake_margin_ratio: f32,
    /// Infinite floor plane. `None` leaves only blocks and terrain cells.
    pub floor_z: Option<f32>,
    /// Falling blocks whose centre drops below this are removed.
    pub kill_z: Option<f32>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity: -980.0,
            default_cell_size: 100.0,
            footprint_inset: 0.99,
            occupancy_extent: 0.4,
            probe_min_ratio: 0.6,
            wake_margin_ratio: 0.1,
            floor_z: Some(0.0),
            kill_z: Some(-10_000.0),
        }
    }
}
