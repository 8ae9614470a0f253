use crate::world::World;
use crate::world::block::{Block, BlockKey};
use crate::world::query::ProbeHit;

/// A block falling directly underneath, which gives no support but still
/// bounds how far the block above may move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallingBelow {
    pub key: BlockKey,
    /// Top face of the block below.
    pub top_z: f32,
    pub velocity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Support {
    Grounded { surface_z: f32 },
    Unsupported { falling_below: Option<FallingBelow> },
}

/// Probe length measured from the block centre: never shorter than
/// `min_ratio * cell_size`, and always long enough to cover the distance the
/// block is about to travel, so nothing thin is skipped at speed.
pub fn probe_length(cell_size: f32, next_velocity: f32, dt: f32, min_ratio: f32) -> f32 {
    let travel = cell_size * 0.5 + next_velocity.abs() * dt;
    travel.max(cell_size * min_ratio)
}

/// Probe straight down from `block`, excluding itself.
///
/// The probe covers the block's whole footprint, not just its centre line.
/// Hitting a block whose fall is confirmed counts as unsupported, so a whole
/// column can come down together.
pub fn probe(world: &World, key: BlockKey, block: &Block, length: f32) -> Support {
    let half_width = block.half_size() * world.footprint_inset();
    match world.probe_down(block.position(), half_width, length, Some(key)) {
        None => Support::Unsupported { falling_below: None },
        Some(ProbeHit::Block {
            key: below,
            surface_z,
            transient: true,
            velocity,
            ..
        }) => Support::Unsupported {
            falling_below: Some(FallingBelow {
                key: below,
                top_z: surface_z,
                velocity,
            }),
        },
        Some(hit) => Support::Grounded {
            surface_z: hit.surface_z(),
        },
    }
}
