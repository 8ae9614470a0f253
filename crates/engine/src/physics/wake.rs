use glam::Vec3;

use crate::config::SimConfig;
use crate::world::World;
use crate::world::block::{BlockKey, FallState};

/// The block sitting directly on top of `key`, if any.
pub fn block_above(world: &World, config: &SimConfig, key: BlockKey) -> Option<BlockKey> {
    let block = world.get(key)?;
    let half_width = block.half_size() * world.footprint_inset();
    resting_on(world, config, block.position(), half_width, block.cell_size(), Some(key))
}

/// The block sitting on a cube of edge `cell_size` centred at `center`: an
/// upward probe of one cell plus `wake_margin_ratio` over a square of half
/// edge `half_width`.
pub fn resting_on(
    world: &World,
    config: &SimConfig,
    center: Vec3,
    half_width: f32,
    cell_size: f32,
    except: Option<BlockKey>,
) -> Option<BlockKey> {
    let length = cell_size * (1.0 + config.wake_margin_ratio);
    world.probe_up(center, half_width, length, except)?.block()
}

/// Arm `key` for a support check on its next step. Returns `false` if the
/// block is missing, anchored, or already falling.
pub fn arm(world: &mut World, key: BlockKey) -> bool {
    match world.get(key) {
        Some(block) if block.has_gravity() && !block.is_falling() => {}
        _ => return false,
    }
    world.set_fall_state(key, FallState::Falling);
    if let Some(block) = world.block_mut(key) {
        block.armed = true;
    }
    true
}
