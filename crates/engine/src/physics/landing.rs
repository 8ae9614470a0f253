use glam::Vec3;

use crate::error::LandingError;
use crate::grid;
use crate::world::World;
use crate::world::block::{BlockKey, FallState};

/// Lattice position for a block at `position` coming to rest on a surface at
/// `surface_z`.
pub fn target(position: Vec3, cell_size: f32, surface_z: f32) -> Vec3 {
    let resting = Vec3::new(position.x, position.y, surface_z + cell_size * 0.5);
    grid::snap(resting, cell_size)
}

/// Force-place `key` at `target` and put it to rest.
///
/// Fails without touching the block when the target is obstructed; the
/// caller leaves it falling to retry next step.
pub fn settle(world: &mut World, key: BlockKey, target: Vec3) -> Result<(), LandingError> {
    let cell_size = world.get(key).ok_or(LandingError::Missing)?.cell_size();
    if world.is_occupied_except(target, cell_size, Some(key)) {
        return Err(LandingError::Obstructed { target });
    }
    world.set_position(key, target);
    world.set_fall_state(key, FallState::Resting);
    if let Some(block) = world.block_mut(key) {
        block.vertical_velocity = 0.0;
        block.armed = false;
    }
    Ok(())
}
