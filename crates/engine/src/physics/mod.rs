//! Per-block physics: support probe, fall integration, landing snap and the
//! upward wake probe.
//!
//! Planning ([`plan`]) is read-only so it can run on many blocks at once;
//! the simulation applies the resulting [`Motion`]s one at a time.

pub mod integrate;
pub mod landing;
pub mod support;
pub mod wake;

use glam::Vec3;

use crate::config::SimConfig;
use crate::world::World;
use crate::world::block::BlockKey;
use support::Support;

/// What one falling block should do this step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    /// Supported: settle onto the lattice at `target`.
    Land { target: Vec3 },
    /// Unsupported: move to height `z` with the new velocity.
    Fall { z: f32, velocity: f32 },
}

/// Support Probe, then either the Fall Integrator or the Landing Snapper's
/// target. `None` for missing or resting blocks.
pub fn plan(world: &World, config: &SimConfig, key: BlockKey, dt: f32) -> Option<Motion> {
    let block = world.get(key)?;
    if !block.is_falling() {
        return None;
    }

    let next_velocity = integrate::next_velocity(block.vertical_velocity, config.gravity, dt);
    let length = support::probe_length(block.cell_size, next_velocity, dt, config.probe_min_ratio);

    let motion = match support::probe(world, key, block, length) {
        Support::Grounded { surface_z } => Motion::Land {
            target: landing::target(block.position, block.cell_size, surface_z),
        },
        Support::Unsupported { falling_below } => {
            let (z, velocity) = integrate::advance(
                block.position.z,
                block.half_size() * world.footprint_inset(),
                next_velocity,
                dt,
                falling_below,
            );
            Motion::Fall { z, velocity }
        }
    };
    Some(motion)
}
