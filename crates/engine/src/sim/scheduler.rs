//! Stepping. Only falling blocks are visited; resting blocks cost nothing
//! until something wakes them.
//!
//! Ordering: each step snapshots the falling set first. A block woken during
//! the step has its `fall_state` flipped immediately, but it is not in the
//! snapshot, so its own probe and integration wait for the next step. That
//! is what makes a column come apart one level per step.

use glam::Vec3;
use rayon::prelude::*;

use super::Simulation;
use super::event::{RemovalReason, SimEvent, StepReport};
use crate::error::LandingError;
use crate::physics::{self, Motion, landing};
use crate::world::block::BlockKey;
use crate::world::query::ProbeHit;

impl Simulation {
    // ── Sequential execution ────────────────────────────────────────────

    /// Advance every falling block by `dt` seconds, bottom-up, each block
    /// seeing the effects of the ones processed before it.
    pub fn step(&mut self, dt: f32) -> StepReport {
        let mut report = StepReport::default();
        for key in self.world.falling_bottom_up() {
            let Some(motion) = physics::plan(&self.world, &self.config, key, dt) else {
                continue;
            };
            report.processed += 1;
            self.apply_motion(key, motion, &mut report);
        }
        self.steps += 1;
        tracing::trace!("Step {}: {:?}", self.steps, report);
        report
    }

    /// Step until nothing is falling. Returns the number of steps taken.
    pub fn run_until_rest(&mut self, dt: f32, max_steps: usize) -> usize {
        let mut taken = 0;
        while taken < max_steps && !self.is_at_rest() {
            self.step(dt);
            taken += 1;
        }
        taken
    }

    // ── Parallel execution (snapshot-scatter-gather) ────────────────────

    /// Plan every falling block in parallel against the state at the start
    /// of the step, then apply the plans serially in bottom-up order.
    ///
    /// Unlike [`Simulation::step`], a block does not see neighbours that
    /// landed earlier in the same step; it catches up on the next one. Wake
    /// timing is identical, and since an armed block below still counts as
    /// support, a freshly spawned stack settles in place just as it does
    /// under `step`.
    pub fn step_parallel(&mut self, dt: f32) -> StepReport {
        let keys = self.world.falling_bottom_up();
        let world = &self.world;
        let config = &self.config;
        let plans: Vec<(BlockKey, Motion)> = keys
            .par_iter()
            .filter_map(|&key| physics::plan(world, config, key, dt).map(|m| (key, m)))
            .collect();

        let mut report = StepReport::default();
        for (key, motion) in plans {
            report.processed += 1;
            self.apply_motion(key, motion, &mut report);
        }
        self.steps += 1;
        tracing::trace!("Parallel step {}: {:?}", self.steps, report);
        report
    }

    pub fn run_until_rest_parallel(&mut self, dt: f32, max_steps: usize) -> usize {
        let mut taken = 0;
        while taken < max_steps && !self.is_at_rest() {
            self.step_parallel(dt);
            taken += 1;
        }
        taken
    }

    // ── Applying a plan ─────────────────────────────────────────────────

    fn apply_motion(&mut self, key: BlockKey, motion: Motion, report: &mut StepReport) {
        match motion {
            Motion::Land { target } => self.apply_landing(key, target, report),
            Motion::Fall { z, velocity } => self.apply_fall(key, z, velocity, report),
        }
    }

    fn apply_landing(&mut self, key: BlockKey, target: Vec3, report: &mut StepReport) {
        match landing::settle(&mut self.world, key, target) {
            Ok(()) => {
                report.landed += 1;
                self.events.push(SimEvent::Landed {
                    block: key,
                    position: target,
                });
            }
            Err(LandingError::Obstructed { target }) => {
                tracing::warn!("Landing of {:?} blocked at {}; retrying next step", key, target);
                report.snap_blocked += 1;
                self.events.push(SimEvent::SnapBlocked { block: key, target });
            }
            Err(LandingError::Missing) => {}
        }
    }

    fn apply_fall(&mut self, key: BlockKey, z: f32, velocity: f32, report: &mut StepReport) {
        let Some(block) = self.world.get(key) else {
            return;
        };
        let from = block.position();
        let half_extent = block.half_size() * self.world.footprint_inset();
        let (z, velocity) = self.guard_descent(key, from, z, velocity, half_extent);
        let confirmed = block.is_armed();

        self.world.set_position(key, Vec3::new(from.x, from.y, z));
        if let Some(block) = self.world.block_mut(key) {
            block.vertical_velocity = velocity;
            block.armed = false;
        }

        if confirmed {
            report.started_falling += 1;
            tracing::debug!("{:?} started falling from {}", key, from);
            self.events.push(SimEvent::StartedFalling {
                block: key,
                position: from,
            });
            self.wake_above(key);
        }

        if let Some(kill_z) = self.config.kill_z {
            if z < kill_z {
                if let Some(block) = self.world.remove(key) {
                    tracing::debug!("{:?} fell out of the world at {}", key, block.position());
                    report.removed += 1;
                    self.events.push(SimEvent::Removed {
                        block: key,
                        position: block.position(),
                        reason: RemovalReason::OutOfWorld,
                    });
                }
            }
        }
    }

    /// Re-check the planned move against the live world so a footprint never
    /// passes through anything beneath it. A no-op for sequential steps,
    /// where the plan was made against the same state.
    fn guard_descent(
        &self,
        key: BlockKey,
        from: Vec3,
        z: f32,
        velocity: f32,
        half_extent: f32,
    ) -> (f32, f32) {
        let reach = (from.z - z).max(0.0) + half_extent;
        match self.world.probe_down(from, half_extent, reach, Some(key)) {
            Some(hit) if z - half_extent < hit.surface_z() => {
                let floor_velocity = match hit {
                    ProbeHit::Block { velocity: v, .. } => v,
                    ProbeHit::Terrain { .. } => 0.0,
                };
                ((hit.surface_z() + half_extent).min(from.z), velocity.max(floor_velocity))
            }
            _ => (z, velocity),
        }
    }
}
