//! The simulation facade: spawning, damage, removal and wake-ups. Stepping
//! lives in [`scheduler`].

pub mod event;
pub mod scheduler;

use glam::Vec3;

use crate::config::SimConfig;
use crate::destruction::{DamageOutcome, Health, HealthChange};
use crate::error::{SpawnError, TerrainError};
use crate::grid::{self, CellPos};
use crate::physics::wake;
use crate::world::World;
use crate::world::block::{ActorRef, Block, BlockKey, BlockKind, DisplayState};
use crate::world::query::Occupancy;
use event::{RemovalReason, SimEvent};

/// A request from a spawner.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    pub kind: BlockKind,
    pub position: Vec3,
    /// `None` uses `SimConfig::default_cell_size`.
    pub cell_size: Option<f32>,
    /// Gravity blocks spawn armed and are checked on the next step; anchored
    /// blocks spawn resting on the lattice and never fall.
    pub gravity: bool,
    /// `Some` makes the block removable.
    pub max_health: Option<f32>,
}

impl SpawnRequest {
    /// Gravity-enabled; destructible blocks get one point of health.
    pub fn new(kind: BlockKind, position: Vec3) -> Self {
        let max_health = match kind {
            BlockKind::Destructible => Some(1.0),
            _ => None,
        };
        Self {
            kind,
            position,
            cell_size: None,
            gravity: true,
            max_health,
        }
    }

    pub fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = Some(cell_size);
        self
    }

    pub fn with_gravity(mut self, gravity: bool) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn anchored(self) -> Self {
        self.with_gravity(false)
    }

    pub fn with_health(mut self, max_health: f32) -> Self {
        self.max_health = Some(max_health);
        self
    }

    pub fn without_health(mut self) -> Self {
        self.max_health = None;
        self
    }
}

/// Owns the world and drives every state transition of every block.
pub struct Simulation {
    pub(crate) config: SimConfig,
    pub(crate) world: World,
    pub(crate) events: Vec<SimEvent>,
    pub(crate) steps: u64,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        let world = World::new(&config);
        Self {
            config,
            world,
            events: Vec::new(),
            steps: 0,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn block(&self, key: BlockKey) -> Option<&Block> {
        self.world.get(key)
    }

    /// Number of completed steps.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn is_at_rest(&self) -> bool {
        self.world.falling_count() == 0
    }

    /// Drain every event recorded since the last call.
    pub fn take_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Occupancy test ignoring `except`.
    pub fn is_occupied_except(&self, position: Vec3, cell_size: f32, except: BlockKey) -> bool {
        self.world.is_occupied_except(position, cell_size, Some(except))
    }

    /// Spawn a block. Anchored blocks are snapped onto the lattice; gravity
    /// blocks are snapped onto a lattice column but keep their height.
    pub fn spawn(&mut self, request: SpawnRequest) -> Result<BlockKey, SpawnError> {
        if !request.position.is_finite() {
            return Err(SpawnError::InvalidPosition(request.position));
        }
        let cell_size = request.cell_size.unwrap_or(self.config.default_cell_size);
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(SpawnError::InvalidCellSize(cell_size));
        }
        let health = match request.max_health {
            Some(max) if !(max.is_finite() && max > 0.0) => {
                return Err(SpawnError::InvalidHealth(max));
            }
            Some(max) => Some(Health::new(max)),
            None => None,
        };

        let position = if request.gravity {
            grid::snap_horizontal(request.position, cell_size)
        } else {
            grid::snap(request.position, cell_size)
        };
        if self.world.is_occupied(position, cell_size) {
            tracing::warn!("Spawn of {:?} rejected: {} is occupied", request.kind, position);
            return Err(SpawnError::Occupied { position });
        }

        let block = Block::new(request.kind, position, cell_size, request.gravity, health);
        let fall_state = block.fall_state();
        let key = self.world.insert(block);
        tracing::debug!("Spawned {:?} {:?} at {} ({:?})", request.kind, key, position, fall_state);
        self.events.push(SimEvent::Spawned {
            block: key,
            kind: request.kind,
            position,
            fall_state,
        });
        Ok(key)
    }

    /// Arm whatever rests directly on `key`. Returns the woken block.
    pub fn wake_above(&mut self, key: BlockKey) -> Option<BlockKey> {
        let above = wake::block_above(&self.world, &self.config, key)?;
        if !wake::arm(&mut self.world, above) {
            return None;
        }
        tracing::trace!("{:?} woke {:?}", key, above);
        self.events.push(SimEvent::Woken {
            block: above,
            by: Some(key),
        });
        Some(above)
    }

    /// Apply `magnitude` points of damage. Zero, negative and non-finite
    /// magnitudes change nothing.
    pub fn apply_damage(
        &mut self,
        key: BlockKey,
        magnitude: f32,
        instigator: Option<ActorRef>,
    ) -> DamageOutcome {
        if magnitude > 0.0 {
            self.modify_health(key, -magnitude, instigator)
        } else {
            self.modify_health(key, 0.0, instigator)
        }
    }

    /// Restore up to `amount` points, never past max. Cannot revive.
    pub fn heal(&mut self, key: BlockKey, amount: f32) -> DamageOutcome {
        self.modify_health(key, amount.max(0.0), None)
    }

    fn modify_health(
        &mut self,
        key: BlockKey,
        delta: f32,
        instigator: Option<ActorRef>,
    ) -> DamageOutcome {
        let Some(block) = self.world.block_mut(key) else {
            return DamageOutcome::Missing;
        };
        let Some(health) = block.health.as_mut() else {
            return DamageOutcome::Immune;
        };
        match health.apply(delta) {
            HealthChange::Unchanged => DamageOutcome::Unchanged {
                health: health.current(),
            },
            HealthChange::Changed => DamageOutcome::Changed {
                health: health.current(),
            },
            HealthChange::Depleted => {
                self.destroy_block(key, instigator);
                DamageOutcome::Destroyed
            }
        }
    }

    /// Destroy a removable block outright. Returns `false` for missing or
    /// non-removable blocks.
    pub fn destroy(&mut self, key: BlockKey, instigator: Option<ActorRef>) -> bool {
        match self.world.get(key) {
            Some(block) if block.is_removable() => {}
            _ => return false,
        }
        self.destroy_block(key, instigator);
        true
    }

    /// Wake above while the block still exists to probe from, announce,
    /// then remove.
    fn destroy_block(&mut self, key: BlockKey, instigator: Option<ActorRef>) {
        self.wake_above(key);
        let Some(block) = self.world.remove(key) else {
            return;
        };
        tracing::info!(
            "Destroyed {:?} {:?} at {} (instigator {:?})",
            block.kind(),
            key,
            block.position(),
            instigator
        );
        self.events.push(SimEvent::Destroyed {
            block: key,
            kind: block.kind(),
            position: block.position(),
            instigator,
        });
    }

    /// Remove any block, removable or not, waking the block above first.
    pub fn remove(&mut self, key: BlockKey) -> Option<Block> {
        self.world.get(key)?;
        self.wake_above(key);
        let block = self.world.remove(key)?;
        self.events.push(SimEvent::Removed {
            block: key,
            position: block.position(),
            reason: RemovalReason::Manual,
        });
        Some(block)
    }

    /// Make a terrain cell solid. Refused if any block footprint reaches
    /// into the cell.
    pub fn set_terrain_solid(&mut self, cell: CellPos) -> Result<(), TerrainError> {
        let terrain = self.world.terrain();
        if terrain.is_solid(cell) {
            return Ok(());
        }
        if self.world.any_block_overlaps(&terrain.cell_box(cell)) {
            tracing::warn!("Terrain cell {:?} rejected: a block is in the way", cell);
            return Err(TerrainError::Occupied { cell });
        }
        terrain.set_solid(cell);
        self.events.push(SimEvent::TerrainChanged { cell, solid: true });
        Ok(())
    }

    /// Clear a terrain cell and wake whatever rested on it. Returns whether
    /// the cell was solid.
    pub fn clear_terrain(&mut self, cell: CellPos) -> bool {
        if !self.world.terrain().clear(cell) {
            return false;
        }
        self.events.push(SimEvent::TerrainChanged { cell, solid: false });

        let cell_size = self.world.terrain().cell_size();
        let half_width = cell_size * 0.5 * self.world.footprint_inset();
        let center = cell.center(cell_size);
        let above = wake::resting_on(&self.world, &self.config, center, half_width, cell_size, None);
        if let Some(above) = above {
            if wake::arm(&mut self.world, above) {
                tracing::trace!("Clearing {:?} woke {:?}", cell, above);
                self.events.push(SimEvent::Woken {
                    block: above,
                    by: None,
                });
            }
        }
        true
    }

    pub fn set_display_state(&mut self, key: BlockKey, display: DisplayState) -> bool {
        match self.world.block_mut(key) {
            Some(block) => {
                block.display = display;
                true
            }
            None => false,
        }
    }
}

impl Occupancy for Simulation {
    fn is_occupied(&self, position: Vec3, cell_size: f32) -> bool {
        self.world.is_occupied(position, cell_size)
    }
}
