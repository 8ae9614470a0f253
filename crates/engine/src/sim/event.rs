use glam::Vec3;

use crate::grid::CellPos;
use crate::world::block::{ActorRef, BlockKey, BlockKind, FallState};

/// Why a block left the world without being destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// Fell below the kill plane.
    OutOfWorld,
    /// Removed by an explicit call.
    Manual,
}

/// Everything observable that happened inside the simulation, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    Spawned {
        block: BlockKey,
        kind: BlockKind,
        position: Vec3,
        fall_state: FallState,
    },
    /// The block's own support probe confirmed a fall.
    StartedFalling { block: BlockKey, position: Vec3 },
    /// `block` was armed because `by` started falling or went away under it.
    /// `None` when the support was a terrain cell.
    Woken {
        block: BlockKey,
        by: Option<BlockKey>,
    },
    TerrainChanged { cell: CellPos, solid: bool },
    Landed { block: BlockKey, position: Vec3 },
    /// Landing was obstructed; the block stays falling and retries.
    SnapBlocked { block: BlockKey, target: Vec3 },
    /// Health ran out. Fires exactly once per block.
    Destroyed {
        block: BlockKey,
        kind: BlockKind,
        position: Vec3,
        instigator: Option<ActorRef>,
    },
    Removed {
        block: BlockKey,
        position: Vec3,
        reason: RemovalReason,
    },
}

impl SimEvent {
    /// The block the event is about. `None` for terrain edits.
    pub fn block(&self) -> Option<BlockKey> {
        match self {
            SimEvent::Spawned { block, .. }
            | SimEvent::StartedFalling { block, .. }
            | SimEvent::Woken { block, .. }
            | SimEvent::Landed { block, .. }
            | SimEvent::SnapBlocked { block, .. }
            | SimEvent::Destroyed { block, .. }
            | SimEvent::Removed { block, .. } => Some(*block),
            SimEvent::TerrainChanged { .. } => None,
        }
    }
}

/// Counters for one call to `step` / `step_parallel`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Falling blocks visited.
    pub processed: usize,
    pub started_falling: usize,
    pub landed: usize,
    pub snap_blocked: usize,
    pub removed: usize,
}
