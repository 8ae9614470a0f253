use glam::Vec3;
use slotmap::new_key_type;

use crate::destruction::Health;
use crate::grid::{self, Aabb};

new_key_type! {
    /// Generational handle to a block. A key whose block was removed simply
    /// resolves to `None`; it never aliases a newer block.
    pub struct BlockKey;
}

/// Static classification, fixed at spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Immutable,
    Warning,
    Destructible,
    Recordable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FallState {
    #[default]
    Resting,
    Falling,
}

/// Opaque cosmetic value owned by the rendering layer. Never read by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DisplayState(pub u32);

/// Opaque reference to whatever actor caused a damage event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorRef(pub u64);

/// One cubic block in the world.
///
/// Position and fall state are only mutated by the simulation's own step
/// (and by wake/landing on its behalf), which is why they have no public
/// setters.
#[derive(Debug, Clone)]
pub struct Block {
    pub(crate) position: Vec3,
    pub(crate) cell_size: f32,
    pub(crate) kind: BlockKind,
    pub(crate) fall_state: FallState,
    /// Falling, but the fall has not yet been confirmed by this block's own
    /// support probe.
    pub(crate) armed: bool,
    pub(crate) vertical_velocity: f32,
    /// Anchored blocks (`false`) never fall and ignore wake-ups.
    pub(crate) gravity: bool,
    pub(crate) health: Option<Health>,
    pub display: DisplayState,
}

impl Block {
    pub(crate) fn new(
        kind: BlockKind,
        position: Vec3,
        cell_size: f32,
        gravity: bool,
        health: Option<Health>,
    ) -> Self {
        let fall_state = if gravity {
            FallState::Falling
        } else {
            FallState::Resting
        };
        Self {
            position,
            cell_size,
            kind,
            fall_state,
            armed: gravity,
            vertical_velocity: 0.0,
            gravity,
            health,
            display: DisplayState::default(),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn fall_state(&self) -> FallState {
        self.fall_state
    }

    pub fn vertical_velocity(&self) -> f32 {
        self.vertical_velocity
    }

    pub fn has_gravity(&self) -> bool {
        self.gravity
    }

    /// Only removable blocks carry health.
    pub fn is_removable(&self) -> bool {
        self.health.is_some()
    }

    pub fn health(&self) -> Option<&Health> {
        self.health.as_ref()
    }

    pub fn is_falling(&self) -> bool {
        self.fall_state == FallState::Falling
    }

    /// Whether this occupant is mid-transition and therefore cannot support
    /// anything resting on it. Probes ask this instead of inspecting the kind.
    ///
    /// An armed block has not moved yet and is still where it rested, so it
    /// supports until its own probe confirms the fall.
    pub fn is_transient(&self) -> bool {
        self.is_falling() && !self.armed
    }

    /// Woken or freshly spawned, waiting for its first support probe.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn half_size(&self) -> f32 {
        self.cell_size * 0.5
    }

    pub fn footprint(&self, inset: f32) -> Aabb {
        grid::footprint(self.position, self.cell_size, inset)
    }
}
