//! Health bookkeeping for removable blocks.
//!
//! Health is clamped exactly once, when a change is applied. Reaching zero is
//! reported as [`HealthChange::Depleted`] only on the transition, so the
//! simulation removes a block at most once.

/// Current and maximum health of a removable block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Health {
    current: f32,
    max: f32,
}

/// What a single modification did to a [`Health`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthChange {
    Unchanged,
    Changed,
    /// Went from above zero to exactly zero.
    Depleted,
}

impl Health {
    /// Full health.
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }

    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }

    /// Apply a signed change and clamp into `[0, max]`. Depleted health never
    /// recovers.
    pub fn apply(&mut self, delta: f32) -> HealthChange {
        if delta == 0.0 || !delta.is_finite() || self.is_depleted() {
            return HealthChange::Unchanged;
        }
        let next = (self.current + delta).clamp(0.0, self.max);
        if next == self.current {
            return HealthChange::Unchanged;
        }
        self.current = next;
        if next == 0.0 {
            HealthChange::Depleted
        } else {
            HealthChange::Changed
        }
    }
}

/// Result of pushing damage (or healing) at a block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// No block behind that key any more.
    Missing,
    /// The block carries no health.
    Immune,
    Unchanged { health: f32 },
    Changed { health: f32 },
    /// Health hit zero; the block has been woken-above, announced and removed.
    Destroyed,
}
