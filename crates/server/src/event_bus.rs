//! Simulation event bus.
//!
//! Every tick (and every command that changes the world outside a tick)
//! publishes a [`SimEventBatch`] to a shared `tokio::sync::broadcast`
//! channel. Renderers, recorders and loggers subscribe independently.

use std::sync::Arc;

use gridfall_engine::{BlockKey, SimEvent, Vec3};
use tokio::sync::broadcast;

/// Capacity of the broadcast channel. A subscriber that falls further behind
/// than this sees `RecvError::Lagged` and skips ahead.
pub const BUS_CAPACITY: usize = 256;

/// Where a batch of events came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeSource {
    /// The simulation loop, by tick number.
    Tick(u64),
    /// A one-off command (spawn, damage, removal) run outside the loop.
    Command(&'static str),
}

/// Events drained from the simulation in one go.
///
/// `Arc<[...]>` so cloning per subscriber is a refcount bump.
#[derive(Clone, Debug)]
pub struct SimEventBatch {
    pub source: ChangeSource,
    pub events: Arc<[SimEvent]>,
}

pub fn channel() -> (broadcast::Sender<SimEventBatch>, broadcast::Receiver<SimEventBatch>) {
    broadcast::channel(BUS_CAPACITY)
}

/// Publish `events` unless there are none. Returns whether a batch went out
/// to at least one subscriber.
pub fn publish(
    bus: &broadcast::Sender<SimEventBatch>,
    source: ChangeSource,
    events: Vec<SimEvent>,
) -> bool {
    if events.is_empty() {
        return false;
    }
    let batch = SimEventBatch {
        source,
        events: events.into(),
    };
    // No subscribers is not an error.
    bus.send(batch).is_ok()
}

/// Where each touched block ends up, for a renderer: `Some(position)` when
/// it appeared or came to rest, `None` when it left the world. Later events
/// for the same block win.
pub fn collect_block_updates(events: &[SimEvent]) -> Vec<(BlockKey, Option<Vec3>)> {
    let mut updates: Vec<(BlockKey, Option<Vec3>)> = Vec::new();
    for event in events {
        let (key, update) = match event {
            SimEvent::Spawned { block, position, .. } | SimEvent::Landed { block, position } => {
                (*block, Some(*position))
            }
            SimEvent::Destroyed { block, .. } | SimEvent::Removed { block, .. } => (*block, None),
            _ => continue,
        };
        match updates.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = update,
            None => updates.push((key, update)),
        }
    }
    updates
}
