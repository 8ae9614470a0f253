//! The timed simulation loop.
//!
//! One tokio task owns the tick schedule. Each tick it locks the shared
//! [`Simulation`], steps it by the configured `dt`, drains its events, and
//! publishes them to the event bus after the lock is released.
//!
//! Commands from elsewhere (spawns, damage) lock the same mutex between
//! ticks and publish their own events with [`run_command`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use gridfall_engine::{SimEvent, Simulation, StepReport};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::event_bus::{self, ChangeSource, SimEventBatch};
use crate::metrics::Metrics;

pub type SharedSimulation = Arc<Mutex<Simulation>>;

/// Tick settings for [`start`].
#[derive(Debug, Clone, Copy)]
pub struct LoopSettings {
    pub period: Duration,
    /// Simulated seconds per tick.
    pub dt: f32,
    pub parallel: bool,
}

/// Lock the simulation. A panic on another thread mid-step leaves the world
/// in whatever state that step reached; keep going with it.
pub fn lock(sim: &SharedSimulation) -> MutexGuard<'_, Simulation> {
    sim.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One tick: step, drain, record.
pub fn tick(
    sim: &SharedSimulation,
    settings: LoopSettings,
    metrics: &Metrics,
) -> (StepReport, Vec<SimEvent>) {
    let started = Instant::now();
    let (report, events) = {
        let mut sim = lock(sim);
        let report = if settings.parallel {
            sim.step_parallel(settings.dt)
        } else {
            sim.step(settings.dt)
        };
        (report, sim.take_events())
    };
    metrics.record_tick(&report, started.elapsed());
    metrics.record_events(&events);
    (report, events)
}

/// Run `f` against the simulation outside the tick loop and publish whatever
/// events it produced.
pub fn run_command<T>(
    sim: &SharedSimulation,
    name: &'static str,
    metrics: &Metrics,
    bus: &broadcast::Sender<SimEventBatch>,
    f: impl FnOnce(&mut Simulation) -> T,
) -> T {
    let (out, events) = {
        let mut sim = lock(sim);
        let out = f(&mut sim);
        (out, sim.take_events())
    };
    metrics.record_events(&events);
    event_bus::publish(bus, ChangeSource::Command(name), events);
    out
}

/// Spawn the tick task.
pub fn start(
    sim: SharedSimulation,
    settings: LoopSettings,
    metrics: Arc<Metrics>,
    bus: broadcast::Sender<SimEventBatch>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(settings.period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        tracing::info!(
            "Simulation loop started (period {:?}, dt {}s, parallel {})",
            settings.period,
            settings.dt,
            settings.parallel
        );

        let mut tick_no: u64 = 0;
        loop {
            interval.tick().await;
            tick_no += 1;

            let (report, events) = tick(&sim, settings, &metrics);
            if report.processed > 0 {
                tracing::debug!(
                    "Tick {}: {} falling, {} started, {} landed, {} blocked, {} removed",
                    tick_no,
                    report.processed,
                    report.started_falling,
                    report.landed,
                    report.snap_blocked,
                    report.removed
                );
            }
            event_bus::publish(&bus, ChangeSource::Tick(tick_no), events);
        }
    })
}
