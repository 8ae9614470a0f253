//! Lock-free simulation counters.
//!
//! The tick loop updates these with atomic adds; the periodic logger reads
//! them at its own pace.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
use std::time::{Duration, Instant};

use gridfall_engine::{SimEvent, StepReport};

pub struct Metrics {
    // Monotonic counters
    ticks: AtomicU64,
    tick_ns_sum: AtomicU64,
    spawned: AtomicU64,
    started_falling: AtomicU64,
    landed: AtomicU64,
    snap_blocked: AtomicU64,
    destroyed: AtomicU64,
    removed: AtomicU64,

    // Tick duration histogram
    hist_under_10us: AtomicU64,
    hist_10_100us: AtomicU64,
    hist_100us_1ms: AtomicU64,
    hist_1_10ms: AtomicU64,
    hist_over_10ms: AtomicU64,

    started_at: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            tick_ns_sum: AtomicU64::new(0),
            spawned: AtomicU64::new(0),
            started_falling: AtomicU64::new(0),
            landed: AtomicU64::new(0),
            snap_blocked: AtomicU64::new(0),
            destroyed: AtomicU64::new(0),
            removed: AtomicU64::new(0),
            hist_under_10us: AtomicU64::new(0),
            hist_10_100us: AtomicU64::new(0),
            hist_100us_1ms: AtomicU64::new(0),
            hist_1_10ms: AtomicU64::new(0),
            hist_over_10ms: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Called once per simulation step.
    pub fn record_tick(&self, report: &StepReport, duration: Duration) {
        self.ticks.fetch_add(1, Relaxed);
        self.tick_ns_sum
            .fetch_add(duration.as_nanos() as u64, Relaxed);
        self.started_falling
            .fetch_add(report.started_falling as u64, Relaxed);
        self.landed.fetch_add(report.landed as u64, Relaxed);
        self.snap_blocked
            .fetch_add(report.snap_blocked as u64, Relaxed);

        let bucket = match duration.as_micros() {
            0..=9 => &self.hist_under_10us,
            10..=99 => &self.hist_10_100us,
            100..=999 => &self.hist_100us_1ms,
            1_000..=9_999 => &self.hist_1_10ms,
            _ => &self.hist_over_10ms,
        };
        bucket.fetch_add(1, Relaxed);
    }

    /// Count the events the step report does not cover.
    pub fn record_events(&self, events: &[SimEvent]) {
        for event in events {
            match event {
                SimEvent::Spawned { .. } => self.spawned.fetch_add(1, Relaxed),
                SimEvent::Destroyed { .. } => self.destroyed.fetch_add(1, Relaxed),
                SimEvent::Removed { .. } => self.removed.fetch_add(1, Relaxed),
                _ => continue,
            };
        }
    }

    pub fn snapshot(&self, blocks: u64, falling: u64) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.started_at.elapsed().as_secs_f64(),
            ticks: self.ticks.load(Relaxed),
            tick_ns_sum: self.tick_ns_sum.load(Relaxed),
            spawned: self.spawned.load(Relaxed),
            started_falling: self.started_falling.load(Relaxed),
            landed: self.landed.load(Relaxed),
            snap_blocked: self.snap_blocked.load(Relaxed),
            destroyed: self.destroyed.load(Relaxed),
            removed: self.removed.load(Relaxed),
            blocks,
            falling,
            hist: [
                self.hist_under_10us.load(Relaxed),
                self.hist_10_100us.load(Relaxed),
                self.hist_100us_1ms.load(Relaxed),
                self.hist_1_10ms.load(Relaxed),
                self.hist_over_10ms.load(Relaxed),
            ],
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialisable point-in-time copy. Rates come from diffing two snapshots.
#[derive(Clone, Debug, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: f64,
    pub ticks: u64,
    pub tick_ns_sum: u64,
    pub spawned: u64,
    pub started_falling: u64,
    pub landed: u64,
    pub snap_blocked: u64,
    pub destroyed: u64,
    pub removed: u64,
    /// Gauge: blocks in the world.
    pub blocks: u64,
    /// Gauge: blocks currently falling.
    pub falling: u64,
    /// `[<10μs, 10-100μs, 100μs-1ms, 1-10ms, >10ms]`
    pub hist: [u64; 5],
}
