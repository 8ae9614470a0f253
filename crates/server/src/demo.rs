//! Scripted scenario: build a column from catalog tags, destroy a block in
//! the middle, pull out the base, and let it all settle.

use anyhow::{Context, Result};
use gridfall_engine::grid::CellPos;
use gridfall_engine::{ActorRef, BlockKey, DamageOutcome, SimEvent, Simulation, Vec3};
use serde::Serialize;

use crate::block_catalog::BlockManager;
use crate::config::ServerConfig;

const MAX_STEPS: usize = 10_000;

/// What the demo observed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DemoSummary {
    pub steps: usize,
    pub started_falling: usize,
    pub landed: usize,
    pub destroyed: usize,
    /// Centre heights of the surviving blocks, bottom-up.
    pub final_heights: Vec<f32>,
}

const COLUMN: [&str; 4] = [
    "block.type.terrain",
    "block.type.destructible",
    "block.type.recordable",
    "block.type.warning",
];

pub fn run_demo(config: &ServerConfig) -> Result<DemoSummary> {
    let mut sim = Simulation::new((&config.sim).into());
    let catalog = BlockManager::new(config.blocks.clone());
    let cell_size = sim.config().default_cell_size;
    let dt = config.dt();
    let mut summary = DemoSummary::default();

    tracing::info!("Demo: stacking {} blocks", COLUMN.len());
    let mut keys: Vec<BlockKey> = Vec::with_capacity(COLUMN.len());
    for (z, tag) in COLUMN.iter().enumerate() {
        let at = column_cell(z as i64, cell_size);
        let key = catalog
            .spawn_by_tag(&mut sim, tag, at, None)
            .with_context(|| format!("Failed to spawn {tag} at {at}"))?;
        keys.push(key);
    }
    settle(&mut sim, dt, config.parallel, &mut summary);

    let target = keys[1];
    let health = sim
        .block(target)
        .and_then(|b| b.health())
        .map(|h| h.current())
        .context("Demo target has no health")?;
    tracing::info!("Demo: dealing {} damage to {:?}", health, target);
    match sim.apply_damage(target, health, Some(ActorRef(1))) {
        DamageOutcome::Destroyed => {}
        other => anyhow::bail!("Expected the target to be destroyed, got {other:?}"),
    }
    settle(&mut sim, dt, config.parallel, &mut summary);

    tracing::info!("Demo: removing the base");
    sim.remove(keys[0]).context("Base block vanished")?;
    settle(&mut sim, dt, config.parallel, &mut summary);

    let mut heights: Vec<f32> = sim.world().iter().map(|(_, b)| b.position().z).collect();
    heights.sort_by(f32::total_cmp);
    summary.final_heights = heights;

    tracing::info!(
        "Demo finished after {} steps: {} falls, {} landings, {} destroyed, heights {:?}",
        summary.steps,
        summary.started_falling,
        summary.landed,
        summary.destroyed,
        summary.final_heights
    );
    Ok(summary)
}

fn settle(sim: &mut Simulation, dt: f32, parallel: bool, summary: &mut DemoSummary) {
    summary.steps += if parallel {
        sim.run_until_rest_parallel(dt, MAX_STEPS)
    } else {
        sim.run_until_rest(dt, MAX_STEPS)
    };
    if !sim.is_at_rest() {
        tracing::warn!(
            "Demo: still {} blocks falling after {} steps",
            sim.world().falling_count(),
            MAX_STEPS
        );
    }
    for event in sim.take_events() {
        match event {
            SimEvent::StartedFalling { .. } => summary.started_falling += 1,
            SimEvent::Landed { block, position } => {
                summary.landed += 1;
                tracing::debug!("{:?} landed at {}", block, position);
            }
            SimEvent::Destroyed { .. } => summary.destroyed += 1,
            _ => {}
        }
    }
}

/// Centre of the demo column's cell `z`.
pub fn column_cell(z: i64, cell_size: f32) -> Vec3 {
    CellPos::new(0, 0, z).center(cell_size)
}
