use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use gridfall_engine::{Simulation, Vec3};
use gridfall_server::block_catalog::BlockManager;
use gridfall_server::config::ServerConfig;
use gridfall_server::event_bus::{self, ChangeSource};
use gridfall_server::metrics::Metrics;
use gridfall_server::simulation::{self, LoopSettings};
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> Result<()> {
    let demo_mode = std::env::args().any(|a| a == "--demo");
    let config_path: Option<PathBuf> = std::env::args()
        .skip_while(|a| a != "--config")
        .nth(1)
        .map(PathBuf::from);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::load_or_default(config_path.as_deref())?;

    if demo_mode {
        let summary = gridfall_server::demo::run_demo(&config)?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    tracing::info!("gridfall -- grid-gravity block simulation host");

    let sim = Arc::new(Mutex::new(Simulation::new((&config.sim).into())));
    let metrics = Arc::new(Metrics::new());
    let (bus_tx, mut bus_rx) = event_bus::channel();

    // ── Startup scene ────────────────────────────────────────────────────
    let catalog = BlockManager::new(config.blocks.clone());
    let placed = simulation::run_command(&sim, "scene", &metrics, &bus_tx, |sim| {
        config
            .scene
            .iter()
            .filter(|p| {
                let [x, y, z] = p.position;
                catalog
                    .spawn_by_tag(sim, &p.tag, Vec3::new(x, y, z), p.gravity)
                    .is_ok()
            })
            .count()
    });
    tracing::info!("Scene ready: {}/{} blocks placed", placed, config.scene.len());

    let settings = LoopSettings {
        period: config.tick(),
        dt: config.dt(),
        parallel: config.parallel,
    };
    let ticker = simulation::start(Arc::clone(&sim), settings, Arc::clone(&metrics), bus_tx.clone());

    // ── Event log ────────────────────────────────────────────────────────
    tokio::spawn(async move {
        loop {
            match bus_rx.recv().await {
                Ok(batch) => {
                    if let ChangeSource::Tick(n) = batch.source {
                        for (key, at) in event_bus::collect_block_updates(&batch.events) {
                            tracing::debug!("Tick {}: {:?} -> {:?}", n, key, at);
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event log lagged, skipped {} batches", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // ── Periodic metrics ─────────────────────────────────────────────────
    let metrics_sim = Arc::clone(&sim);
    let metrics_ref = Arc::clone(&metrics);
    let metrics_interval = config.metrics_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(metrics_interval);
        interval.tick().await; // first tick is immediate, skip it
        loop {
            interval.tick().await;
            let (blocks, falling) = {
                let sim = simulation::lock(&metrics_sim);
                (sim.world().len() as u64, sim.world().falling_count() as u64)
            };
            match serde_json::to_string(&metrics_ref.snapshot(blocks, falling)) {
                Ok(json) => tracing::info!("Metrics: {}", json),
                Err(e) => tracing::error!("Failed to serialise metrics: {}", e),
            }
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    tracing::info!("Ctrl+C received, shutting down...");
    ticker.abort();

    let sim = simulation::lock(&sim);
    tracing::info!(
        "Stopped after {} steps with {} blocks ({} falling)",
        sim.steps(),
        sim.world().len(),
        sim.world().falling_count()
    );
    Ok(())
}
