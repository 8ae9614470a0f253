//! Server configuration, read from a JSON file.
//!
//! Every field has a default, so a partial file (or `{}`) is valid. The
//! block catalog is ordered: tags keep the order they were written in.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use gridfall_engine::{BlockKind, SimConfig};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TICK_MS: u64 = 16;
pub const DEFAULT_METRICS_INTERVAL_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Simulation tick period in milliseconds. Each tick steps by this much
    /// simulated time.
    pub tick_ms: u64,
    /// How often the metrics snapshot is logged.
    pub metrics_interval_secs: u64,
    /// Step with the rayon-parallel scheduler.
    pub parallel: bool,
    pub sim: SimSettings,
    /// Gameplay tag → block template.
    pub blocks: IndexMap<String, BlockTemplate>,
    /// Blocks spawned by tag at startup.
    pub scene: Vec<ScenePlacement>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            metrics_interval_secs: DEFAULT_METRICS_INTERVAL_SECS,
            parallel: false,
            sim: SimSettings::default(),
            blocks: default_catalog(),
            scene: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.tick_ms > 0, "tick_ms must be positive");
        anyhow::ensure!(
            self.sim.default_cell_size > 0.0,
            "sim.default_cell_size must be positive, got {}",
            self.sim.default_cell_size
        );
        let s = &self.sim;
        anyhow::ensure!(s.gravity.is_finite(), "sim.gravity must be finite, got {}", s.gravity);
        anyhow::ensure!(
            s.footprint_inset > 0.0 && s.footprint_inset <= 1.0,
            "sim.footprint_inset must be in (0, 1], got {}",
            s.footprint_inset
        );
        anyhow::ensure!(
            s.occupancy_extent > 0.0 && s.occupancy_extent < 0.5,
            "sim.occupancy_extent must be in (0, 0.5), got {}",
            s.occupancy_extent
        );
        anyhow::ensure!(
            (0.5..=1.0).contains(&s.probe_min_ratio),
            "sim.probe_min_ratio must be in [0.5, 1], got {}",
            s.probe_min_ratio
        );
        anyhow::ensure!(
            (0.0..1.0).contains(&s.wake_margin_ratio),
            "sim.wake_margin_ratio must be in [0, 1), got {}",
            s.wake_margin_ratio
        );
        for (tag, template) in &self.blocks {
            if let Some(cell_size) = template.cell_size {
                anyhow::ensure!(cell_size > 0.0, "block {tag}: cell_size must be positive");
            }
            if let Some(max_health) = template.max_health {
                anyhow::ensure!(max_health > 0.0, "block {tag}: max_health must be positive");
            }
        }
        Ok(())
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Simulated seconds per tick.
    pub fn dt(&self) -> f32 {
        self.tick_ms as f32 / 1000.0
    }

    pub fn metrics_interval(&self) -> Duration {
        Duration::from_secs(self.metrics_interval_secs.max(1))
    }
}

/// Serialisable mirror of [`SimConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    pub gravity: f32,
    pub default_cell_size: f32,
    pub footprint_inset: f32,
    pub occupancy_extent: f32,
    pub probe_min_ratio: f32,
    pub wake_margin_ratio: f32,
    pub floor_z: Option<f32>,
    pub kill_z: Option<f32>,
}

impl Default for SimSettings {
    fn default() -> Self {
        SimConfig::default().into()
    }
}

impl From<SimConfig> for SimSettings {
    fn from(c: SimConfig) -> Self {
        Self {
            gravity: c.gravity,
            default_cell_size: c.default_cell_size,
            footprint_inset: c.footprint_inset,
            occupancy_extent: c.occupancy_extent,
            probe_min_ratio: c.probe_min_ratio,
            wake_margin_ratio: c.wake_margin_ratio,
            floor_z: c.floor_z,
            kill_z: c.kill_z,
        }
    }
}

impl From<&SimSettings> for SimConfig {
    fn from(s: &SimSettings) -> Self {
        Self {
            gravity: s.gravity,
            default_cell_size: s.default_cell_size,
            footprint_inset: s.footprint_inset,
            occupancy_extent: s.occupancy_extent,
            probe_min_ratio: s.probe_min_ratio,
            wake_margin_ratio: s.wake_margin_ratio,
            floor_z: s.floor_z,
            kill_z: s.kill_z,
        }
    }
}

/// What a tag spawns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockTemplate {
    pub kind: KindName,
    /// `None` uses the simulation's default cell size.
    #[serde(default)]
    pub cell_size: Option<f32>,
    /// `Some` makes the block removable.
    #[serde(default)]
    pub max_health: Option<f32>,
    #[serde(default = "default_gravity")]
    pub gravity: bool,
}

fn default_gravity() -> bool {
    true
}

/// One startup spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenePlacement {
    pub tag: String,
    pub position: [f32; 3],
    /// Overrides the template's gravity setting.
    #[serde(default)]
    pub gravity: Option<bool>,
}

/// [`BlockKind`] as it appears in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindName {
    Immutable,
    Warning,
    Destructible,
    Recordable,
}

impl From<KindName> for BlockKind {
    fn from(k: KindName) -> Self {
        match k {
            KindName::Immutable => BlockKind::Immutable,
            KindName::Warning => BlockKind::Warning,
            KindName::Destructible => BlockKind::Destructible,
            KindName::Recordable => BlockKind::Recordable,
        }
    }
}

fn template(kind: KindName, max_health: Option<f32>) -> BlockTemplate {
    BlockTemplate {
        kind,
        cell_size: None,
        max_health,
        gravity: true,
    }
}

/// The four stock block types.
pub fn default_catalog() -> IndexMap<String, BlockTemplate> {
    IndexMap::from([
        ("block.type.terrain".to_string(), template(KindName::Immutable, None)),
        ("block.type.warning".to_string(), template(KindName::Warning, None)),
        (
            "block.type.destructible".to_string(),
            template(KindName::Destructible, Some(1.0)),
        ),
        ("block.type.recordable".to_string(), template(KindName::Recordable, None)),
    ])
}
