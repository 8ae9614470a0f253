//! Tag-driven spawning.
//!
//! Gameplay code names blocks by tag (`"block.type.destructible"`); the
//! manager resolves the tag against the configured catalog and spawns into
//! whichever simulation it is handed.

use gridfall_engine::{BlockKey, Simulation, SpawnError, SpawnRequest, Vec3};
use indexmap::IndexMap;
use thiserror::Error;

use crate::config::BlockTemplate;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpawnByTagError {
    #[error("no block type registered for tag {0:?}")]
    UnknownTag(String),

    #[error(transparent)]
    Spawn(#[from] SpawnError),
}

pub struct BlockManager {
    templates: IndexMap<String, BlockTemplate>,
}

impl BlockManager {
    pub fn new(templates: IndexMap<String, BlockTemplate>) -> Self {
        Self { templates }
    }

    pub fn template(&self, tag: &str) -> Option<&BlockTemplate> {
        self.templates.get(tag)
    }

    /// Registered tags, in catalog order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// The request `tag` would produce at `position`.
    pub fn request(&self, tag: &str, position: Vec3) -> Result<SpawnRequest, SpawnByTagError> {
        let Some(t) = self.templates.get(tag) else {
            tracing::warn!("Spawn by tag failed: unknown tag {:?}", tag);
            return Err(SpawnByTagError::UnknownTag(tag.to_string()));
        };
        let mut request = SpawnRequest::new(t.kind.into(), position).with_gravity(t.gravity);
        request.cell_size = t.cell_size;
        if let Some(max_health) = t.max_health {
            request = request.with_health(max_health);
        }
        Ok(request)
    }

    /// Spawn the block registered under `tag`. `gravity` overrides the
    /// template's own setting when given. Placement and occupancy are left to
    /// [`Simulation::spawn`].
    pub fn spawn_by_tag(
        &self,
        sim: &mut Simulation,
        tag: &str,
        position: Vec3,
        gravity: Option<bool>,
    ) -> Result<BlockKey, SpawnByTagError> {
        let mut request = self.request(tag, position)?;
        if let Some(gravity) = gravity {
            request.gravity = gravity;
        }

        match sim.spawn(request) {
            Ok(key) => {
                tracing::debug!("Spawned {:?} as {:?}", tag, key);
                Ok(key)
            }
            Err(SpawnError::Occupied { position }) => {
                tracing::warn!("Spawn of {:?} at {} skipped: location occupied", tag, position);
                Err(SpawnError::Occupied { position }.into())
            }
            Err(e) => {
                tracing::warn!("Spawn of {:?} rejected: {}", tag, e);
                Err(e.into())
            }
        }
    }
}
