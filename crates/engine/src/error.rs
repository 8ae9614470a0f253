use glam::Vec3;
use thiserror::Error;

use crate::grid::CellPos;

/// Why a spawn request was turned down. None of these are fatal: the caller
/// decides whether to retry elsewhere or drop the request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpawnError {
    #[error("location {position} is occupied")]
    Occupied { position: Vec3 },

    #[error("position must be finite, got {0}")]
    InvalidPosition(Vec3),

    #[error("cell size must be positive and finite, got {0}")]
    InvalidCellSize(f32),

    #[error("max health must be positive and finite, got {0}")]
    InvalidHealth(f32),
}

/// A terrain edit that was turned down.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TerrainError {
    #[error("terrain cell {cell:?} overlaps a block")]
    Occupied { cell: CellPos },
}

/// The Landing Snapper could not place a block on its lattice position.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LandingError {
    #[error("snap target {target} is obstructed")]
    Obstructed { target: Vec3 },

    #[error("block no longer exists")]
    Missing,
}
