//! Grid-gravity block simulation.
//!
//! Cubic blocks sit on a uniform lattice. Blocks that lose support fall under
//! gravity, snap back onto the lattice when they land, and wake whatever was
//! stacked on them so a column comes down one level per step. Removable
//! blocks carry health and are destroyed when it runs out.
//!
//! The usual entry point is [`Simulation`]: spawn with a [`SpawnRequest`],
//! call [`Simulation::step`] once per tick, and drain [`SimEvent`]s.

pub mod config;
pub mod destruction;
pub mod error;
pub mod grid;
pub mod physics;
pub mod sim;
pub mod world;

pub use glam::Vec3;

pub use config::SimConfig;
pub use destruction::{DamageOutcome, Health};
pub use error::{LandingError, SpawnError, TerrainError};
pub use sim::event::{RemovalReason, SimEvent, StepReport};
pub use sim::{Simulation, SpawnRequest};
pub use world::World;
pub use world::block::{ActorRef, Block, BlockKey, BlockKind, DisplayState, FallState};
pub use world::query::Occupancy;
