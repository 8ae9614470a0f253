//! Host for the gridfall engine: tag-keyed block catalog, timed simulation
//! loop, event bus and counters.

pub mod block_catalog;
pub mod config;
pub mod demo;
pub mod event_bus;
pub mod metrics;
pub mod simulation;
