//! Support probe, fall integration, landing snap and cascade timing.

use gridfall_engine::grid::{self, CellPos};
use gridfall_engine::{
    BlockKey, BlockKind, FallState, Occupancy, RemovalReason, SimConfig, SimEvent, Simulation,
    SpawnRequest, TerrainError, Vec3,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const CELL: f32 = 100.0;
const DT: f32 = 1.0 / 60.0;

fn cell(x: i64, y: i64, z: i64) -> Vec3 {
    CellPos::new(x, y, z).center(CELL)
}

fn spawn(sim: &mut Simulation, at: Vec3) -> BlockKey {
    sim.spawn(SpawnRequest::new(BlockKind::Immutable, at))
        .expect("spawn should succeed")
}

/// A column of `height` blocks on the floor at (0, 0), settled.
fn settled_column(sim: &mut Simulation, height: i64) -> Vec<BlockKey> {
    let keys: Vec<BlockKey> = (0..height).map(|z| spawn(sim, cell(0, 0, z))).collect();
    sim.run_until_rest(DT, 10);
    for (z, key) in keys.iter().enumerate() {
        let block = sim.block(*key).unwrap();
        assert_eq!(block.fall_state(), FallState::Resting);
        assert_eq!(block.position(), cell(0, 0, z as i64));
    }
    sim.take_events();
    keys
}

fn state(sim: &Simulation, key: BlockKey) -> FallState {
    sim.block(key).unwrap().fall_state()
}

fn started_falling(events: &[SimEvent]) -> Vec<BlockKey> {
    events
        .iter()
        .filter_map(|e| match e {
            SimEvent::StartedFalling { block, .. } => Some(*block),
            _ => None,
        })
        .collect()
}

/// No two block footprints overlap, falling or not.
fn assert_footprints_disjoint(sim: &Simulation) {
    let inset = sim.world().footprint_inset();
    let blocks: Vec<_> = sim.world().iter().collect();
    for (i, (a, block_a)) in blocks.iter().enumerate() {
        for (b, block_b) in &blocks[i + 1..] {
            assert!(
                !block_a.footprint(inset).overlaps(&block_b.footprint(inset)),
                "{a:?} at {} overlaps {b:?} at {}",
                block_a.position(),
                block_b.position()
            );
        }
    }
}

fn assert_resting_invariants(sim: &Simulation) {
    for (key, block) in sim.world().iter() {
        if block.fall_state() != FallState::Resting {
            continue;
        }
        assert!(
            grid::is_aligned(block.position(), block.cell_size()),
            "{key:?} rests off-lattice at {}",
            block.position()
        );
        assert!(
            !sim.is_occupied_except(block.position(), block.cell_size(), key),
            "{key:?} overlaps something at {}",
            block.position()
        );
    }
}

// ---------------------------------------------------------------------------
// Landing
// ---------------------------------------------------------------------------

#[test]
fn block_falls_five_cells_and_snaps_to_floor() {
    let mut sim = Simulation::new(SimConfig::default());
    let key = spawn(&mut sim, cell(0, 0, 5));

    let mut steps = 0;
    while !sim.is_at_rest() {
        sim.step(DT);
        steps += 1;
        assert!(steps < 600, "block never landed");

        let block = sim.block(key).unwrap();
        if block.fall_state() == FallState::Falling {
            assert!(
                !sim.is_occupied_except(block.position(), CELL, key),
                "falling block overlaps something at {}",
                block.position()
            );
        }
    }

    let block = sim.block(key).unwrap();
    assert_eq!(block.fall_state(), FallState::Resting);
    assert_eq!(block.position(), cell(0, 0, 0));
    assert_eq!(block.vertical_velocity(), 0.0);

    let events = sim.take_events();
    assert_eq!(started_falling(&events), vec![key]);
    assert!(matches!(events.last(), Some(SimEvent::Landed { block, .. }) if *block == key));
}

#[test]
fn supported_spawn_is_refuted_within_one_step() {
    let mut sim = Simulation::new(SimConfig::default());
    let key = spawn(&mut sim, cell(2, -1, 0));
    assert_eq!(state(&sim, key), FallState::Falling);

    sim.step(DT);

    assert_eq!(state(&sim, key), FallState::Resting);
    assert_eq!(sim.block(key).unwrap().position(), cell(2, -1, 0));
    assert!(started_falling(&sim.take_events()).is_empty());
}

#[test]
fn off_lattice_spawn_lands_on_lattice() {
    let mut sim = Simulation::new(SimConfig::default());
    let key = spawn(&mut sim, Vec3::new(37.0, -12.0, 433.0));
    assert_eq!(sim.block(key).unwrap().position(), Vec3::new(0.0, 0.0, 433.0));
    sim.run_until_rest(DT, 600);

    let block = sim.block(key).unwrap();
    assert_eq!(block.position(), Vec3::new(0.0, 0.0, 50.0));
    assert_resting_invariants(&sim);
}

#[test]
fn blocks_land_on_terrain_cells() {
    let config = SimConfig {
        floor_z: None,
        ..SimConfig::default()
    };
    let mut sim = Simulation::new(config);
    sim.set_terrain_solid(CellPos::new(0, 0, 0)).unwrap();
    assert!(sim.is_occupied(cell(0, 0, 0), CELL));

    let key = spawn(&mut sim, cell(0, 0, 4));
    sim.run_until_rest(DT, 600);

    assert_eq!(sim.block(key).unwrap().position(), cell(0, 0, 1));
}

#[test]
fn clearing_terrain_drops_what_rested_on_it() {
    let mut sim = Simulation::new(SimConfig::default());
    let ledge = CellPos::new(0, 0, 1);
    sim.set_terrain_solid(ledge).unwrap();
    let key = spawn(&mut sim, cell(0, 0, 4));
    sim.run_until_rest(DT, 600);
    assert_eq!(sim.block(key).unwrap().position(), cell(0, 0, 2));
    sim.take_events();

    assert!(sim.clear_terrain(ledge));
    assert!(!sim.clear_terrain(ledge));
    assert!(!sim.world().terrain().is_solid(ledge));
    assert_eq!(state(&sim, key), FallState::Falling);
    assert!(sim.take_events().contains(&SimEvent::Woken { block: key, by: None }));

    sim.run_until_rest(DT, 600);
    assert_eq!(sim.block(key).unwrap().position(), cell(0, 0, 0));
}

#[test]
fn terrain_cannot_be_placed_inside_a_block() {
    let mut sim = Simulation::new(SimConfig::default());
    let key = spawn(&mut sim, cell(0, 0, 0));
    sim.run_until_rest(DT, 10);

    assert_eq!(
        sim.set_terrain_solid(CellPos::new(0, 0, 0)),
        Err(TerrainError::Occupied {
            cell: CellPos::new(0, 0, 0)
        })
    );
    assert!(!sim.world().terrain().is_solid(CellPos::new(0, 0, 0)));
    assert!(sim.set_terrain_solid(CellPos::new(1, 0, 0)).is_ok());
    assert!(sim.set_terrain_solid(CellPos::new(0, 0, 1)).is_ok());
    assert_eq!(state(&sim, key), FallState::Resting);
}

#[test]
fn off_column_spawn_never_sinks_into_a_neighbour() {
    let mut sim = Simulation::new(SimConfig::default());
    sim.spawn(SpawnRequest::new(BlockKind::Immutable, cell(0, 0, 0)).anchored())
        .unwrap();
    let key = spawn(&mut sim, Vec3::new(60.0, 0.0, 450.0));

    for _ in 0..600 {
        sim.step(DT);
        assert_footprints_disjoint(&sim);
        if sim.is_at_rest() {
            break;
        }
    }
    let block = sim.block(key).unwrap();
    assert_eq!(block.fall_state(), FallState::Resting);
    assert_eq!(block.position(), cell(1, 0, 0));
}

#[test]
fn smaller_block_under_a_footprint_edge_stops_the_fall() {
    let mut sim = Simulation::new(SimConfig::default());
    // Centred at x = 50, well off the falling block's centre line but under
    // its footprint.
    sim.spawn(
        SpawnRequest::new(BlockKind::Warning, CellPos::new(1, 0, 0).center(50.0))
            .with_cell_size(50.0)
            .anchored(),
    )
    .unwrap();
    let key = spawn(&mut sim, cell(0, 0, 3));

    for _ in 0..300 {
        sim.step(DT);
        assert_footprints_disjoint(&sim);
    }
    assert_eq!(state(&sim, key), FallState::Falling);
    let inset = sim.world().footprint_inset();
    assert!(sim.block(key).unwrap().footprint(inset).min.z >= 49.75);
}

#[test]
fn pile_settles_aligned_and_disjoint() {
    let mut sim = Simulation::new(SimConfig::default());
    let spawns = [
        cell(0, 0, 3),
        cell(0, 0, 7),
        cell(0, 0, 12),
        cell(1, 0, 2),
        cell(1, 0, 9),
        cell(2, 0, 0),
        cell(0, 1, 4),
    ];
    let keys: Vec<BlockKey> = spawns.iter().map(|at| spawn(&mut sim, *at)).collect();

    let steps = sim.run_until_rest(DT, 2_000);
    assert!(steps < 2_000);
    assert_resting_invariants(&sim);

    let heights: Vec<f32> = keys
        .iter()
        .map(|k| sim.block(*k).unwrap().position().z)
        .collect();
    assert_eq!(heights, vec![50.0, 150.0, 250.0, 50.0, 150.0, 50.0, 50.0]);
}

#[test]
fn blocks_below_kill_plane_are_removed() {
    let config = SimConfig {
        floor_z: None,
        kill_z: Some(-500.0),
        ..SimConfig::default()
    };
    let mut sim = Simulation::new(config);
    let key = spawn(&mut sim, cell(0, 0, 0));

    sim.run_until_rest(DT, 600);

    assert!(sim.block(key).is_none());
    assert!(sim.world().is_empty());
    let removed = sim.take_events().into_iter().any(|e| {
        matches!(e, SimEvent::Removed { block, reason: RemovalReason::OutOfWorld, .. } if block == key)
    });
    assert!(removed);
}

#[test]
fn obstructed_landing_retries_until_clear() {
    let mut sim = Simulation::new(SimConfig::default());
    // A small anchored block under the edge of the big one: it stops the
    // fall, but sits inside the cell the big one would snap into.
    let obstacle = sim
        .spawn(
            SpawnRequest::new(BlockKind::Warning, Vec3::new(30.0, 0.0, 15.0))
                .with_cell_size(30.0)
                .anchored(),
        )
        .unwrap();
    let faller = spawn(&mut sim, cell(0, 0, 2));

    let mut blocked = false;
    for _ in 0..300 {
        sim.step(DT);
        if sim
            .take_events()
            .iter()
            .any(|e| matches!(e, SimEvent::SnapBlocked { block, .. } if *block == faller))
        {
            blocked = true;
            break;
        }
    }
    assert!(blocked, "landing was never obstructed");
    assert_eq!(state(&sim, faller), FallState::Falling);

    sim.step(DT);
    assert_eq!(state(&sim, faller), FallState::Falling);

    sim.remove(obstacle).unwrap();
    sim.run_until_rest(DT, 600);
    assert_eq!(state(&sim, faller), FallState::Resting);
    assert_eq!(sim.block(faller).unwrap().position(), cell(0, 0, 0));
}

// ---------------------------------------------------------------------------
// Cascades
// ---------------------------------------------------------------------------

#[test]
fn removing_bottom_unzips_column_one_level_per_step() {
    let mut sim = Simulation::new(SimConfig::default());
    let col = settled_column(&mut sim, 3);
    let (middle, top) = (col[1], col[2]);

    sim.remove(col[0]).unwrap();
    assert_eq!(state(&sim, middle), FallState::Falling);
    assert_eq!(state(&sim, top), FallState::Resting);
    sim.take_events();

    // Step 1: the middle block confirms its fall and wakes the top one, whose
    // own integration waits for the next step.
    sim.step(DT);
    assert_eq!(state(&sim, top), FallState::Falling);
    assert_eq!(sim.block(top).unwrap().position(), cell(0, 0, 2));
    assert!(sim.block(middle).unwrap().position().z < cell(0, 0, 1).z);
    let events = sim.take_events();
    assert_eq!(started_falling(&events), vec![middle]);
    assert!(events.contains(&SimEvent::Woken {
        block: top,
        by: Some(middle)
    }));

    // Step 2: the top block sees a falling block under it and goes too.
    sim.step(DT);
    assert_eq!(started_falling(&sim.take_events()), vec![top]);
    assert!(sim.block(top).unwrap().position().z < cell(0, 0, 2).z);

    sim.run_until_rest(DT, 600);
    assert_eq!(sim.block(middle).unwrap().position(), cell(0, 0, 0));
    assert_eq!(sim.block(top).unwrap().position(), cell(0, 0, 1));
    assert_resting_invariants(&sim);
}

#[test]
fn parallel_step_keeps_cascade_timing() {
    let mut sim = Simulation::new(SimConfig::default());
    let col = settled_column(&mut sim, 4);

    sim.remove(col[0]).unwrap();
    assert_eq!(state(&sim, col[1]), FallState::Falling);
    assert_eq!(state(&sim, col[2]), FallState::Resting);

    sim.step_parallel(DT);
    assert_eq!(state(&sim, col[2]), FallState::Falling);
    assert_eq!(state(&sim, col[3]), FallState::Resting);

    sim.step_parallel(DT);
    assert_eq!(state(&sim, col[3]), FallState::Falling);

    sim.run_until_rest_parallel(DT, 1_000);
    for (z, key) in col[1..].iter().enumerate() {
        assert_eq!(sim.block(*key).unwrap().position(), cell(0, 0, z as i64));
    }
    assert_resting_invariants(&sim);
}

#[test]
fn parallel_step_settles_a_fresh_stack_in_place() {
    let mut sim = Simulation::new(SimConfig::default());
    let keys: Vec<BlockKey> = (0..3).map(|z| spawn(&mut sim, cell(0, 0, z))).collect();
    sim.take_events();

    sim.step_parallel(DT);

    assert!(sim.is_at_rest());
    for (z, key) in keys.iter().enumerate() {
        assert_eq!(sim.block(*key).unwrap().position(), cell(0, 0, z as i64));
    }
    let events = sim.take_events();
    assert!(started_falling(&events).is_empty());
    assert!(!events.iter().any(|e| matches!(e, SimEvent::Woken { .. })));
}

#[test]
fn anchored_blocks_ignore_wake_ups() {
    let mut sim = Simulation::new(SimConfig::default());
    let base = settled_column(&mut sim, 1)[0];
    let anchored = sim
        .spawn(SpawnRequest::new(BlockKind::Immutable, cell(0, 0, 1)).anchored())
        .unwrap();
    assert_eq!(state(&sim, anchored), FallState::Resting);

    sim.remove(base).unwrap();
    assert_eq!(state(&sim, anchored), FallState::Resting);
    sim.step(DT);
    assert_eq!(sim.block(anchored).unwrap().position(), cell(0, 0, 1));
}

#[test]
fn waking_a_supported_block_resettles_it_in_place() {
    let mut sim = Simulation::new(SimConfig::default());
    let col = settled_column(&mut sim, 2);

    assert_eq!(sim.wake_above(col[0]), Some(col[1]));
    assert_eq!(state(&sim, col[1]), FallState::Falling);

    sim.step(DT);
    assert_eq!(state(&sim, col[1]), FallState::Resting);
    assert_eq!(sim.block(col[1]).unwrap().position(), cell(0, 0, 1));
    assert!(started_falling(&sim.take_events()).is_empty());
}
