//! Damage, healing and destruction of removable blocks.

use gridfall_engine::grid::CellPos;
use gridfall_engine::{
    ActorRef, BlockKey, BlockKind, DamageOutcome, FallState, SimConfig, SimEvent, Simulation,
    SpawnRequest, Vec3,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const DT: f32 = 1.0 / 60.0;

fn cell(z: i64) -> Vec3 {
    CellPos::new(0, 0, z).center(100.0)
}

/// Support, a destructible block with 50 health, and a block on top, settled.
fn stack() -> (Simulation, [BlockKey; 3]) {
    let mut sim = Simulation::new(SimConfig::default());
    let support = sim
        .spawn(SpawnRequest::new(BlockKind::Immutable, cell(0)))
        .unwrap();
    let target = sim
        .spawn(SpawnRequest::new(BlockKind::Destructible, cell(1)).with_health(50.0))
        .unwrap();
    let above = sim
        .spawn(SpawnRequest::new(BlockKind::Immutable, cell(2)))
        .unwrap();
    sim.run_until_rest(DT, 10);
    assert!(sim.is_at_rest());
    sim.take_events();
    (sim, [support, target, above])
}

fn destroyed(events: &[SimEvent]) -> Vec<&SimEvent> {
    events
        .iter()
        .filter(|e| matches!(e, SimEvent::Destroyed { .. }))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn zero_damage_changes_nothing() {
    let (mut sim, [_, target, _]) = stack();

    assert_eq!(
        sim.apply_damage(target, 0.0, None),
        DamageOutcome::Unchanged { health: 50.0 }
    );
    assert_eq!(
        sim.apply_damage(target, -5.0, None),
        DamageOutcome::Unchanged { health: 50.0 }
    );
    assert_eq!(sim.block(target).unwrap().health().unwrap().current(), 50.0);
    assert!(sim.take_events().is_empty());
}

#[test]
fn lethal_damage_on_unsupported_block_destroys_once_and_wakes_above() {
    let (mut sim, [support, target, above]) = stack();
    sim.remove(support).unwrap();
    assert_eq!(sim.block(target).unwrap().fall_state(), FallState::Falling);
    sim.take_events();

    let outcome = sim.apply_damage(target, 60.0, Some(ActorRef(7)));
    assert_eq!(outcome, DamageOutcome::Destroyed);
    assert!(sim.block(target).is_none());
    assert_eq!(sim.block(above).unwrap().fall_state(), FallState::Falling);

    let events = sim.take_events();
    assert_eq!(
        destroyed(&events),
        vec![&SimEvent::Destroyed {
            block: target,
            kind: BlockKind::Destructible,
            position: cell(1),
            instigator: Some(ActorRef(7)),
        }]
    );
    let woke = events
        .iter()
        .position(|e| {
            *e == SimEvent::Woken {
                block: above,
                by: Some(target),
            }
        });
    let gone = events
        .iter()
        .position(|e| matches!(e, SimEvent::Destroyed { .. }));
    assert!(woke < gone, "block above must be woken before the announcement");

    assert_eq!(sim.apply_damage(target, 60.0, None), DamageOutcome::Missing);
    assert!(destroyed(&sim.take_events()).is_empty());
}

#[test]
fn partial_damage_then_heal_clamps_to_max() {
    let (mut sim, [_, target, _]) = stack();

    assert_eq!(
        sim.apply_damage(target, 20.0, None),
        DamageOutcome::Changed { health: 30.0 }
    );
    assert_eq!(sim.heal(target, 100.0), DamageOutcome::Changed { health: 50.0 });
    assert_eq!(sim.heal(target, 5.0), DamageOutcome::Unchanged { health: 50.0 });
    assert_eq!(
        sim.block(target).unwrap().fall_state(),
        FallState::Resting
    );
}

#[test]
fn blocks_without_health_are_immune() {
    let (mut sim, [support, _, above]) = stack();

    assert_eq!(sim.apply_damage(support, 1_000.0, None), DamageOutcome::Immune);
    assert!(!sim.destroy(above, None));
    assert!(sim.block(support).is_some());
    assert!(sim.block(above).is_some());
}

#[test]
fn destroying_a_resting_block_drops_the_column_above() {
    let (mut sim, [_, target, above]) = stack();

    assert!(sim.destroy(target, None));
    assert!(!sim.destroy(target, None));
    assert_eq!(sim.block(above).unwrap().fall_state(), FallState::Falling);

    sim.run_until_rest(DT, 600);
    assert_eq!(sim.block(above).unwrap().position(), cell(1));
}

#[test]
fn default_destructible_dies_to_a_single_point() {
    let mut sim = Simulation::new(SimConfig::default());
    let key = sim
        .spawn(SpawnRequest::new(BlockKind::Destructible, cell(0)))
        .unwrap();

    assert_eq!(sim.apply_damage(key, 0.5, None), DamageOutcome::Changed { health: 0.5 });
    assert_eq!(sim.apply_damage(key, 0.5, None), DamageOutcome::Destroyed);
    assert!(sim.world().is_empty());
}

#[test]
fn destroying_mid_fall_stops_tracking_the_block() {
    let mut sim = Simulation::new(SimConfig::default());
    let key = sim
        .spawn(SpawnRequest::new(BlockKind::Warning, cell(6)).with_health(3.0))
        .unwrap();
    for _ in 0..5 {
        sim.step(DT);
    }
    assert_eq!(sim.block(key).unwrap().fall_state(), FallState::Falling);

    assert!(sim.destroy(key, Some(ActorRef(1))));
    assert!(sim.is_at_rest());
    assert!(sim.world().is_empty());
    assert_eq!(sim.world().index().bucket_count(), 0);
    assert_eq!(sim.step(DT).processed, 0);
}
