use std::time::Duration;

use swarm_arena_core::{
    Command, EntityId, EntityTemplate, Event, PlacementKind, RoundDefinition, ScoreConfig,
    SpawnEvent, TemplateId,
};
use swarm_arena_system_round_timeline::RoundTimeline;
use swarm_arena_world::{self as world, query, World, WorldConfig};

fn grunt_template() -> EntityTemplate {
    EntityTemplate {
        id: TemplateId::new(0),
        name: "grunt".to_owned(),
        placement: PlacementKind::Scatter,
    }
}

fn single_spawn_round(duration_secs: u64) -> RoundDefinition {
    RoundDefinition {
        duration: Duration::from_secs(duration_secs),
        schedule: vec![SpawnEvent {
            at: Duration::ZERO,
            template: TemplateId::new(0),
            count: 1,
            interval: Duration::ZERO,
        }],
    }
}

/// Runs one tick through world and scheduler, destroying every live entity
/// immediately so the population returns to zero before the next tick.
fn tick_with_instant_despawn(
    world: &mut World,
    timeline: &mut RoundTimeline,
) -> (Vec<Event>, Vec<Event>) {
    let mut world_events = Vec::new();
    world::apply(
        world,
        Command::Tick {
            dt: Duration::from_secs(1),
        },
        &mut world_events,
    );

    let mut commands = Vec::new();
    let mut system_events = Vec::new();
    timeline.handle(
        &world_events,
        query::population(world),
        &mut commands,
        &mut system_events,
    );

    let mut spawn_events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut spawn_events);
    }

    let spawned: Vec<EntityId> = spawn_events
        .iter()
        .filter_map(|event| match event {
            Event::EntitySpawned { entity, .. } => Some(*entity),
            _ => None,
        })
        .collect();
    for entity in spawned {
        world::apply(world, Command::DestroyEntity { entity }, &mut spawn_events);
    }

    (spawn_events, system_events)
}

#[test]
fn round_clears_at_first_tick_with_elapsed_duration_and_empty_arena() {
    let mut world = World::new(WorldConfig::default(), vec![grunt_template()]);
    let mut timeline =
        RoundTimeline::new(vec![single_spawn_round(10)], ScoreConfig::default()).expect("timeline");

    let mut cleared_at_tick = None;
    for tick in 1..=12_u32 {
        let (_, system_events) = tick_with_instant_despawn(&mut world, &mut timeline);
        if system_events
            .iter()
            .any(|event| matches!(event, Event::RoundCleared { .. }))
        {
            cleared_at_tick = Some(tick);
            break;
        }
    }

    // Population hits zero on tick 1 already; the clear still waits for the
    // spawning window to close at elapsed == 10.
    assert_eq!(cleared_at_tick, Some(10));
    assert_eq!(query::population(&world), 0);
    assert_eq!(timeline.total_score(), 1_000);
}

#[test]
fn survivors_defer_the_clear_until_destroyed() {
    let mut world = World::new(WorldConfig::default(), vec![grunt_template()]);
    let mut timeline =
        RoundTimeline::new(vec![single_spawn_round(2)], ScoreConfig::default()).expect("timeline");

    // Tick 1 spawns the grunt; nobody destroys it.
    let mut world_events = Vec::new();
    world::apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_secs(1),
        },
        &mut world_events,
    );
    let mut commands = Vec::new();
    let mut system_events = Vec::new();
    timeline.handle(
        &world_events,
        query::population(&world),
        &mut commands,
        &mut system_events,
    );
    let mut spawn_events = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut spawn_events);
    }
    assert_eq!(query::population(&world), 1);

    // The window closes but the survivor blocks the clear indefinitely.
    for _ in 0..5 {
        let mut world_events = Vec::new();
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
            &mut world_events,
        );
        let mut commands = Vec::new();
        let mut system_events = Vec::new();
        timeline.handle(
            &world_events,
            query::population(&world),
            &mut commands,
            &mut system_events,
        );
        assert!(system_events.is_empty());
    }
    assert!(timeline.is_spawning_stopped());

    // Destroying the survivor lets the very next tick clear the round.
    let survivor = query::entity_view(&world)[0].id;
    let mut events = Vec::new();
    world::apply(&mut world, Command::DestroyEntity { entity: survivor }, &mut events);

    let (_, system_events) = tick_with_instant_despawn(&mut world, &mut timeline);
    assert!(system_events
        .iter()
        .any(|event| matches!(event, Event::RoundCleared { round: 1, .. })));
}
