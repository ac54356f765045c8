#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line driver that runs a full encounter session headlessly.
//!
//! The driver owns everything the engine treats as external: the tick clock,
//! a stand-in combat layer that destroys entities after a short lifetime, a
//! stub animation layer for the boss, the pattern-action registry, and the
//! scripted player that picks one of every three reward offers. Systems are
//! advanced in a fixed order each tick and talk to each other only through
//! the routed command/event queue.

mod config;

use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use swarm_arena_core::{
    ActionCatalogView, ActionId, AnimationRig, AnimationSnapshot, AnimationSourceId, Command,
    EntityId, Event, PlacementKind, RewardId, SpawnPoint, TemplateId,
};
use swarm_arena_system_boss_patterns::BossPatterns;
use swarm_arena_system_reward_choice::RewardChoice;
use swarm_arena_system_round_timeline::RoundTimeline;
use swarm_arena_world::{self as world, query, World, WorldConfig};

use config::EncounterConfig;

const GRUNT_LIFETIME: Duration = Duration::from_millis(2_500);
const BOSS_LIFETIME: Duration = Duration::from_secs(8);
const CLIP_SECONDS: f32 = 1.2;
const IDLE_STATE: &str = "Idle";

/// Headless driver for the Swarm Arena encounter engine.
#[derive(Debug, Parser)]
#[command(name = "swarm-arena")]
struct Args {
    /// Global seed shared by every deterministic stream.
    #[arg(long, default_value_t = 0x5eed_cafe)]
    seed: u64,
    /// Number of simulation ticks to run.
    #[arg(long, default_value_t = 600)]
    ticks: u32,
    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,
    /// JSON encounter tables replacing the built-in demo.
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Entry point for the Swarm Arena command-line driver.
fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let encounter = match &args.config {
        Some(path) => EncounterConfig::load(path)?,
        None => EncounterConfig::demo(),
    };
    encounter.validate()?;

    run(&args, encounter)
}

fn run(args: &Args, encounter: EncounterConfig) -> Result<()> {
    let mut timeline = match RoundTimeline::new(encounter.rounds.clone(), encounter.score) {
        Ok(timeline) => timeline,
        Err(error) => {
            // Fatal for the session, not for the process.
            log::error!("encounter cannot start: {error}");
            return Ok(());
        }
    };

    let reward_titles: Vec<(RewardId, String)> = encounter
        .rewards
        .iter()
        .map(|reward| (reward.id, reward.title.clone()))
        .collect();
    let boss_templates: Vec<TemplateId> = encounter
        .templates
        .iter()
        .filter(|template| template.placement == PlacementKind::BossAnchor)
        .map(|template| template.id)
        .collect();
    let summon_template = encounter
        .templates
        .iter()
        .find(|template| template.placement == PlacementKind::Scatter)
        .map(|template| template.id);

    let boss_anchor = encounter.boss_anchor;
    let mut world = World::new(
        WorldConfig {
            boss_anchor,
            placement_seed: args.seed,
            ..WorldConfig::default()
        },
        encounter.templates,
    );
    let mut rewards = RewardChoice::new(encounter.reward_tables, encounter.rewards, args.seed);
    let mut boss = BossPatterns::new(
        encounter.boss_patterns.clone(),
        encounter.boss_cooldown,
        args.seed,
    );

    let registry = ActionRegistry::demo(summon_template);
    let action_ids = registry.ids();
    let mut animations = AnimationLayer::new(&encounter.boss_patterns);
    let mut picker = ChaCha8Rng::seed_from_u64(args.seed);

    let dt = Duration::from_millis(args.tick_ms);
    let boss_position = boss_anchor.unwrap_or(SpawnPoint::new(0.0, 0.0));
    let mut clock = Duration::ZERO;
    let mut lifetimes: Vec<(EntityId, Duration)> = Vec::new();
    let mut queue: VecDeque<Event> = VecDeque::new();
    let mut rounds_cleared = 0_u32;
    let mut spawned = 0_u32;
    let mut destroyed = 0_u32;

    for _ in 0..args.ticks {
        clock = clock.saturating_add(dt);

        // 1) Advance the world clock.
        let mut tick_events = Vec::new();
        world::apply(&mut world, Command::Tick { dt }, &mut tick_events);

        // 2) Stand-in combat: destroy entities whose lifetime ran out.
        let due: Vec<EntityId> = lifetimes
            .iter()
            .filter(|(_, deadline)| *deadline <= clock)
            .map(|(entity, _)| *entity)
            .collect();
        lifetimes.retain(|(_, deadline)| *deadline > clock);
        for entity in due {
            world::apply(&mut world, Command::DestroyEntity { entity }, &mut tick_events);
        }

        // 3) Round timeline.
        let mut commands = Vec::new();
        let mut system_events = Vec::new();
        timeline.handle(
            &tick_events,
            query::population(&world),
            &mut commands,
            &mut system_events,
        );
        queue.extend(tick_events);
        queue.extend(system_events);
        apply_commands(&mut world, commands, &mut queue);

        // 4) Boss pattern selector, ticked only while a boss is on the field.
        animations.advance(dt);
        let boss_alive = query::entity_view(&world)
            .iter()
            .any(|entity| boss_templates.contains(&entity.template));
        if boss_alive {
            let player = player_position(clock);
            let rig = animations.rig();
            let mut boss_events = Vec::new();
            boss.handle(
                dt,
                boss_position,
                SpawnPoint::new(player.x, player.y),
                &rig,
                ActionCatalogView::new(&action_ids),
                &mut boss_events,
            );
            queue.extend(boss_events);
        }

        // 5) Route queued events until the tick settles.
        while let Some(event) = queue.pop_front() {
            match event {
                Event::EntitySpawned {
                    entity, template, ..
                } => {
                    spawned += 1;
                    let lifetime = if boss_templates.contains(&template) {
                        BOSS_LIFETIME
                    } else {
                        GRUNT_LIFETIME
                    };
                    lifetimes.push((entity, clock.saturating_add(lifetime)));
                }
                Event::EntityDespawned { .. } => destroyed += 1,
                Event::RoundCleared { round, score, .. } => {
                    rounds_cleared += 1;
                    log::info!("round {round} cleared for {score}");
                    let mut events = Vec::new();
                    rewards.handle_round_cleared(round, query::ward(&world), &mut events);
                    queue.extend(events);
                }
                Event::RewardOffered { round, options } => {
                    let pick = options[picker.gen_range(0..options.len())];
                    log::info!(
                        "round {round} offer {:?}; picking {}",
                        options,
                        reward_title(&reward_titles, pick)
                    );
                    let mut commands = Vec::new();
                    let mut events = Vec::new();
                    rewards.handle_picked(pick, &mut commands, &mut events);
                    apply_commands(&mut world, commands, &mut queue);
                    queue.extend(events);
                }
                Event::RewardSettled { .. } => timeline.advance_to_next_round(),
                Event::BossAnimationRequested { source, trigger } => {
                    animations.play(source, &trigger);
                }
                Event::BossPatternFired { pattern, action } => {
                    log::info!("boss pattern {pattern:?} fired");
                    let mut commands = Vec::new();
                    registry.execute(action, &mut commands);
                    apply_commands(&mut world, commands, &mut queue);
                }
                Event::WardUnlocked => log::info!("the ward answers"),
                Event::SkillAttached { skill } => log::info!("skill {skill:?} attached"),
                Event::TimeAdvanced { .. } | Event::SpawnRejected { .. } => {}
            }
        }
    }

    let stats = query::player_stats(&world);
    println!("Session finished after {} ticks.", args.ticks);
    println!(
        "  rounds cleared: {rounds_cleared} (next round {}), total score {}",
        timeline.round_number(),
        timeline.total_score()
    );
    println!("  entities spawned {spawned}, destroyed {destroyed}, alive {}", query::population(&world));
    println!(
        "  player: move speed {:.2}, dash cooldown {:.2}, max hp {}, skills {}",
        stats.final_move_speed,
        stats.final_dash_cooldown,
        stats.final_max_hp,
        query::attached_skills(&world).len()
    );
    Ok(())
}

fn apply_commands(world: &mut World, commands: Vec<Command>, queue: &mut VecDeque<Event>) {
    for command in commands {
        let mut events = Vec::new();
        world::apply(world, command, &mut events);
        queue.extend(events);
    }
}

fn reward_title(titles: &[(RewardId, String)], reward: RewardId) -> String {
    titles
        .iter()
        .find(|(id, _)| *id == reward)
        .map(|(_, title)| title.clone())
        .unwrap_or_else(|| format!("{reward:?}"))
}

/// Scripted player drifting toward and away from the boss anchor so every
/// pattern range sees traffic.
fn player_position(clock: Duration) -> Vec2 {
    let t = clock.as_secs_f32();
    let sway = Vec2::new((t * 0.35).sin(), (t * 0.2).cos());
    Vec2::new(1.8, 5.5) + sway * Vec2::new(1.6, 2.2)
}

/// Boss pattern actions the driver can execute, resolved once at startup.
#[derive(Clone, Copy, Debug)]
enum PatternAction {
    Shockwave,
    Strike,
    SummonAdds { template: TemplateId, count: u32 },
}

struct ActionRegistry {
    entries: Vec<(ActionId, PatternAction)>,
}

impl ActionRegistry {
    /// Registry matching the demo pattern set. The summon action is only
    /// registered when a scatter template exists to summon.
    fn demo(summon_template: Option<TemplateId>) -> Self {
        let mut entries = vec![
            (ActionId::new(0), PatternAction::Shockwave),
            (ActionId::new(1), PatternAction::Strike),
        ];
        if let Some(template) = summon_template {
            entries.push((
                ActionId::new(2),
                PatternAction::SummonAdds { template, count: 2 },
            ));
        }
        Self { entries }
    }

    fn ids(&self) -> Vec<ActionId> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    fn execute(&self, action: ActionId, out: &mut Vec<Command>) {
        let Some((_, behaviour)) = self.entries.iter().find(|(id, _)| *id == action) else {
            log::warn!("no handler registered for {action:?}");
            return;
        };
        match *behaviour {
            PatternAction::Shockwave => log::info!("shockwave ripples across the arena"),
            PatternAction::Strike => log::info!("the boss strikes at the player"),
            PatternAction::SummonAdds { template, count } => {
                log::info!("the boss calls {count} adds");
                for _ in 0..count {
                    out.push(Command::SpawnEntity { template });
                }
            }
        }
    }
}

/// Stub animation layer standing in for the external animator.
///
/// Triggered states play forward at a fixed clip length and drop back to
/// idle shortly after completing, which is enough for the selector to
/// observe the fire fraction and the completion point.
struct AnimationLayer {
    primary: AnimationStub,
    overrides: Vec<(AnimationSourceId, AnimationStub)>,
    transitions: Vec<(String, Option<AnimationSourceId>, String)>,
}

impl AnimationLayer {
    fn new(patterns: &[swarm_arena_core::BossPatternDefinition]) -> Self {
        let mut overrides: Vec<(AnimationSourceId, AnimationStub)> = Vec::new();
        let mut transitions = Vec::new();
        for pattern in patterns {
            transitions.push((
                pattern.trigger.clone(),
                pattern.animation_source,
                pattern.state_name.clone(),
            ));
            if let Some(source) = pattern.animation_source {
                if overrides.iter().all(|(id, _)| *id != source) {
                    overrides.push((source, AnimationStub::idle()));
                }
            }
        }
        Self {
            primary: AnimationStub::idle(),
            overrides,
            transitions,
        }
    }

    fn play(&mut self, source: Option<AnimationSourceId>, trigger: &str) {
        let Some((_, _, state)) = self
            .transitions
            .iter()
            .find(|(name, candidate, _)| name == trigger && *candidate == source)
        else {
            log::warn!("animation trigger '{trigger}' has no transition");
            return;
        };
        let state = state.clone();
        match source {
            None => self.primary.play(&state),
            Some(id) => {
                if let Some((_, stub)) = self.overrides.iter_mut().find(|(candidate, _)| *candidate == id)
                {
                    stub.play(&state);
                }
            }
        }
    }

    fn advance(&mut self, dt: Duration) {
        self.primary.advance(dt);
        for (_, stub) in &mut self.overrides {
            stub.advance(dt);
        }
    }

    fn rig(&self) -> AnimationRig {
        AnimationRig::new(
            self.primary.snapshot(),
            self.overrides
                .iter()
                .map(|(id, stub)| (*id, stub.snapshot()))
                .collect(),
        )
    }
}

struct AnimationStub {
    state: String,
    time: f32,
}

impl AnimationStub {
    fn idle() -> Self {
        Self {
            state: IDLE_STATE.to_owned(),
            time: 0.0,
        }
    }

    fn play(&mut self, state: &str) {
        self.state = state.to_owned();
        self.time = 0.0;
    }

    fn advance(&mut self, dt: Duration) {
        if self.state == IDLE_STATE {
            return;
        }
        self.time += dt.as_secs_f32() / CLIP_SECONDS;
        // Linger a little past completion before the animator exits the
        // state, the way a real transition would.
        if self.time >= 1.25 {
            self.state = IDLE_STATE.to_owned();
            self.time = 0.0;
        }
    }

    fn snapshot(&self) -> AnimationSnapshot {
        AnimationSnapshot {
            state: self.state.clone(),
            normalized_time: self.time,
        }
    }
}
