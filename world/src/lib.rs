#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Swarm Arena engine.
//!
//! The world owns the spawn gateway, the live-entity records with their
//! one-shot despawn reporters, the population ledger, and the player stat
//! accumulators. All mutation flows through [`apply`]; systems read back
//! through the [`query`] module.

mod stats;

use stats::{PlayerStats, WardState};
use swarm_arena_core::{
    Command, EntityId, EntityTemplate, Event, PlacementKind, SkillId, SpawnError, SpawnPoint,
    TemplateId,
};

const PLACEMENT_RNG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const PLACEMENT_RNG_INCREMENT: u64 = 1;

/// Horizontal and vertical bounds used for scatter placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnBounds {
    /// Smallest horizontal coordinate the gateway may choose.
    pub x_min: f32,
    /// Largest horizontal coordinate the gateway may choose.
    pub x_max: f32,
    /// Fixed height every scatter-placed entity spawns at.
    pub y: f32,
}

impl Default for SpawnBounds {
    fn default() -> Self {
        Self {
            x_min: -2.4,
            x_max: 2.5,
            y: 4.6,
        }
    }
}

/// Configuration parameters required to construct the world.
#[derive(Clone, Copy, Debug)]
pub struct WorldConfig {
    /// Scatter placement bounds.
    pub spawn_bounds: SpawnBounds,
    /// Fixed point boss-type templates spawn at, when configured.
    pub boss_anchor: Option<SpawnPoint>,
    /// Seed for the deterministic placement stream.
    pub placement_seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            spawn_bounds: SpawnBounds::default(),
            boss_anchor: None,
            placement_seed: 0x42f0_e1eb_d4a5_3c21,
        }
    }
}

/// Live-population counter gating round-clear detection.
///
/// The ledger is a bare counter with no per-entity identity tracking;
/// once-per-entity reporting is guaranteed by the [`DespawnReporter`] owned
/// by each entity record, not by the ledger itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct PopulationLedger {
    alive: u32,
}

impl PopulationLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one spawned entity.
    pub fn on_spawned(&mut self) {
        self.alive = self.alive.saturating_add(1);
    }

    /// Records one despawned entity, flooring the count at zero.
    pub fn on_despawned(&mut self) {
        self.alive = self.alive.saturating_sub(1);
    }

    /// Number of entities currently alive.
    #[must_use]
    pub const fn alive(&self) -> u32 {
        self.alive
    }
}

/// One-shot despawn reporter bound to a single entity record.
///
/// The first report forwards to the ledger; every later report is a no-op,
/// so duplicate teardown notifications can never double-decrement.
#[derive(Clone, Copy, Debug, Default)]
pub struct DespawnReporter {
    reported: bool,
}

impl DespawnReporter {
    /// Creates a reporter that has not yet reported.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports the despawn to the ledger; returns whether this call was the
    /// one that actually decremented.
    pub fn report(&mut self, ledger: &mut PopulationLedger) -> bool {
        if self.reported {
            return false;
        }
        self.reported = true;
        ledger.on_despawned();
        true
    }
}

#[derive(Clone, Copy, Debug)]
struct EntityRecord {
    id: EntityId,
    template: TemplateId,
    position: SpawnPoint,
    reporter: DespawnReporter,
}

/// Represents the authoritative Swarm Arena world state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    templates: Vec<EntityTemplate>,
    entities: Vec<EntityRecord>,
    next_entity: u32,
    ledger: PopulationLedger,
    player: PlayerStats,
    ward: WardState,
    skills: Vec<SkillId>,
    placement_rng: u64,
}

impl World {
    /// Creates a new world from configuration and the template catalog.
    #[must_use]
    pub fn new(config: WorldConfig, templates: Vec<EntityTemplate>) -> Self {
        Self {
            templates,
            entities: Vec::new(),
            next_entity: 0,
            ledger: PopulationLedger::new(),
            player: PlayerStats::new(),
            ward: WardState::new(),
            skills: Vec::new(),
            placement_rng: config.placement_seed,
            config,
        }
    }

    fn next_unit(&mut self) -> f32 {
        self.placement_rng = self
            .placement_rng
            .wrapping_mul(PLACEMENT_RNG_MULTIPLIER)
            .wrapping_add(PLACEMENT_RNG_INCREMENT);
        const SCALE: f64 = 1.0 / ((1_u64 << 53) as f64);
        ((self.placement_rng >> 11) as f64 * SCALE) as f32
    }

    fn scatter_position(&mut self) -> SpawnPoint {
        let bounds = self.config.spawn_bounds;
        let x = bounds.x_min + self.next_unit() * (bounds.x_max - bounds.x_min);
        SpawnPoint::new(x, bounds.y)
    }

    fn spawn_entity(&mut self, template: TemplateId, out_events: &mut Vec<Event>) {
        let Some(definition) = self
            .templates
            .iter()
            .find(|candidate| candidate.id == template)
            .cloned()
        else {
            log::warn!("spawn request for unregistered template {template:?}");
            out_events.push(Event::SpawnRejected {
                template,
                reason: SpawnError::UnknownTemplate,
            });
            return;
        };

        let position = match definition.placement {
            PlacementKind::Scatter => self.scatter_position(),
            PlacementKind::BossAnchor => match self.config.boss_anchor {
                Some(anchor) => anchor,
                None => {
                    log::error!("boss anchor is not configured; cannot spawn {}", definition.name);
                    out_events.push(Event::SpawnRejected {
                        template,
                        reason: SpawnError::MissingBossAnchor,
                    });
                    return;
                }
            },
        };

        let id = EntityId::new(self.next_entity);
        self.next_entity = self.next_entity.wrapping_add(1);
        self.entities.push(EntityRecord {
            id,
            template,
            position,
            reporter: DespawnReporter::new(),
        });
        self.ledger.on_spawned();
        out_events.push(Event::EntitySpawned {
            entity: id,
            template,
            position,
        });
    }

    fn destroy_entity(&mut self, entity: EntityId, out_events: &mut Vec<Event>) {
        let Some(index) = self.entities.iter().position(|record| record.id == entity) else {
            log::debug!("destroy request for unknown entity {entity:?}");
            return;
        };

        let mut record = self.entities.remove(index);
        if record.reporter.report(&mut self.ledger) {
            out_events.push(Event::EntityDespawned {
                entity: record.id,
                template: record.template,
            });
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::SpawnEntity { template } => {
            world.spawn_entity(template, out_events);
        }
        Command::DestroyEntity { entity } => {
            world.destroy_entity(entity, out_events);
        }
        Command::AdjustMoveSpeed { delta } => {
            world.player.add_move_speed(delta);
        }
        Command::AdjustDashCooldown { delta } => {
            world.player.add_dash_cooldown(delta);
        }
        Command::AdjustMaxHp { delta } => {
            world.player.add_max_hp(delta);
        }
        Command::AddHealPassive { trigger, amount } => {
            world.player.add_heal_passive(trigger, amount);
        }
        Command::UnlockWard => {
            if world.ward.unlock() {
                log::info!("ward passive unlocked");
                out_events.push(Event::WardUnlocked);
            }
        }
        Command::UpgradeWard {
            damage_add,
            radius_add,
            angle_add,
        } => {
            if world.ward.is_unlocked() {
                world.ward.upgrade(damage_add, radius_add, angle_add);
            } else {
                log::warn!("ward upgrade ignored while the ward is locked");
            }
        }
        Command::AttachSkill { skill } => {
            world.skills.push(skill);
            out_events.push(Event::SkillAttached { skill });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;
    use swarm_arena_core::{EntitySnapshot, PlayerStatsSnapshot, SkillId, WardSnapshot};

    /// Number of entities currently alive in the arena.
    #[must_use]
    pub fn population(world: &World) -> u32 {
        world.ledger.alive()
    }

    /// Captures a read-only view of the live entities in deterministic order.
    #[must_use]
    pub fn entity_view(world: &World) -> Vec<EntitySnapshot> {
        let mut snapshots: Vec<EntitySnapshot> = world
            .entities
            .iter()
            .map(|record| EntitySnapshot {
                id: record.id,
                template: record.template,
                position: record.position,
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        snapshots
    }

    /// Captures the player's accumulated stats.
    #[must_use]
    pub fn player_stats(world: &World) -> PlayerStatsSnapshot {
        world.player.snapshot()
    }

    /// Captures the ward passive state.
    #[must_use]
    pub fn ward(world: &World) -> WardSnapshot {
        world.ward.snapshot()
    }

    /// Skills attached to the player, in attachment order.
    #[must_use]
    pub fn attached_skills(world: &World) -> &[SkillId] {
        &world.skills
    }
}
