#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Swarm Arena engine.
//!
//! This crate defines the message surface that connects the driver adapter,
//! the authoritative world, and the pure systems. The driver submits
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point and broadcasts [`Event`] values, and
//! systems consume event streams plus immutable snapshots and respond with
//! new command batches. Authoring data (rounds, rewards, boss patterns) is
//! defined here as well so every crate agrees on its shape.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Number of reward offers presented after a cleared round.
///
/// The presentation layout reserves exactly three card slots; negotiations
/// that cannot fill all three skip the offer entirely.
pub const REWARD_OFFER_COUNT: usize = 3;

/// Unique identifier assigned to a spawned entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of an entity template registered with the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(u32);

impl TemplateId {
    /// Creates a new template identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a reward definition in the reward catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RewardId(u32);

impl RewardId {
    /// Creates a new reward identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a boss attack pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PatternId(u32);

impl PatternId {
    /// Creates a new pattern identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of an externally implemented pattern action handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(u32);

impl ActionId {
    /// Creates a new action identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of an attachable active skill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SkillId(u32);

impl SkillId {
    /// Creates a new skill identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of an alternate animation source a boss pattern may track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnimationSourceId(u32);

impl AnimationSourceId {
    /// Creates a new animation source identifier with the provided value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Position in arena space expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    x: f32,
    y: f32,
}

impl SpawnPoint {
    /// Creates a new point from explicit coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate of the point.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate of the point.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Computes the Euclidean distance between two points.
    #[must_use]
    pub fn distance_to(self, other: SpawnPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that the spawn gateway place a new entity into the arena.
    SpawnEntity {
        /// Template describing the entity to instantiate.
        template: TemplateId,
    },
    /// Requests destruction of a previously spawned entity.
    DestroyEntity {
        /// Identifier of the entity to remove.
        entity: EntityId,
    },
    /// Accumulates a movement speed bonus on the player.
    AdjustMoveSpeed {
        /// Signed speed delta in world units per second.
        delta: f32,
    },
    /// Accumulates a dash cooldown bonus on the player (negative shortens).
    AdjustDashCooldown {
        /// Signed cooldown delta in seconds.
        delta: f32,
    },
    /// Accumulates a maximum health bonus on the player.
    AdjustMaxHp {
        /// Signed health delta in hit points.
        delta: i32,
    },
    /// Stores a heal passive magnitude on the player state.
    AddHealPassive {
        /// Moment at which the heal fires.
        trigger: HealTrigger,
        /// Hit points restored when the trigger fires.
        amount: u32,
    },
    /// Unlocks the ward passive, enabling its upgrades.
    UnlockWard,
    /// Accumulates incremental buffs on the unlocked ward passive.
    UpgradeWard {
        /// Additional ward damage.
        damage_add: i32,
        /// Additional ward radius in world units.
        radius_add: f32,
        /// Additional ward cone angle in degrees.
        angle_add: f32,
    },
    /// Attaches an active skill to the player.
    AttachSkill {
        /// Identifier of the skill to attach.
        skill: SkillId,
    },
}

/// Moments at which a stored heal passive restores health.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealTrigger {
    /// Fires whenever the player defeats an enemy.
    OnKill,
    /// Fires when a round transitions to cleared.
    OnRoundClear,
}

/// Events broadcast after processing commands or advancing systems.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that the spawn gateway placed a new entity.
    EntitySpawned {
        /// Identifier assigned to the entity by the world.
        entity: EntityId,
        /// Template the entity was instantiated from.
        template: TemplateId,
        /// Position the entity occupies after spawning.
        position: SpawnPoint,
    },
    /// Confirms that an entity was destroyed and reported to the ledger.
    EntityDespawned {
        /// Identifier of the removed entity.
        entity: EntityId,
        /// Template the entity was instantiated from.
        template: TemplateId,
    },
    /// Reports that a spawn request could not be honoured.
    SpawnRejected {
        /// Template named in the rejected request.
        template: TemplateId,
        /// Specific reason the spawn failed.
        reason: SpawnError,
    },
    /// Confirms that the ward passive became unlocked.
    WardUnlocked,
    /// Confirms that an active skill was attached to the player.
    SkillAttached {
        /// Identifier of the attached skill.
        skill: SkillId,
    },
    /// Announces that a round satisfied its clear condition.
    RoundCleared {
        /// Cleared round number, 1-based.
        round: u32,
        /// Score awarded for this clear.
        score: u32,
        /// Running total after accumulating the clear score.
        total_score: u64,
    },
    /// Presents three reward offers for player selection.
    RewardOffered {
        /// Round number the offer belongs to, 1-based.
        round: u32,
        /// The offered rewards in selection order.
        options: [RewardId; REWARD_OFFER_COUNT],
    },
    /// Signals that reward negotiation finished and the next round may start.
    RewardSettled {
        /// Round number whose negotiation concluded, 1-based.
        round: u32,
    },
    /// Requests that the animation layer start a boss attack transition.
    BossAnimationRequested {
        /// Alternate animation source to drive, when the pattern overrides it.
        source: Option<AnimationSourceId>,
        /// Trigger name understood by the animation layer.
        trigger: String,
    },
    /// Reports that an attacking pattern reached its fire point.
    BossPatternFired {
        /// Pattern whose effect fired.
        pattern: PatternId,
        /// Action handler the driver should execute.
        action: ActionId,
    },
}

/// Reasons a spawn request may be rejected by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnError {
    /// No template with the requested identifier is registered.
    UnknownTemplate,
    /// The template requires the boss anchor but none is configured.
    MissingBossAnchor,
}

/// Authoring description of a single timed round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundDefinition {
    /// Length of the spawning window measured from round start.
    pub duration: Duration,
    /// Timed spawn events, evaluated in authoring order.
    pub schedule: Vec<SpawnEvent>,
}

/// One scheduled spawn within a round. Fires at most once per round instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnEvent {
    /// Time since round start at which the event triggers.
    pub at: Duration,
    /// Template spawned by the event.
    pub template: TemplateId,
    /// Number of entities to spawn.
    pub count: u32,
    /// Delay between successive spawns; zero spawns the whole count at once.
    pub interval: Duration,
}

/// Authoring description of a spawnable entity kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityTemplate {
    /// Identifier spawn requests refer to.
    pub id: TemplateId,
    /// Human-readable name used in logs.
    pub name: String,
    /// How the gateway chooses the entity's spawn position.
    pub placement: PlacementKind,
}

/// Spawn placement modes supported by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementKind {
    /// Random horizontal position inside the configured bounds at a fixed height.
    Scatter,
    /// The fixed boss anchor configured on the world.
    BossAnchor,
}

/// One weighted entry in a per-round reward table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSlot {
    /// Reward offered by the slot.
    pub reward: RewardId,
    /// Selection weight; zero or negative excludes the slot.
    pub weight: i32,
}

/// Weighted reward offers attached to a specific round number.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardTable {
    /// Round the table applies to, 1-based.
    pub round: u32,
    /// Candidate slots sampled when the round clears.
    pub slots: Vec<RewardSlot>,
}

/// Authoring description of a single reward and its effects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardDefinition {
    /// Identifier reward slots refer to.
    pub id: RewardId,
    /// Card title shown by the presentation layer.
    pub title: String,
    /// Card body text shown by the presentation layer.
    pub description: String,
    /// Movement speed delta accumulated on selection.
    pub move_speed_add: f32,
    /// Dash cooldown delta accumulated on selection; negative shortens.
    pub dash_cooldown_add: f32,
    /// Maximum health delta accumulated on selection.
    pub max_hp_add: i32,
    /// Attack delta. Carried in authoring data but currently inert: the
    /// player state exposes no attack accumulator yet.
    pub attack_add: i32,
    /// Heal amount stored for the on-kill trigger, when present.
    pub heal_on_kill: Option<u32>,
    /// Heal amount stored for the round-clear trigger, when present.
    pub heal_on_round_clear: Option<u32>,
    /// Ward passive unlock or upgrade payload, when present.
    pub ward: Option<WardGrant>,
    /// Active skill attached to the player on selection, when present.
    pub skill: Option<SkillId>,
}

/// Ward passive payload carried by a reward.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WardGrant {
    /// Unlocks the ward passive.
    pub unlock: bool,
    /// Additional ward damage applied while unlocked.
    pub damage_add: i32,
    /// Additional ward radius applied while unlocked.
    pub radius_add: f32,
    /// Additional ward cone angle applied while unlocked.
    pub angle_add: f32,
}

impl WardGrant {
    /// Reports whether the grant carries any incremental upgrade values.
    #[must_use]
    pub fn is_upgrade(&self) -> bool {
        self.damage_add != 0
            || self.radius_add.abs() > f32::EPSILON
            || self.angle_add.abs() > f32::EPSILON
    }
}

/// Authoring description of one boss attack pattern.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BossPatternDefinition {
    /// Identifier selections and fire reports refer to.
    pub id: PatternId,
    /// Human-readable name used in logs.
    pub name: String,
    /// Disabled patterns never enter the candidate pool.
    pub enabled: bool,
    /// Selection weight; zero or negative excludes the pattern.
    pub weight: i32,
    /// Minimum engagement distance, inclusive.
    pub min_range: f32,
    /// Maximum engagement distance, inclusive.
    pub max_range: f32,
    /// Trigger name handed to the animation layer on selection.
    pub trigger: String,
    /// Animation state name the pattern expects while attacking.
    pub state_name: String,
    /// Normalized playback fraction at which the effect fires.
    pub fire_fraction: f32,
    /// Alternate animation source tracked instead of the primary one.
    pub animation_source: Option<AnimationSourceId>,
    /// External handler executed when the effect fires.
    pub action: ActionId,
}

/// Tuning for the score awarded when a round clears.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreConfig {
    /// Score awarded for clearing the first round.
    pub base_clear_score: u32,
    /// Multiplicative growth applied per round index.
    pub clear_growth: f64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            base_clear_score: 1_000,
            clear_growth: 1.10,
        }
    }
}

/// Immutable snapshot of the player's accumulated stats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerStatsSnapshot {
    /// Accumulated movement speed bonus.
    pub move_speed_bonus: f32,
    /// Movement speed the player actually uses (base + bonus).
    pub final_move_speed: f32,
    /// Accumulated dash cooldown bonus.
    pub dash_cooldown_bonus: f32,
    /// Dash cooldown the player actually uses (base + bonus).
    pub final_dash_cooldown: f32,
    /// Accumulated maximum health bonus.
    pub max_hp_bonus: i32,
    /// Maximum health the player actually uses (base + bonus, floored at 1).
    pub final_max_hp: i32,
    /// Stored heal magnitude for the on-kill trigger.
    pub heal_on_kill: u32,
    /// Stored heal magnitude for the round-clear trigger.
    pub heal_on_round_clear: u32,
}

/// Immutable snapshot of the ward passive state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WardSnapshot {
    /// Whether the ward has been unlocked.
    pub unlocked: bool,
    /// Current ward damage.
    pub damage: i32,
    /// Current ward radius in world units.
    pub radius: f32,
    /// Current ward cone angle in degrees.
    pub angle: f32,
}

/// Immutable representation of a single live entity used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// Identifier assigned to the entity by the world.
    pub id: EntityId,
    /// Template the entity was instantiated from.
    pub template: TemplateId,
    /// Position the entity occupies.
    pub position: SpawnPoint,
}

/// Observed playback state of one animation source, captured per tick.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationSnapshot {
    /// Name of the state the animation layer currently plays.
    pub state: String,
    /// Normalized playback time; 1.0 and beyond means the clip completed.
    pub normalized_time: f32,
}

/// Per-tick view over the primary animation source and any overrides.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationRig {
    primary: AnimationSnapshot,
    overrides: Vec<(AnimationSourceId, AnimationSnapshot)>,
}

impl AnimationRig {
    /// Creates a rig from the primary snapshot and override snapshots.
    #[must_use]
    pub fn new(
        primary: AnimationSnapshot,
        overrides: Vec<(AnimationSourceId, AnimationSnapshot)>,
    ) -> Self {
        Self { primary, overrides }
    }

    /// Resolves the snapshot a pattern should poll.
    ///
    /// `None` selects the primary source. An override identifier that is not
    /// part of the rig resolves to nothing, which callers treat the same as
    /// an animation that has not transitioned yet.
    #[must_use]
    pub fn snapshot(&self, source: Option<AnimationSourceId>) -> Option<&AnimationSnapshot> {
        match source {
            None => Some(&self.primary),
            Some(id) => self
                .overrides
                .iter()
                .find(|(candidate, _)| *candidate == id)
                .map(|(_, snapshot)| snapshot),
        }
    }
}

/// Read-only view of the action handlers the driver can execute this tick.
#[derive(Clone, Copy, Debug)]
pub struct ActionCatalogView<'a> {
    ids: &'a [ActionId],
}

impl<'a> ActionCatalogView<'a> {
    /// Creates a view backed by the provided identifier slice.
    #[must_use]
    pub const fn new(ids: &'a [ActionId]) -> Self {
        Self { ids }
    }

    /// Reports whether a handler for the action is currently discoverable.
    #[must_use]
    pub fn contains(&self, action: ActionId) -> bool {
        self.ids.contains(&action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::DeserializeOwned;

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn reward_definition_round_trips_through_bincode() {
        let definition = RewardDefinition {
            id: RewardId::new(7),
            title: "Swift Boots".to_owned(),
            description: "Move faster.".to_owned(),
            move_speed_add: 0.4,
            dash_cooldown_add: -0.1,
            max_hp_add: 0,
            attack_add: 0,
            heal_on_kill: Some(2),
            heal_on_round_clear: None,
            ward: Some(WardGrant {
                unlock: true,
                damage_add: 0,
                radius_add: 0.0,
                angle_add: 0.0,
            }),
            skill: Some(SkillId::new(3)),
        };
        assert_round_trip(&definition);
    }

    #[test]
    fn boss_pattern_round_trips_through_bincode() {
        let pattern = BossPatternDefinition {
            id: PatternId::new(2),
            name: "Lunge".to_owned(),
            enabled: true,
            weight: 60,
            min_range: 0.0,
            max_range: 4.5,
            trigger: "Lunge".to_owned(),
            state_name: "Boss_Lunge".to_owned(),
            fire_fraction: 0.35,
            animation_source: Some(AnimationSourceId::new(1)),
            action: ActionId::new(9),
        };
        assert_round_trip(&pattern);
    }

    #[test]
    fn spawn_point_distance_matches_expectation() {
        let origin = SpawnPoint::new(0.0, 0.0);
        let other = SpawnPoint::new(3.0, 4.0);
        assert!((origin.distance_to(other) - 5.0).abs() < f32::EPSILON);
        assert!((other.distance_to(origin) - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn animation_rig_resolves_primary_and_overrides() {
        let primary = AnimationSnapshot {
            state: "Idle".to_owned(),
            normalized_time: 0.0,
        };
        let alternate = AnimationSnapshot {
            state: "Boss_Slam".to_owned(),
            normalized_time: 0.5,
        };
        let rig = AnimationRig::new(
            primary.clone(),
            vec![(AnimationSourceId::new(4), alternate.clone())],
        );

        assert_eq!(rig.snapshot(None), Some(&primary));
        assert_eq!(rig.snapshot(Some(AnimationSourceId::new(4))), Some(&alternate));
        assert_eq!(rig.snapshot(Some(AnimationSourceId::new(5))), None);
    }

    #[test]
    fn ward_grant_detects_upgrades() {
        let unlock_only = WardGrant {
            unlock: true,
            damage_add: 0,
            radius_add: 0.0,
            angle_add: 0.0,
        };
        let upgrade = WardGrant {
            unlock: false,
            damage_add: 5,
            radius_add: 0.0,
            angle_add: 0.0,
        };
        assert!(!unlock_only.is_upgrade());
        assert!(upgrade.is_upgrade());
    }

    #[test]
    fn action_catalog_reports_membership() {
        let ids = [ActionId::new(1), ActionId::new(3)];
        let view = ActionCatalogView::new(&ids);
        assert!(view.contains(ActionId::new(3)));
        assert!(!view.contains(ActionId::new(2)));
    }
}
