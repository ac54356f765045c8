//! Authoring configuration for one encounter session.
//!
//! The full table set can be loaded from a JSON file; without one the
//! built-in demo encounter is used. Tables are validated once before the
//! engine starts and are immutable afterwards.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use swarm_arena_core::{
    ActionId, AnimationSourceId, BossPatternDefinition, EntityTemplate, PatternId, PlacementKind,
    RewardDefinition, RewardId, RewardSlot, RewardTable, RoundDefinition, ScoreConfig, SkillId,
    SpawnEvent, SpawnPoint, TemplateId, WardGrant,
};

/// Complete authoring table set consumed by the driver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct EncounterConfig {
    /// Rounds in play order.
    pub rounds: Vec<RoundDefinition>,
    /// Spawnable entity templates.
    pub templates: Vec<EntityTemplate>,
    /// Reward catalog referenced by the tables.
    pub rewards: Vec<RewardDefinition>,
    /// Per-round reward tables.
    pub reward_tables: Vec<RewardTable>,
    /// Boss attack patterns.
    pub boss_patterns: Vec<BossPatternDefinition>,
    /// Inter-pattern cooldown for the boss selector.
    pub boss_cooldown: Duration,
    /// Fixed point boss-type templates spawn at.
    pub boss_anchor: Option<SpawnPoint>,
    /// Clear-score tuning.
    pub score: ScoreConfig,
}

impl EncounterConfig {
    /// Loads a table set from a JSON file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading encounter config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing encounter config {}", path.display()))?;
        Ok(config)
    }

    /// Rejects authoring mistakes that would otherwise surface as silent
    /// no-ops deep inside the engine.
    pub(crate) fn validate(&self) -> Result<()> {
        for (index, round) in self.rounds.iter().enumerate() {
            for spawn in &round.schedule {
                if self
                    .templates
                    .iter()
                    .all(|template| template.id != spawn.template)
                {
                    bail!(
                        "round {} schedules unknown template {:?}",
                        index + 1,
                        spawn.template
                    );
                }
            }
        }

        for table in &self.reward_tables {
            for slot in &table.slots {
                if self.rewards.iter().all(|reward| reward.id != slot.reward) {
                    bail!(
                        "reward table for round {} references unknown {:?}",
                        table.round,
                        slot.reward
                    );
                }
            }
        }

        for pattern in &self.boss_patterns {
            if !(0.0..=1.0).contains(&pattern.fire_fraction) {
                bail!(
                    "pattern '{}' has fire fraction {} outside [0, 1]",
                    pattern.name,
                    pattern.fire_fraction
                );
            }
            if pattern.max_range < pattern.min_range {
                bail!("pattern '{}' has an inverted range", pattern.name);
            }
        }

        Ok(())
    }

    /// Built-in three-round demo encounter with a boss finale.
    pub(crate) fn demo() -> Self {
        let grunt = TemplateId::new(0);
        let stalker = TemplateId::new(1);
        let broodmother = TemplateId::new(2);

        Self {
            rounds: vec![
                RoundDefinition {
                    duration: Duration::from_secs(12),
                    schedule: vec![
                        burst(0, grunt, 3),
                        trickle(4, grunt, 4, 1),
                    ],
                },
                RoundDefinition {
                    duration: Duration::from_secs(15),
                    schedule: vec![
                        burst(0, grunt, 4),
                        trickle(5, stalker, 3, 2),
                        burst(10, grunt, 2),
                    ],
                },
                RoundDefinition {
                    duration: Duration::from_secs(20),
                    schedule: vec![
                        burst(0, broodmother, 1),
                        trickle(2, grunt, 6, 1),
                    ],
                },
            ],
            templates: vec![
                EntityTemplate {
                    id: grunt,
                    name: "grunt".to_owned(),
                    placement: PlacementKind::Scatter,
                },
                EntityTemplate {
                    id: stalker,
                    name: "stalker".to_owned(),
                    placement: PlacementKind::Scatter,
                },
                EntityTemplate {
                    id: broodmother,
                    name: "broodmother".to_owned(),
                    placement: PlacementKind::BossAnchor,
                },
            ],
            rewards: demo_rewards(),
            reward_tables: demo_reward_tables(),
            boss_patterns: demo_boss_patterns(),
            boss_cooldown: Duration::from_millis(1_500),
            boss_anchor: Some(SpawnPoint::new(0.0, 7.5)),
            score: ScoreConfig::default(),
        }
    }
}

fn burst(at_secs: u64, template: TemplateId, count: u32) -> SpawnEvent {
    SpawnEvent {
        at: Duration::from_secs(at_secs),
        template,
        count,
        interval: Duration::ZERO,
    }
}

fn trickle(at_secs: u64, template: TemplateId, count: u32, interval_secs: u64) -> SpawnEvent {
    SpawnEvent {
        at: Duration::from_secs(at_secs),
        template,
        count,
        interval: Duration::from_secs(interval_secs),
    }
}

fn stat_reward(id: u32, title: &str, description: &str) -> RewardDefinition {
    RewardDefinition {
        id: RewardId::new(id),
        title: title.to_owned(),
        description: description.to_owned(),
        move_speed_add: 0.0,
        dash_cooldown_add: 0.0,
        max_hp_add: 0,
        attack_add: 0,
        heal_on_kill: None,
        heal_on_round_clear: None,
        ward: None,
        skill: None,
    }
}

fn demo_rewards() -> Vec<RewardDefinition> {
    let mut swift_boots = stat_reward(1, "Swift Boots", "Move 0.4 faster.");
    swift_boots.move_speed_add = 0.4;

    let mut honed_reflexes = stat_reward(2, "Honed Reflexes", "Dash recovers 0.1s sooner.");
    honed_reflexes.dash_cooldown_add = -0.1;

    let mut thick_hide = stat_reward(3, "Thick Hide", "+25 maximum health.");
    thick_hide.max_hp_add = 25;

    let mut leeching_strikes = stat_reward(4, "Leeching Strikes", "Heal 2 on every kill.");
    leeching_strikes.heal_on_kill = Some(2);

    let mut second_wind = stat_reward(5, "Second Wind", "Heal 10 when a round clears.");
    second_wind.heal_on_round_clear = Some(10);

    let mut ward_unlock = stat_reward(6, "Awaken the Ward", "Unlock the ward passive.");
    ward_unlock.ward = Some(WardGrant {
        unlock: true,
        damage_add: 0,
        radius_add: 0.0,
        angle_add: 0.0,
    });

    let mut ward_edge = stat_reward(7, "Ward: Keen Edge", "Ward deals +5 damage.");
    ward_edge.ward = Some(WardGrant {
        unlock: false,
        damage_add: 5,
        radius_add: 0.0,
        angle_add: 0.0,
    });

    let mut ward_reach = stat_reward(8, "Ward: Long Reach", "Ward covers more ground.");
    ward_reach.ward = Some(WardGrant {
        unlock: false,
        damage_add: 0,
        radius_add: 0.5,
        angle_add: 15.0,
    });

    let mut storm_orb = stat_reward(9, "Storm Orb", "Attach the storm orb skill.");
    storm_orb.skill = Some(SkillId::new(1));

    // Authored ahead of the attack accumulator landing on the player state.
    let mut heavy_blows = stat_reward(10, "Heavy Blows", "+5 attack.");
    heavy_blows.attack_add = 5;

    vec![
        swift_boots,
        honed_reflexes,
        thick_hide,
        leeching_strikes,
        second_wind,
        ward_unlock,
        ward_edge,
        ward_reach,
        storm_orb,
        heavy_blows,
    ]
}

fn demo_reward_tables() -> Vec<RewardTable> {
    let slot = |reward: u32, weight: i32| RewardSlot {
        reward: RewardId::new(reward),
        weight,
    };
    vec![
        RewardTable {
            round: 1,
            slots: vec![
                slot(1, 20),
                slot(2, 20),
                slot(3, 20),
                slot(4, 10),
                slot(6, 15),
                slot(10, 10),
            ],
        },
        RewardTable {
            round: 2,
            slots: vec![
                slot(1, 15),
                slot(3, 15),
                slot(5, 15),
                slot(6, 10),
                slot(7, 10),
                slot(8, 10),
                slot(9, 10),
            ],
        },
        RewardTable {
            round: 3,
            slots: vec![
                slot(2, 15),
                slot(3, 15),
                slot(4, 10),
                slot(7, 15),
                slot(8, 15),
                slot(9, 10),
            ],
        },
    ]
}

fn demo_boss_patterns() -> Vec<BossPatternDefinition> {
    vec![
        BossPatternDefinition {
            id: PatternId::new(0),
            name: "Slam".to_owned(),
            enabled: true,
            weight: 60,
            min_range: 0.0,
            max_range: 3.0,
            trigger: "Slam".to_owned(),
            state_name: "Boss_Slam".to_owned(),
            fire_fraction: 0.4,
            animation_source: None,
            action: ActionId::new(0),
        },
        BossPatternDefinition {
            id: PatternId::new(1),
            name: "Lunge".to_owned(),
            enabled: true,
            weight: 30,
            min_range: 2.0,
            max_range: 6.0,
            trigger: "Lunge".to_owned(),
            state_name: "Boss_Lunge".to_owned(),
            fire_fraction: 0.35,
            animation_source: None,
            action: ActionId::new(1),
        },
        BossPatternDefinition {
            id: PatternId::new(2),
            name: "Brood Call".to_owned(),
            enabled: true,
            weight: 100,
            min_range: 0.0,
            max_range: 12.0,
            trigger: "BroodCall".to_owned(),
            state_name: "Boss_BroodCall".to_owned(),
            fire_fraction: 0.5,
            animation_source: Some(AnimationSourceId::new(1)),
            action: ActionId::new(2),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_config_validates() {
        let config = EncounterConfig::demo();
        config.validate().expect("demo config is valid");
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = EncounterConfig::demo();
        let text = serde_json::to_string(&config).expect("serialize");
        let restored: EncounterConfig = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(config, restored);
    }

    #[test]
    fn validation_rejects_unknown_templates() {
        let mut config = EncounterConfig::demo();
        config.rounds[0].schedule[0].template = TemplateId::new(99);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_out_of_range_fire_fractions() {
        let mut config = EncounterConfig::demo();
        config.boss_patterns[0].fire_fraction = 1.5;
        assert!(config.validate().is_err());
    }
}
