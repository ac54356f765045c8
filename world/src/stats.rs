//! Player stat accumulators and the ward passive state.

use swarm_arena_core::{HealTrigger, PlayerStatsSnapshot, WardSnapshot};

const BASE_MOVE_SPEED: f32 = 3.0;
const BASE_DASH_COOLDOWN: f32 = 0.8;
const BASE_MAX_HP: i32 = 100;

const BASE_WARD_DAMAGE: i32 = 10;
const BASE_WARD_RADIUS: f32 = 3.5;
const BASE_WARD_ANGLE: f32 = 90.0;

/// Accumulated player stats following the base + bonus = final rule.
///
/// Bonuses stack additively with no caps; the final maximum health is
/// floored at 1 so the player never ends up unkillable-in-reverse.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PlayerStats {
    base_move_speed: f32,
    move_speed_bonus: f32,
    final_move_speed: f32,
    base_dash_cooldown: f32,
    dash_cooldown_bonus: f32,
    final_dash_cooldown: f32,
    base_max_hp: i32,
    max_hp_bonus: i32,
    final_max_hp: i32,
    heal_on_kill: u32,
    heal_on_round_clear: u32,
}

impl PlayerStats {
    pub(crate) fn new() -> Self {
        let mut stats = Self {
            base_move_speed: BASE_MOVE_SPEED,
            move_speed_bonus: 0.0,
            final_move_speed: 0.0,
            base_dash_cooldown: BASE_DASH_COOLDOWN,
            dash_cooldown_bonus: 0.0,
            final_dash_cooldown: 0.0,
            base_max_hp: BASE_MAX_HP,
            max_hp_bonus: 0,
            final_max_hp: 0,
            heal_on_kill: 0,
            heal_on_round_clear: 0,
        };
        stats.recalculate();
        stats
    }

    pub(crate) fn add_move_speed(&mut self, delta: f32) {
        self.move_speed_bonus += delta;
        self.recalculate();
    }

    pub(crate) fn add_dash_cooldown(&mut self, delta: f32) {
        self.dash_cooldown_bonus += delta;
        self.recalculate();
    }

    pub(crate) fn add_max_hp(&mut self, delta: i32) {
        self.max_hp_bonus = self.max_hp_bonus.saturating_add(delta);
        self.recalculate();
    }

    pub(crate) fn add_heal_passive(&mut self, trigger: HealTrigger, amount: u32) {
        match trigger {
            HealTrigger::OnKill => self.heal_on_kill = self.heal_on_kill.saturating_add(amount),
            HealTrigger::OnRoundClear => {
                self.heal_on_round_clear = self.heal_on_round_clear.saturating_add(amount);
            }
        }
    }

    fn recalculate(&mut self) {
        self.final_move_speed = self.base_move_speed + self.move_speed_bonus;
        self.final_dash_cooldown = self.base_dash_cooldown + self.dash_cooldown_bonus;
        self.final_max_hp = (self.base_max_hp.saturating_add(self.max_hp_bonus)).max(1);
    }

    pub(crate) fn snapshot(&self) -> PlayerStatsSnapshot {
        PlayerStatsSnapshot {
            move_speed_bonus: self.move_speed_bonus,
            final_move_speed: self.final_move_speed,
            dash_cooldown_bonus: self.dash_cooldown_bonus,
            final_dash_cooldown: self.final_dash_cooldown,
            max_hp_bonus: self.max_hp_bonus,
            final_max_hp: self.final_max_hp,
            heal_on_kill: self.heal_on_kill,
            heal_on_round_clear: self.heal_on_round_clear,
        }
    }
}

/// Ward passive state. Upgrades only apply while unlocked.
#[derive(Clone, Copy, Debug)]
pub(crate) struct WardState {
    unlocked: bool,
    damage: i32,
    radius: f32,
    angle: f32,
}

impl WardState {
    pub(crate) fn new() -> Self {
        Self {
            unlocked: false,
            damage: BASE_WARD_DAMAGE,
            radius: BASE_WARD_RADIUS,
            angle: BASE_WARD_ANGLE,
        }
    }

    /// Unlocks the ward; returns whether the state actually transitioned.
    pub(crate) fn unlock(&mut self) -> bool {
        let was_locked = !self.unlocked;
        self.unlocked = true;
        was_locked
    }

    pub(crate) fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub(crate) fn upgrade(&mut self, damage_add: i32, radius_add: f32, angle_add: f32) {
        self.damage = self.damage.saturating_add(damage_add);
        self.radius += radius_add;
        self.angle += angle_add;
    }

    pub(crate) fn snapshot(&self) -> WardSnapshot {
        WardSnapshot {
            unlocked: self.unlocked,
            damage: self.damage,
            radius: self.radius,
            angle: self.angle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bonuses_accumulate_additively() {
        let mut stats = PlayerStats::new();
        stats.add_move_speed(0.4);
        stats.add_move_speed(0.4);
        let snapshot = stats.snapshot();
        assert!((snapshot.move_speed_bonus - 0.8).abs() < f32::EPSILON);
        assert!((snapshot.final_move_speed - (BASE_MOVE_SPEED + 0.8)).abs() < f32::EPSILON);
    }

    #[test]
    fn final_max_hp_never_drops_below_one() {
        let mut stats = PlayerStats::new();
        stats.add_max_hp(-10_000);
        assert_eq!(stats.snapshot().final_max_hp, 1);
    }

    #[test]
    fn heal_passives_accumulate_per_trigger() {
        let mut stats = PlayerStats::new();
        stats.add_heal_passive(HealTrigger::OnKill, 2);
        stats.add_heal_passive(HealTrigger::OnKill, 3);
        stats.add_heal_passive(HealTrigger::OnRoundClear, 10);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.heal_on_kill, 5);
        assert_eq!(snapshot.heal_on_round_clear, 10);
    }

    #[test]
    fn ward_unlock_transitions_once() {
        let mut ward = WardState::new();
        assert!(ward.unlock());
        assert!(!ward.unlock());
        assert!(ward.is_unlocked());
    }
}
