#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Reward negotiation triggered by cleared rounds.
//!
//! The system looks up the cleared round's reward table, filters candidates
//! through the ward gate, samples exactly three unique offers, and applies
//! the picked definition's deltas as world commands before signalling the
//! scheduler to resume. Card rendering and click handling are external; the
//! contract here ends at "present three, receive exactly one back".

use swarm_arena_core::{
    Command, Event, HealTrigger, RewardDefinition, RewardId, RewardTable, WardSnapshot,
    REWARD_OFFER_COUNT,
};
use swarm_arena_weighted_pick::{derive_indexed_seed, pick_unique, SplitMix64, WeightedCandidate};

const ROUND_SEED_LABEL: &str = "reward-round";

#[derive(Clone, Copy, Debug)]
struct PendingOffer {
    round: u32,
    options: [RewardId; REWARD_OFFER_COUNT],
}

/// Pure system negotiating one reward pick per cleared round.
#[derive(Debug)]
pub struct RewardChoice {
    tables: Vec<RewardTable>,
    catalog: Vec<RewardDefinition>,
    seed: u64,
    pending: Option<PendingOffer>,
}

impl RewardChoice {
    /// Creates the negotiation system from authoring tables, the reward
    /// catalog, and the global seed its per-round streams derive from.
    #[must_use]
    pub fn new(tables: Vec<RewardTable>, catalog: Vec<RewardDefinition>, seed: u64) -> Self {
        Self {
            tables,
            catalog,
            seed,
            pending: None,
        }
    }

    /// Reward identifiers of the outstanding offer, when one is open.
    #[must_use]
    pub fn outstanding_offer(&self) -> Option<&[RewardId; REWARD_OFFER_COUNT]> {
        self.pending.as_ref().map(|offer| &offer.options)
    }

    /// Reacts to a cleared round by presenting offers or settling directly.
    ///
    /// Missing or too-small candidate pools settle immediately instead of
    /// presenting a partial, possibly confusing choice set.
    pub fn handle_round_cleared(
        &mut self,
        round: u32,
        ward: WardSnapshot,
        out_events: &mut Vec<Event>,
    ) {
        if self.pending.is_some() {
            log::warn!("round {round} cleared while an offer is still outstanding; ignoring");
            return;
        }

        let Some(table) = self.tables.iter().find(|table| table.round == round) else {
            log::info!("no reward table for round {round}; continuing");
            out_events.push(Event::RewardSettled { round });
            return;
        };
        if table.slots.is_empty() {
            log::info!("reward table for round {round} is empty; continuing");
            out_events.push(Event::RewardSettled { round });
            return;
        }

        let mut pool = Vec::with_capacity(table.slots.len());
        for slot in &table.slots {
            if slot.weight <= 0 {
                continue;
            }
            let Some(definition) = self
                .catalog
                .iter()
                .find(|definition| definition.id == slot.reward)
            else {
                log::warn!("reward table for round {round} references unknown {:?}", slot.reward);
                continue;
            };
            if !passes_ward_gate(definition, ward) {
                continue;
            }
            pool.push(WeightedCandidate::new(definition.id, slot.weight));
        }

        let mut rng = SplitMix64::new(derive_indexed_seed(self.seed, ROUND_SEED_LABEL, round));
        let picked = pick_unique(&pool, REWARD_OFFER_COUNT, &mut rng);
        if picked.len() < REWARD_OFFER_COUNT {
            log::warn!(
                "only {} valid reward candidates for round {round}; skipping the offer",
                picked.len()
            );
            out_events.push(Event::RewardSettled { round });
            return;
        }

        let options = [picked[0], picked[1], picked[2]];
        self.pending = Some(PendingOffer { round, options });
        out_events.push(Event::RewardOffered { round, options });
    }

    /// Applies the picked reward and settles the outstanding offer.
    ///
    /// Picks that arrive without an open offer, or that name a reward that
    /// was not offered, are ignored with a warning.
    pub fn handle_picked(
        &mut self,
        reward: RewardId,
        out_commands: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) {
        let Some(offer) = self.pending else {
            log::warn!("reward pick {reward:?} arrived with no offer outstanding; ignoring");
            return;
        };
        if !offer.options.contains(&reward) {
            log::warn!("reward pick {reward:?} is not part of the outstanding offer; ignoring");
            return;
        }
        self.pending = None;

        let Some(definition) = self
            .catalog
            .iter()
            .find(|definition| definition.id == reward)
            .cloned()
        else {
            log::warn!("picked reward {reward:?} vanished from the catalog; continuing");
            out_events.push(Event::RewardSettled { round: offer.round });
            return;
        };

        apply_definition(&definition, out_commands);
        out_events.push(Event::RewardSettled { round: offer.round });
    }
}

/// Hides unlock offers once the ward is unlocked and upgrade offers until it
/// is. Rewards without a ward payload always pass.
fn passes_ward_gate(definition: &RewardDefinition, ward: WardSnapshot) -> bool {
    let Some(grant) = definition.ward else {
        return true;
    };
    let is_unlock = grant.unlock;
    let is_upgrade = grant.is_upgrade();
    if !is_unlock && !is_upgrade {
        return true;
    }

    if ward.unlocked {
        !is_unlock
    } else {
        !is_upgrade
    }
}

fn apply_definition(definition: &RewardDefinition, out: &mut Vec<Command>) {
    if definition.move_speed_add != 0.0 {
        out.push(Command::AdjustMoveSpeed {
            delta: definition.move_speed_add,
        });
    }
    if definition.dash_cooldown_add != 0.0 {
        out.push(Command::AdjustDashCooldown {
            delta: definition.dash_cooldown_add,
        });
    }
    if definition.max_hp_add != 0 {
        out.push(Command::AdjustMaxHp {
            delta: definition.max_hp_add,
        });
    }
    if definition.attack_add != 0 {
        // Known gap: the player state has no attack accumulator yet.
        log::warn!(
            "attack bonus on {:?} is authored but currently inert",
            definition.id
        );
    }
    if let Some(amount) = definition.heal_on_kill {
        out.push(Command::AddHealPassive {
            trigger: HealTrigger::OnKill,
            amount,
        });
    }
    if let Some(amount) = definition.heal_on_round_clear {
        out.push(Command::AddHealPassive {
            trigger: HealTrigger::OnRoundClear,
            amount,
        });
    }
    if let Some(grant) = definition.ward {
        if grant.unlock {
            out.push(Command::UnlockWard);
        }
        if grant.is_upgrade() {
            out.push(Command::UpgradeWard {
                damage_add: grant.damage_add,
                radius_add: grant.radius_add,
                angle_add: grant.angle_add,
            });
        }
    }
    if let Some(skill) = definition.skill {
        out.push(Command::AttachSkill { skill });
    }
}
