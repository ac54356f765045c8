#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Boss attack-pattern selection synchronized to external animation playback.
//!
//! The selector runs a small two-state machine. While `Idle` and past the
//! inter-pattern cooldown it draws one pattern (weighted, with replacement)
//! from the candidates that are enabled, in range, and backed by a
//! discoverable action handler. While `Attacking` it polls the animation rig
//! and fires the pattern's action exactly once at the configured playback
//! fraction, returning to `Idle` when the clip completes.

use std::time::Duration;

use swarm_arena_core::{
    ActionCatalogView, AnimationRig, BossPatternDefinition, Event, PatternId, SpawnPoint,
};
use swarm_arena_weighted_pick::{derive_labeled_seed, pick_one, SplitMix64, WeightedCandidate};

const SELECTION_SEED_LABEL: &str = "boss-patterns";

/// Backoff applied when no pattern qualifies, so an empty pool does not turn
/// into a per-tick busy loop.
const EMPTY_POOL_BACKOFF: Duration = Duration::from_millis(250);

#[derive(Clone, Copy, Debug)]
struct ActiveAttack {
    pattern: PatternId,
    fired: bool,
}

/// Pure system selecting and timing boss attack patterns.
#[derive(Debug)]
pub struct BossPatterns {
    patterns: Vec<BossPatternDefinition>,
    cooldown: Duration,
    clock: Duration,
    next_selection_at: Duration,
    current: Option<ActiveAttack>,
    rng: SplitMix64,
}

impl BossPatterns {
    /// Creates the selector from the authored pattern list, the inter-pattern
    /// cooldown, and the global seed its selection stream derives from.
    #[must_use]
    pub fn new(patterns: Vec<BossPatternDefinition>, cooldown: Duration, seed: u64) -> Self {
        Self {
            patterns,
            cooldown,
            clock: Duration::ZERO,
            next_selection_at: Duration::ZERO,
            current: None,
            rng: SplitMix64::new(derive_labeled_seed(seed, SELECTION_SEED_LABEL)),
        }
    }

    /// Whether a pattern execution is currently in flight.
    #[must_use]
    pub const fn is_attacking(&self) -> bool {
        self.current.is_some()
    }

    /// Pattern currently executing, when one is in flight.
    #[must_use]
    pub fn active_pattern(&self) -> Option<PatternId> {
        self.current.map(|active| active.pattern)
    }

    /// Advances the selector by one tick.
    ///
    /// Animation trigger requests and pattern fire reports are appended to
    /// `out_events`; the driver owns the handlers behind the action catalog.
    pub fn handle(
        &mut self,
        dt: Duration,
        boss: SpawnPoint,
        target: SpawnPoint,
        rig: &AnimationRig,
        actions: ActionCatalogView<'_>,
        out_events: &mut Vec<Event>,
    ) {
        self.clock = self.clock.saturating_add(dt);

        if self.current.is_some() {
            self.attacking_tick(rig, out_events);
            return;
        }

        if self.clock < self.next_selection_at {
            return;
        }

        self.try_select(boss.distance_to(target), actions, out_events);
    }

    fn attacking_tick(&mut self, rig: &AnimationRig, out_events: &mut Vec<Event>) {
        let Some(mut active) = self.current else {
            return;
        };
        let Some(definition) = self
            .patterns
            .iter()
            .find(|pattern| pattern.id == active.pattern)
        else {
            // Definitions are immutable per encounter, so this cannot happen
            // through the public surface; recover to Idle anyway.
            self.current = None;
            return;
        };

        // A missing override source or a foreign state name means the
        // animation has not transitioned yet (or exited abnormally); both are
        // transient, not terminal.
        let Some(snapshot) = rig.snapshot(definition.animation_source) else {
            return;
        };
        if snapshot.state != definition.state_name {
            return;
        }

        let progress = snapshot.normalized_time;
        if !active.fired && progress >= definition.fire_fraction {
            active.fired = true;
            self.current = Some(active);
            out_events.push(Event::BossPatternFired {
                pattern: definition.id,
                action: definition.action,
            });
        }

        if progress >= 1.0 {
            self.current = None;
            self.next_selection_at = self.clock.saturating_add(self.cooldown);
        }
    }

    fn try_select(
        &mut self,
        distance: f32,
        actions: ActionCatalogView<'_>,
        out_events: &mut Vec<Event>,
    ) {
        let mut pool = Vec::new();
        for (index, pattern) in self.patterns.iter().enumerate() {
            if !pattern.enabled || pattern.weight <= 0 {
                continue;
            }
            if distance < pattern.min_range || distance > pattern.max_range {
                continue;
            }
            // A handler that cannot be located now would leave the pattern
            // selected but never executed; exclude it up front.
            if !actions.contains(pattern.action) {
                continue;
            }
            pool.push(WeightedCandidate::new(index, pattern.weight));
        }

        let Some(index) = pick_one(&pool, &mut self.rng).copied() else {
            self.next_selection_at = self.clock.saturating_add(EMPTY_POOL_BACKOFF);
            return;
        };

        let definition = &self.patterns[index];
        self.current = Some(ActiveAttack {
            pattern: definition.id,
            fired: false,
        });
        log::debug!("boss pattern selected: {}", definition.name);
        out_events.push(Event::BossAnimationRequested {
            source: definition.animation_source,
            trigger: definition.trigger.clone(),
        });
    }
}
