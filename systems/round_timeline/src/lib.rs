#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Round timeline scheduler driving timed spawns and clear detection.
//!
//! The scheduler owns the round state machine: `Running` until the spawning
//! window closes, `SpawningStopped` until the population empties, then a
//! single `Cleared` transition that scores the round and suspends the
//! timeline until reward negotiation calls [`RoundTimeline::advance_to_next_round`].

use std::time::Duration;

use swarm_arena_core::{Command, Event, RoundDefinition, ScoreConfig, SpawnEvent, TemplateId};
use thiserror::Error;

/// Errors detected while validating the authored round list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TimelineConfigError {
    /// No rounds were authored, so there is nothing to schedule.
    #[error("round list is empty; nothing to schedule")]
    EmptyRoundList,
    /// A round was authored with a zero spawning window.
    #[error("round {round} has a zero duration")]
    ZeroDuration {
        /// Offending round number, 1-based.
        round: u32,
    },
}

/// Spawn sequence suspended between ticks.
///
/// Bursts deliberately outlive round-state changes; they are dropped only
/// with the scheduler itself at process teardown.
#[derive(Clone, Copy, Debug)]
struct PendingBurst {
    template: TemplateId,
    remaining: u32,
    interval: Duration,
    next_at: Duration,
}

/// Pure system that advances the round state machine each tick.
#[derive(Debug)]
pub struct RoundTimeline {
    rounds: Vec<RoundDefinition>,
    score: ScoreConfig,
    clock: Duration,
    round_index: usize,
    elapsed: Duration,
    event_fired: Vec<bool>,
    spawning_stopped: bool,
    awaiting_reward: bool,
    cleared_already: bool,
    pending_bursts: Vec<PendingBurst>,
    total_score: u64,
}

impl RoundTimeline {
    /// Creates a scheduler for the authored round list.
    ///
    /// Fails when the list is empty or contains a zero-duration round; the
    /// driver is expected to log the error and not run the session.
    pub fn new(
        rounds: Vec<RoundDefinition>,
        score: ScoreConfig,
    ) -> Result<Self, TimelineConfigError> {
        if rounds.is_empty() {
            return Err(TimelineConfigError::EmptyRoundList);
        }
        if let Some(index) = rounds.iter().position(|round| round.duration.is_zero()) {
            return Err(TimelineConfigError::ZeroDuration {
                round: index as u32 + 1,
            });
        }

        let mut timeline = Self {
            rounds,
            score,
            clock: Duration::ZERO,
            round_index: 0,
            elapsed: Duration::ZERO,
            event_fired: Vec::new(),
            spawning_stopped: false,
            awaiting_reward: false,
            cleared_already: false,
            pending_bursts: Vec::new(),
            total_score: 0,
        };
        timeline.begin_round(0);
        Ok(timeline)
    }

    /// Consumes tick events and the current population to advance the round.
    ///
    /// Spawn requests are appended to `out_commands`; the clear notification
    /// is appended to `out_events`. While a reward negotiation is pending
    /// only suspended bursts make progress.
    pub fn handle(
        &mut self,
        events: &[Event],
        population: u32,
        out_commands: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) {
        let mut dt = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt: step } = event {
                dt = dt.saturating_add(*step);
            }
        }

        self.clock = self.clock.saturating_add(dt);
        self.resume_bursts(out_commands);

        if self.awaiting_reward {
            return;
        }

        self.elapsed = self.elapsed.saturating_add(dt);

        if !self.spawning_stopped {
            let schedule_len = self.rounds[self.round_index].schedule.len();
            for index in 0..schedule_len {
                if self.event_fired[index] {
                    continue;
                }
                let spawn_event = self.rounds[self.round_index].schedule[index];
                if self.elapsed < spawn_event.at {
                    continue;
                }
                self.event_fired[index] = true;
                self.begin_spawn_sequence(spawn_event, out_commands);
            }

            if self.elapsed >= self.rounds[self.round_index].duration {
                self.spawning_stopped = true;
                log::info!(
                    "round {} spawning window closed; {population} remaining",
                    self.round_number()
                );
            }
        }

        if self.spawning_stopped && population == 0 {
            self.clear_round_once(out_events);
        }
    }

    /// Advances to the next authored round once reward negotiation settles.
    ///
    /// Wraps back to the first round past the end of the list; the loop is a
    /// placeholder rather than a real end-of-session condition.
    pub fn advance_to_next_round(&mut self) {
        self.awaiting_reward = false;
        let next = self.round_index + 1;
        let next = if next >= self.rounds.len() { 0 } else { next };
        self.begin_round(next);
    }

    /// Round currently scheduled, 1-based.
    #[must_use]
    pub fn round_number(&self) -> u32 {
        self.round_index as u32 + 1
    }

    /// Total score accumulated across cleared rounds.
    #[must_use]
    pub const fn total_score(&self) -> u64 {
        self.total_score
    }

    /// Whether the timeline is suspended waiting for a reward pick.
    #[must_use]
    pub const fn is_awaiting_reward(&self) -> bool {
        self.awaiting_reward
    }

    /// Whether the current round stopped evaluating new spawn events.
    #[must_use]
    pub const fn is_spawning_stopped(&self) -> bool {
        self.spawning_stopped
    }

    fn begin_round(&mut self, index: usize) {
        self.round_index = index;
        self.elapsed = Duration::ZERO;
        self.spawning_stopped = false;
        self.awaiting_reward = false;
        self.cleared_already = false;
        self.event_fired = vec![false; self.rounds[index].schedule.len()];
        log::info!(
            "round {} started (duration {:?})",
            self.round_number(),
            self.rounds[index].duration
        );
    }

    fn begin_spawn_sequence(&mut self, spawn_event: SpawnEvent, out: &mut Vec<Command>) {
        if spawn_event.count == 0 {
            return;
        }

        if spawn_event.interval.is_zero() {
            for _ in 0..spawn_event.count {
                out.push(Command::SpawnEntity {
                    template: spawn_event.template,
                });
            }
            return;
        }

        out.push(Command::SpawnEntity {
            template: spawn_event.template,
        });
        if spawn_event.count > 1 {
            self.pending_bursts.push(PendingBurst {
                template: spawn_event.template,
                remaining: spawn_event.count - 1,
                interval: spawn_event.interval,
                next_at: self.clock.saturating_add(spawn_event.interval),
            });
        }
    }

    fn resume_bursts(&mut self, out: &mut Vec<Command>) {
        for burst in &mut self.pending_bursts {
            while burst.remaining > 0 && burst.next_at <= self.clock {
                out.push(Command::SpawnEntity {
                    template: burst.template,
                });
                burst.remaining -= 1;
                burst.next_at = burst.next_at.saturating_add(burst.interval);
            }
        }
        self.pending_bursts.retain(|burst| burst.remaining > 0);
    }

    fn clear_round_once(&mut self, out_events: &mut Vec<Event>) {
        if self.cleared_already {
            return;
        }
        self.cleared_already = true;

        let round = self.round_number();
        let score = self.clear_score();
        self.total_score = self.total_score.saturating_add(u64::from(score));
        self.awaiting_reward = true;
        log::info!(
            "round {round} cleared: +{score} (total {})",
            self.total_score
        );
        out_events.push(Event::RoundCleared {
            round,
            score,
            total_score: self.total_score,
        });
    }

    fn clear_score(&self) -> u32 {
        let growth = self.score.clear_growth.powi(self.round_index as i32);
        let raw = (f64::from(self.score.base_clear_score) * growth).round();
        let clamped = raw.max(0.0).min(f64::from(u32::MAX));
        clamped as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_shot_round(duration_secs: u64, schedule: Vec<SpawnEvent>) -> RoundDefinition {
        RoundDefinition {
            duration: Duration::from_secs(duration_secs),
            schedule,
        }
    }

    fn spawn_event(at_secs: u64, count: u32, interval_secs: u64) -> SpawnEvent {
        SpawnEvent {
            at: Duration::from_secs(at_secs),
            template: TemplateId::new(0),
            count,
            interval: Duration::from_secs(interval_secs),
        }
    }

    fn tick(
        timeline: &mut RoundTimeline,
        population: u32,
    ) -> (Vec<Command>, Vec<Event>) {
        let mut commands = Vec::new();
        let mut events = Vec::new();
        timeline.handle(
            &[Event::TimeAdvanced {
                dt: Duration::from_secs(1),
            }],
            population,
            &mut commands,
            &mut events,
        );
        (commands, events)
    }

    #[test]
    fn construction_rejects_empty_round_list() {
        assert_eq!(
            RoundTimeline::new(Vec::new(), ScoreConfig::default()).err(),
            Some(TimelineConfigError::EmptyRoundList)
        );
    }

    #[test]
    fn construction_rejects_zero_duration_rounds() {
        let rounds = vec![one_shot_round(5, Vec::new()), one_shot_round(0, Vec::new())];
        assert_eq!(
            RoundTimeline::new(rounds, ScoreConfig::default()).err(),
            Some(TimelineConfigError::ZeroDuration { round: 2 })
        );
    }

    #[test]
    fn clear_requires_elapsed_duration_and_empty_population() {
        let rounds = vec![one_shot_round(10, vec![spawn_event(0, 1, 0)])];
        let mut timeline = RoundTimeline::new(rounds, ScoreConfig::default()).expect("timeline");

        let (commands, events) = tick(&mut timeline, 0);
        assert_eq!(commands.len(), 1, "spawn event fires on the first tick");
        assert!(events.is_empty());

        // Population already empty, but the spawning window is still open.
        for _ in 1..9 {
            let (_, events) = tick(&mut timeline, 0);
            assert!(events.is_empty(), "no clear before the duration elapses");
            assert!(!timeline.is_spawning_stopped());
        }

        let (_, events) = tick(&mut timeline, 0);
        assert!(timeline.is_spawning_stopped());
        match events.as_slice() {
            [Event::RoundCleared {
                round,
                score,
                total_score,
            }] => {
                assert_eq!(*round, 1);
                assert_eq!(*score, 1_000);
                assert_eq!(*total_score, 1_000);
            }
            other => panic!("expected RoundCleared, got {other:?}"),
        }
        assert!(timeline.is_awaiting_reward());
    }

    #[test]
    fn clear_waits_for_population_to_empty() {
        let rounds = vec![one_shot_round(2, Vec::new())];
        let mut timeline = RoundTimeline::new(rounds, ScoreConfig::default()).expect("timeline");

        let (_, events) = tick(&mut timeline, 3);
        assert!(events.is_empty());
        let (_, events) = tick(&mut timeline, 3);
        assert!(events.is_empty(), "survivors block the clear");
        assert!(timeline.is_spawning_stopped());

        let (_, events) = tick(&mut timeline, 0);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn clear_fires_exactly_once() {
        let rounds = vec![one_shot_round(1, Vec::new())];
        let mut timeline = RoundTimeline::new(rounds, ScoreConfig::default()).expect("timeline");

        let (_, events) = tick(&mut timeline, 0);
        assert_eq!(events.len(), 1);
        for _ in 0..5 {
            let (_, events) = tick(&mut timeline, 0);
            assert!(events.is_empty(), "awaiting-reward ticks must not re-clear");
        }
    }

    #[test]
    fn interval_bursts_spread_spawns_across_ticks() {
        let rounds = vec![one_shot_round(30, vec![spawn_event(0, 3, 2)])];
        let mut timeline = RoundTimeline::new(rounds, ScoreConfig::default()).expect("timeline");

        let mut spawns_per_tick = Vec::new();
        for _ in 0..6 {
            let (commands, _) = tick(&mut timeline, 1);
            spawns_per_tick.push(commands.len());
        }
        assert_eq!(spawns_per_tick, vec![1, 0, 1, 0, 1, 0]);
    }

    #[test]
    fn bursts_keep_spawning_after_the_window_closes_and_while_awaiting_reward() {
        let rounds = vec![one_shot_round(2, vec![spawn_event(0, 5, 3)])];
        let mut timeline = RoundTimeline::new(rounds, ScoreConfig::default()).expect("timeline");

        let (commands, _) = tick(&mut timeline, 0);
        assert_eq!(commands.len(), 1);

        // Window closes and the round clears while four spawns remain queued.
        let (_, events) = tick(&mut timeline, 0);
        assert_eq!(events.len(), 1);
        assert!(timeline.is_awaiting_reward());

        let mut later_spawns = 0;
        for _ in 0..12 {
            let (commands, _) = tick(&mut timeline, 0);
            later_spawns += commands.len();
        }
        assert_eq!(later_spawns, 4, "suspended burst completes regardless of round state");
    }

    #[test]
    fn score_grows_per_round_index() {
        let rounds = vec![one_shot_round(1, Vec::new()), one_shot_round(1, Vec::new())];
        let mut timeline = RoundTimeline::new(rounds, ScoreConfig::default()).expect("timeline");

        let (_, events) = tick(&mut timeline, 0);
        match events.as_slice() {
            [Event::RoundCleared { score, .. }] => assert_eq!(*score, 1_000),
            other => panic!("expected RoundCleared, got {other:?}"),
        }

        timeline.advance_to_next_round();
        assert_eq!(timeline.round_number(), 2);

        let (_, events) = tick(&mut timeline, 0);
        match events.as_slice() {
            [Event::RoundCleared {
                score, total_score, ..
            }] => {
                assert_eq!(*score, 1_100);
                assert_eq!(*total_score, 2_100);
            }
            other => panic!("expected RoundCleared, got {other:?}"),
        }
    }

    #[test]
    fn advancing_past_the_last_round_wraps_to_the_first() {
        let rounds = vec![one_shot_round(1, Vec::new())];
        let mut timeline = RoundTimeline::new(rounds, ScoreConfig::default()).expect("timeline");

        let (_, events) = tick(&mut timeline, 0);
        assert_eq!(events.len(), 1);

        timeline.advance_to_next_round();
        assert_eq!(timeline.round_number(), 1);
        assert!(!timeline.is_awaiting_reward());
        assert!(!timeline.is_spawning_stopped());

        // The wrapped round runs again from scratch.
        let (_, events) = tick(&mut timeline, 0);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn zero_count_events_are_ignored() {
        let rounds = vec![one_shot_round(5, vec![spawn_event(0, 0, 0)])];
        let mut timeline = RoundTimeline::new(rounds, ScoreConfig::default()).expect("timeline");
        let (commands, _) = tick(&mut timeline, 0);
        assert!(commands.is_empty());
    }
}
