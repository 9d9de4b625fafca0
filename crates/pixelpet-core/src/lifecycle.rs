use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use pixelpet_config::LifecycleSettings;

use crate::state::{DecayLedger, PetState};
use crate::status::StatusTag;

/// Hunger removed by one feeding.
pub const FEED_AMOUNT: i64 = 10;
/// Health restored by one treatment.
pub const TREAT_AMOUNT: i64 = 10;

/// The three owner interactions that change a pet's vitals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CareAction {
    Feed,
    Treat,
    Play,
}

impl CareAction {
    pub const ALL: [CareAction; 3] = [CareAction::Feed, CareAction::Treat, CareAction::Play];

    pub fn label(self) -> &'static str {
        match self {
            CareAction::Feed => "Feed",
            CareAction::Treat => "Treat",
            CareAction::Play => "Play",
        }
    }

    /// Phrase completing "say something when your owner ...".
    pub fn owner_phrase(self) -> &'static str {
        match self {
            CareAction::Feed => "feeds you",
            CareAction::Treat => "gives you an injection",
            CareAction::Play => "plays with you",
        }
    }
}

impl fmt::Display for CareAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Thresholds and rates driving the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleRules {
    pub hunger_per_minute: u8,
    pub health_loss_per_block: u8,
    pub health_block_minutes: u32,
    pub hungry_above: u8,
    pub healthy_above: u8,
    pub sick_below: u8,
    pub starvation: TimeDelta,
    pub boredom: TimeDelta,
    pub loneliness: TimeDelta,
}

impl Default for LifecycleRules {
    fn default() -> Self {
        Self::from(&LifecycleSettings::default())
    }
}

impl From<&LifecycleSettings> for LifecycleRules {
    fn from(s: &LifecycleSettings) -> Self {
        Self {
            hunger_per_minute: s.hunger_per_minute,
            health_loss_per_block: s.health_loss_per_block,
            health_block_minutes: s.health_block_minutes.max(1),
            hungry_above: s.hungry_above,
            healthy_above: s.healthy_above,
            sick_below: s.sick_below,
            starvation: TimeDelta::hours(i64::from(s.starvation_hours)),
            boredom: TimeDelta::hours(i64::from(s.boredom_hours)),
            loneliness: TimeDelta::hours(i64::from(s.loneliness_hours)),
        }
    }
}

/// Time elapsed from `since` to `now`, or zero if the clock went backwards.
fn elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> TimeDelta {
    (now - since).max(TimeDelta::zero())
}

/// Converts elapsed wall-clock time into vitals and status changes.
///
/// Every transition is a pure function of the input state and `now`.
#[derive(Debug, Clone, Default)]
pub struct LifecycleEngine {
    rules: LifecycleRules,
}

impl LifecycleEngine {
    pub fn new(rules: LifecycleRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &LifecycleRules {
        &self.rules
    }

    /// Bring `state` up to date with `now`.
    ///
    /// Hunger grows per whole minute since the last feeding; while hungry,
    /// health drops per whole block of minutes. Only time not yet charged
    /// (see [`DecayLedger`]) is applied, so calling this twice with the same
    /// `now` yields the same state. Status is recomputed last; the caller
    /// checks [`PetState::is_deceased`] on the result.
    pub fn advance(&self, mut state: PetState, now: DateTime<Utc>) -> PetState {
        let minutes = elapsed(state.last_fed, now).num_minutes().max(0) as u64;
        let blocks = minutes / u64::from(self.rules.health_block_minutes);

        let new_minutes = minutes.saturating_sub(state.decay.minutes_applied);
        if new_minutes > 0 {
            let gain = new_minutes.saturating_mul(u64::from(self.rules.hunger_per_minute));
            let hunger = u64::from(state.hunger()).saturating_add(gain);
            state.set_hunger(hunger.min(i64::MAX as u64) as i64);
        }
        state.decay.minutes_applied = state.decay.minutes_applied.max(minutes);

        let new_blocks = blocks.saturating_sub(state.decay.blocks_applied);
        if new_blocks > 0 && state.hunger() > self.rules.hungry_above {
            let loss = new_blocks.saturating_mul(u64::from(self.rules.health_loss_per_block));
            let health = i64::from(state.health()) - loss.min(i64::from(u8::MAX) as u64) as i64;
            state.set_health(health);
        }
        state.decay.blocks_applied = state.decay.blocks_applied.max(blocks);

        self.refresh_status(&mut state, now);
        state
    }

    /// Derive every status tag from current vitals and timestamps.
    ///
    /// `Deceased` is only ever added.
    pub fn refresh_status(&self, state: &mut PetState, now: DateTime<Utc>) {
        let r = &self.rules;
        let hunger = state.hunger();
        let health = state.health();
        let since_fed = elapsed(state.last_fed, now);

        let status = &mut state.status;
        status.set(StatusTag::Hungry, hunger > r.hungry_above);
        status.set(StatusTag::Healthy, health > r.healthy_above);
        status.set(StatusTag::Full, hunger == 0);

        let sick = health < r.sick_below;
        status.set(StatusTag::Sick, sick);
        if sick && since_fed > r.starvation {
            if !status.contains(StatusTag::Deceased) {
                tracing::info!(health, hours_unfed = since_fed.num_hours(), "pet has died");
            }
            status.insert(StatusTag::Deceased);
        }

        status.set(
            StatusTag::Bored,
            elapsed(state.last_played, now) > r.boredom,
        );
        status.set(
            StatusTag::Sad,
            elapsed(state.last_chatted, now) > r.loneliness,
        );
    }

    /// Lower hunger and restart the feeding clock.
    pub fn feed(&self, mut state: PetState, now: DateTime<Utc>) -> PetState {
        state.set_hunger(i64::from(state.hunger()) - FEED_AMOUNT);
        state.last_fed = now;
        state.decay = DecayLedger::default();
        self.refresh_status(&mut state, now);
        state
    }

    /// Restore some health.
    pub fn treat(&self, mut state: PetState, now: DateTime<Utc>) -> PetState {
        state.set_health(i64::from(state.health()) + TREAT_AMOUNT);
        self.refresh_status(&mut state, now);
        state
    }

    /// Restart the play clock.
    pub fn play(&self, mut state: PetState, now: DateTime<Utc>) -> PetState {
        state.last_played = now;
        self.refresh_status(&mut state, now);
        state
    }

    pub fn apply(&self, action: CareAction, state: PetState, now: DateTime<Utc>) -> PetState {
        match action {
            CareAction::Feed => self.feed(state, now),
            CareAction::Treat => self.treat(state, now),
            CareAction::Play => self.play(state, now),
        }
    }
}
