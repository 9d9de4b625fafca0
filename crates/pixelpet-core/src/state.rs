use chrono::{DateTime, Utc};

use crate::status::{StatusSet, StatusTag};

/// Upper bound for both vitals.
pub const VITAL_MAX: u8 = 100;

/// Clamp an arbitrary integer into `0..=VITAL_MAX`.
pub fn clamp_vital(value: i64) -> u8 {
    value.clamp(0, i64::from(VITAL_MAX)) as u8
}

/// How much of the time since `last_fed` has already been charged.
///
/// Hunger accrues per whole minute and health decays per whole block of
/// minutes. Recording what was charged lets repeated lifecycle ticks apply
/// only the newly elapsed portion, so ticking twice at the same instant
/// changes nothing. Feeding resets the ledger along with `last_fed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecayLedger {
    pub minutes_applied: u64,
    pub blocks_applied: u64,
}

/// The mutable vitals and timestamps of one pet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetState {
    health: u8,
    hunger: u8,
    pub status: StatusSet,
    pub last_fed: DateTime<Utc>,
    pub last_played: DateTime<Utc>,
    pub last_chatted: DateTime<Utc>,
    pub decay: DecayLedger,
}

impl PetState {
    /// A freshly hatched pet: full health, not hungry, every clock at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_vitals(i64::from(VITAL_MAX), 0, now)
    }

    /// Build a state with clamped vitals and every clock at `now`.
    pub fn with_vitals(health: i64, hunger: i64, now: DateTime<Utc>) -> Self {
        Self {
            health: clamp_vital(health),
            hunger: clamp_vital(hunger),
            status: StatusSet::new(),
            last_fed: now,
            last_played: now,
            last_chatted: now,
            decay: DecayLedger::default(),
        }
    }

    pub fn health(&self) -> u8 {
        self.health
    }

    pub fn hunger(&self) -> u8 {
        self.hunger
    }

    pub fn set_health(&mut self, value: i64) {
        self.health = clamp_vital(value);
    }

    pub fn set_hunger(&mut self, value: i64) {
        self.hunger = clamp_vital(value);
    }

    pub fn is_deceased(&self) -> bool {
        self.status.contains(StatusTag::Deceased)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vitals_clamp_on_construction() {
        let state = PetState::with_vitals(250, -40, Utc::now());
        assert_eq!(state.health(), 100);
        assert_eq!(state.hunger(), 0);
    }

    #[test]
    fn setters_clamp() {
        let mut state = PetState::new(Utc::now());
        state.set_hunger(130);
        state.set_health(-5);
        assert_eq!(state.hunger(), VITAL_MAX);
        assert_eq!(state.health(), 0);
    }

    #[test]
    fn new_pet_is_alive_and_fed() {
        let now = Utc::now();
        let state = PetState::new(now);
        assert_eq!(state.health(), 100);
        assert_eq!(state.hunger(), 0);
        assert_eq!(state.last_fed, now);
        assert!(!state.is_deceased());
        assert_eq!(state.decay, DecayLedger::default());
    }
}
