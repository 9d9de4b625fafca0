use chrono::{DateTime, Utc};
use rand::Rng;

use crate::roster::{Roster, TRAIT_COUNT};
use crate::state::PetState;

pub const DEFAULT_EMOTION: &str = "happy";
/// Name carried by a candidate until the owner picks one.
pub const PLACEHOLDER_NAME: &str = "no_name";
/// Starting hunger of a freshly drawn candidate.
pub const CANDIDATE_HUNGER: i64 = 10;

/// A pet: its profile plus its live [`PetState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pet {
    pub name: String,
    pub animal_type: String,
    pub characteristics: [String; TRAIT_COUNT],
    pub emotion: String,
    /// Sprite sheet number under the animations directory, once adopted.
    pub image_number: Option<u32>,
    /// Transcript of owner messages, pet replies and reactions.
    pub chat_history: String,
    pub state: PetState,
}

impl Pet {
    /// Draw a random candidate from `roster`.
    pub fn candidate<R: Rng + ?Sized>(roster: &Roster, rng: &mut R, now: DateTime<Utc>) -> Self {
        Self {
            name: PLACEHOLDER_NAME.to_string(),
            animal_type: roster.pick_animal(rng),
            characteristics: roster.pick_traits(rng),
            emotion: DEFAULT_EMOTION.to_string(),
            image_number: None,
            chat_history: String::new(),
            state: PetState::with_vitals(100, CANDIDATE_HUNGER, now),
        }
    }

    /// Dominant trait, used to set the tone of reactions.
    pub fn primary_trait(&self) -> &str {
        &self.characteristics[0]
    }

    pub fn traits_joined(&self) -> String {
        self.characteristics.join(", ")
    }
}
