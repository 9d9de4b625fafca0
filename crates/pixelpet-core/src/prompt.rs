//! Prompt text sent to the generator.

use crate::lifecycle::CareAction;
use crate::pet::Pet;

pub const SPRITE_SHEET_FRAMES: u32 = 6;

/// Persona instructions that open a new conversation.
pub fn persona(pet: &Pet) -> String {
    format!(
        "You are a {animal} virtual pet named {name}. Your personality is {traits}. \
         You currently feel {feeling}. Answer your owner in one or two short sentences, \
         staying in character.",
        animal = pet.animal_type,
        name = pet.name,
        traits = pet.traits_joined(),
        feeling = pet.state.status.describe("content"),
    )
}

/// The full prompt for one chat turn.
pub fn chat(pet: &Pet, message: &str) -> String {
    let turn = format!("You: {message}\n");
    if pet.chat_history.is_empty() {
        format!("{}\n{turn}", persona(pet))
    } else {
        format!("{}{turn}", pet.chat_history)
    }
}

/// The prompt asking the pet to react to a care action.
pub fn reaction(pet: &Pet, action: CareAction) -> String {
    format!(
        "{history}As a {animal} who currently feels {feeling}, say something when your owner {phrase}. \
         Respond in a {tone} tone.",
        history = pet.chat_history,
        animal = pet.animal_type,
        feeling = pet.state.status.describe("content"),
        phrase = action.owner_phrase(),
        tone = pet.primary_trait().to_lowercase(),
    )
}

pub fn sprite_sheet(animal: &str) -> String {
    format!(
        "a 16 bit sprite-sheet like a tamagochi of a {animal} face with {SPRITE_SHEET_FRAMES} frames and black background"
    )
}

pub fn farewell(animal: &str) -> String {
    format!("a 16 bit pixel art of a dead {animal} like a tamagotchi on a black background")
}
