use chrono::{DateTime, Utc};

use crate::error::SessionError;
use crate::generate::Generator;
use crate::lifecycle::{CareAction, LifecycleEngine};
use crate::pet::{Pet, DEFAULT_EMOTION};
use crate::prompt;
use crate::save::SaveStore;
use crate::state::PetState;

/// An adopted pet, its lifecycle rules, where it is saved, and who speaks
/// for it.
///
/// All mutation goes through here so the lifecycle is brought up to date
/// before every decision and every change is persisted.
pub struct Session<G> {
    pet: Pet,
    engine: LifecycleEngine,
    store: SaveStore,
    generator: G,
}

impl<G: Generator> Session<G> {
    pub fn new(pet: Pet, engine: LifecycleEngine, store: SaveStore, generator: G) -> Self {
        Self {
            pet,
            engine,
            store,
            generator,
        }
    }

    pub fn pet(&self) -> &Pet {
        &self.pet
    }

    pub fn state(&self) -> &PetState {
        &self.pet.state
    }

    pub fn generator_mut(&mut self) -> &mut G {
        &mut self.generator
    }

    pub fn engine(&self) -> &LifecycleEngine {
        &self.engine
    }

    /// Apply elapsed time. The caller checks the result for death.
    pub fn tick(&mut self, now: DateTime<Utc>) -> &PetState {
        let state = std::mem::replace(&mut self.pet.state, PetState::new(now));
        let was_deceased = state.is_deceased();
        self.pet.state = self.engine.advance(state, now);
        if self.pet.state.is_deceased() && !was_deceased {
            if let Err(err) = self.store.save(&self.pet) {
                tracing::warn!(error = %err, "failed to save after death");
            }
        }
        &self.pet.state
    }

    fn ensure_alive(&self) -> Result<(), SessionError> {
        if self.pet.state.is_deceased() {
            return Err(SessionError::Deceased {
                name: self.pet.name.clone(),
            });
        }
        Ok(())
    }

    /// Perform a care action and persist the result.
    ///
    /// Elapsed time is charged first, so an action never lands on stale
    /// vitals. A pet that dies from that catch-up cannot be cared for.
    pub fn care(&mut self, action: CareAction, now: DateTime<Utc>) -> Result<&PetState, SessionError> {
        self.tick(now);
        self.ensure_alive()?;

        let state = std::mem::replace(&mut self.pet.state, PetState::new(now));
        self.pet.state = self.engine.apply(action, state, now);
        self.pet.emotion = DEFAULT_EMOTION.to_string();
        self.store.save(&self.pet)?;

        tracing::info!(
            %action,
            health = self.pet.state.health(),
            hunger = self.pet.state.hunger(),
            "care action applied"
        );
        Ok(&self.pet.state)
    }

    pub fn feed(&mut self, now: DateTime<Utc>) -> Result<&PetState, SessionError> {
        self.care(CareAction::Feed, now)
    }

    pub fn treat(&mut self, now: DateTime<Utc>) -> Result<&PetState, SessionError> {
        self.care(CareAction::Treat, now)
    }

    pub fn play(&mut self, now: DateTime<Utc>) -> Result<&PetState, SessionError> {
        self.care(CareAction::Play, now)
    }

    /// Ask the pet to comment on `action` and record the reply.
    ///
    /// Failure leaves the history untouched; the care action itself has
    /// already been saved.
    pub fn react(&mut self, action: CareAction) -> Result<String, SessionError> {
        self.ensure_alive()?;
        let reply = self
            .generator
            .generate_text(&prompt::reaction(&self.pet, action))?;
        self.pet
            .chat_history
            .push_str(&format!("Your pet reacted: {reply}\n"));
        self.store.save(&self.pet)?;
        Ok(reply)
    }

    /// Send `message` to the pet and return its reply.
    ///
    /// History and the chat clock change only when a reply arrives.
    pub fn chat(&mut self, message: &str, now: DateTime<Utc>) -> Result<String, SessionError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        self.tick(now);
        self.ensure_alive()?;

        let reply = self
            .generator
            .generate_text(&prompt::chat(&self.pet, message))?;

        self.pet
            .chat_history
            .push_str(&format!("You: {message}\nPet: {reply}\n"));
        self.pet.state.last_chatted = now;
        self.engine.refresh_status(&mut self.pet.state, now);
        self.store.save(&self.pet)?;
        tracing::debug!(chars = reply.len(), "pet replied");
        Ok(reply)
    }

    pub fn save(&self) -> Result<(), SessionError> {
        Ok(self.store.save(&self.pet)?)
    }

    pub fn into_parts(self) -> (Pet, G) {
        (self.pet, self.generator)
    }
}
