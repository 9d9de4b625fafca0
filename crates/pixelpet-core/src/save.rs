use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use pixelpet_config::fs::write_atomic;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SaveError;
use crate::pet::{Pet, DEFAULT_EMOTION};
use crate::roster::Roster;
use crate::state::{DecayLedger, PetState, VITAL_MAX};
use crate::status::{StatusSet, StatusTag};

const DEFAULT_NAME: &str = "Pet";
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"];
const LEGACY_EMOTIONS: &[(&str, &str)] = &[("feliz", "happy")];
const LEGACY_CHAT_PHRASES: &[(&str, &str)] = &[
    ("Seu pet reagiu:", "Your pet reacted:"),
    (
        "O peixe é eficiente. Repõe o que faltava e garante a energia para nadar e estar pronto para o próximo mergulho.",
        "Fish is efficient. It replenishes what was missing and keeps you energized to swim and be ready for the next dive.",
    ),
];

/// On-disk shape of the save file.
#[derive(Debug, Serialize, Deserialize)]
struct SaveDocument {
    #[serde(default = "default_name")]
    name: String,
    #[serde(default)]
    animal_type: Option<String>,
    #[serde(default)]
    characteristics: Vec<String>,
    #[serde(default = "default_health")]
    health: i64,
    #[serde(default)]
    hunger: i64,
    #[serde(default = "default_emotion")]
    emotion: String,
    #[serde(default)]
    status: Vec<String>,
    #[serde(default)]
    image_number: Option<u32>,
    #[serde(default)]
    last_fed_time: Option<String>,
    #[serde(default)]
    last_play_time: Option<String>,
    #[serde(default)]
    last_chat_time: Option<String>,
    #[serde(default)]
    chat_history: Option<String>,
    #[serde(default)]
    hunger_minutes_applied: u64,
    #[serde(default)]
    health_blocks_applied: u64,
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_health() -> i64 {
    i64::from(VITAL_MAX)
}

fn default_emotion() -> String {
    DEFAULT_EMOTION.to_string()
}

/// RFC 3339 UTC with microsecond precision.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC 3339 timestamp, or a naive one read as local time.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, SaveError> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| SaveError::corrupt(format!("unreadable timestamp {raw:?}")))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|at| at.with_timezone(&Utc))
        .ok_or_else(|| SaveError::corrupt(format!("timestamp {raw:?} does not exist locally")))
}

fn timestamp_or(raw: Option<&str>, now: DateTime<Utc>) -> Result<DateTime<Utc>, SaveError> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => parse_timestamp(raw),
        _ => Ok(now),
    }
}

fn replace_legacy<'a>(value: &'a str, table: &[(&str, &'a str)]) -> &'a str {
    table
        .iter()
        .find(|(legacy, _)| *legacy == value)
        .map_or(value, |&(_, current)| current)
}

fn normalize_chat(history: String) -> String {
    LEGACY_CHAT_PHRASES
        .iter()
        .fold(history, |text, (legacy, current)| text.replace(legacy, current))
}

impl SaveDocument {
    fn from_pet(pet: &Pet) -> Self {
        let state = &pet.state;
        Self {
            name: pet.name.clone(),
            animal_type: Some(pet.animal_type.clone()),
            characteristics: pet.characteristics.to_vec(),
            health: i64::from(state.health()),
            hunger: i64::from(state.hunger()),
            emotion: pet.emotion.clone(),
            status: state.status.names().into_iter().map(String::from).collect(),
            image_number: pet.image_number,
            last_fed_time: Some(format_timestamp(state.last_fed)),
            last_play_time: Some(format_timestamp(state.last_played)),
            last_chat_time: Some(format_timestamp(state.last_chatted)),
            chat_history: Some(pet.chat_history.clone()),
            hunger_minutes_applied: state.decay.minutes_applied,
            health_blocks_applied: state.decay.blocks_applied,
        }
    }

    /// Build a consistent pet, rewriting legacy vocabulary on the way.
    fn into_pet<R: Rng + ?Sized>(
        self,
        roster: &Roster,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<Pet, SaveError> {
        let mut state = PetState::with_vitals(self.health, self.hunger, now);
        state.last_fed = timestamp_or(self.last_fed_time.as_deref(), now)?;
        state.last_played = timestamp_or(self.last_play_time.as_deref(), now)?;
        state.last_chatted = timestamp_or(self.last_chat_time.as_deref(), now)?;
        state.decay = DecayLedger {
            minutes_applied: self.hunger_minutes_applied,
            blocks_applied: self.health_blocks_applied,
        };

        let mut status = StatusSet::new();
        for name in &self.status {
            match StatusTag::from_name(name) {
                Some(tag) => status.insert(tag),
                None => tracing::warn!(status = %name, "dropping unknown status from save file"),
            }
        }
        state.status = status;

        let animal_type = match self.animal_type.map(|a| a.trim().to_string()) {
            Some(animal) if !animal.is_empty() => animal,
            _ => roster.pick_animal(rng),
        };

        Ok(Pet {
            name: self.name,
            animal_type,
            characteristics: roster.complete_traits(self.characteristics, rng),
            emotion: replace_legacy(self.emotion.trim(), LEGACY_EMOTIONS).to_string(),
            image_number: self.image_number,
            chat_history: normalize_chat(self.chat_history.unwrap_or_default()),
            state,
        })
    }
}

/// Serialize a pet to the save file format.
pub fn encode(pet: &Pet) -> Result<String, SaveError> {
    Ok(serde_json::to_string_pretty(&SaveDocument::from_pet(pet))?)
}

/// Parse a save document. Timestamps absent from the file default to `now`.
pub fn decode<R: Rng + ?Sized>(
    json: &str,
    roster: &Roster,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<Pet, SaveError> {
    let doc: SaveDocument =
        serde_json::from_str(json).map_err(|e| SaveError::corrupt(e.to_string()))?;
    doc.into_pet(roster, rng, now)
}

/// The single-pet save file.
#[derive(Debug, Clone)]
pub struct SaveStore {
    path: PathBuf,
    roster: Roster,
}

impl SaveStore {
    pub fn new(path: impl Into<PathBuf>, roster: Roster) -> Self {
        Self {
            path: path.into(),
            roster,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Load the saved pet, or `None` when there is no save file yet.
    pub fn load(&self, now: DateTime<Utc>) -> Result<Option<Pet>, SaveError> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let pet = decode(&json, &self.roster, &mut rand::thread_rng(), now)?;
        tracing::info!(
            path = %self.path.display(),
            name = %pet.name,
            animal = %pet.animal_type,
            "loaded pet"
        );
        Ok(Some(pet))
    }

    /// Replace the save file atomically.
    pub fn save(&self, pet: &Pet) -> Result<(), SaveError> {
        let json = encode(pet)?;
        write_atomic(&self.path, json.as_bytes())?;
        tracing::debug!(path = %self.path.display(), "saved pet");
        Ok(())
    }
}
