use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

use crate::error::SaveError;

const ANIMAL_TYPES: &str = include_str!("../data/animal_types.json");
const PERSONALITY_TRAITS: &str = include_str!("../data/personality_traits.json");
const LANGUAGE: &str = "English";

/// Number of personality traits every pet carries.
pub const TRAIT_COUNT: usize = 3;

/// `{"English": [...]}` word lists keyed by language.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct WordList(BTreeMap<String, Vec<String>>);

impl WordList {
    fn parse(json: &str, what: &str) -> Result<Vec<String>, SaveError> {
        let WordList(mut by_lang) = serde_json::from_str(json)
            .map_err(|e| SaveError::corrupt(format!("{what} list: {e}")))?;
        let words: Vec<String> = by_lang
            .remove(LANGUAGE)
            .unwrap_or_default()
            .into_iter()
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        if words.is_empty() {
            return Err(SaveError::corrupt(format!("{what} list has no {LANGUAGE} entries")));
        }
        Ok(words)
    }
}

/// Animal types and personality traits that new pets are drawn from.
#[derive(Debug, Clone)]
pub struct Roster {
    animals: Vec<String>,
    traits: Vec<String>,
}

impl Roster {
    /// The word lists bundled with the crate.
    pub fn embedded() -> Result<Self, SaveError> {
        Self::from_json(ANIMAL_TYPES, PERSONALITY_TRAITS)
    }

    pub fn from_json(animals: &str, traits: &str) -> Result<Self, SaveError> {
        let animals = WordList::parse(animals, "animal type")?;
        let traits = WordList::parse(traits, "personality trait")?;
        if traits.len() < TRAIT_COUNT {
            return Err(SaveError::corrupt(format!(
                "need at least {TRAIT_COUNT} personality traits, found {}",
                traits.len()
            )));
        }
        Ok(Self { animals, traits })
    }

    pub fn animals(&self) -> &[String] {
        &self.animals
    }

    pub fn traits(&self) -> &[String] {
        &self.traits
    }

    pub fn pick_animal<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        self.animals
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| "cat".to_string())
    }

    /// Three distinct traits.
    pub fn pick_traits<R: Rng + ?Sized>(&self, rng: &mut R) -> [String; TRAIT_COUNT] {
        let mut picked = self.traits.choose_multiple(rng, TRAIT_COUNT).cloned();
        std::array::from_fn(|_| picked.next().unwrap_or_default())
    }

    /// Fill `existing` up to [`TRAIT_COUNT`] with traits it does not have yet,
    /// dropping anything past the third.
    pub fn complete_traits<R: Rng + ?Sized>(
        &self,
        existing: Vec<String>,
        rng: &mut R,
    ) -> [String; TRAIT_COUNT] {
        let mut traits: Vec<String> = existing
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .take(TRAIT_COUNT)
            .collect();

        let mut spare: Vec<&String> = self.traits.iter().filter(|t| !traits.contains(t)).collect();
        spare.shuffle(rng);
        let mut spare = spare.into_iter();
        while traits.len() < TRAIT_COUNT {
            match spare.next() {
                Some(t) => traits.push(t.clone()),
                None => break,
            }
        }

        let mut traits = traits.into_iter();
        std::array::from_fn(|_| traits.next().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn embedded_lists_load() {
        let roster = Roster::embedded().unwrap();
        assert!(roster.animals().len() >= 10);
        assert!(roster.traits().len() >= TRAIT_COUNT);
    }

    #[test]
    fn picked_traits_are_distinct() {
        let roster = Roster::embedded().unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let [a, b, c] = roster.pick_traits(&mut rng);
            assert!(a != b && b != c && a != c);
        }
    }

    #[test]
    fn picked_animal_comes_from_list() {
        let roster = Roster::embedded().unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let animal = roster.pick_animal(&mut rng);
        assert!(roster.animals().contains(&animal));
    }

    #[test]
    fn complete_traits_pads_and_truncates() {
        let roster = Roster::from_json(
            r#"{"English": ["cat"]}"#,
            r#"{"English": ["Brave", "Shy", "Witty", "Lazy"]}"#,
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let padded = roster.complete_traits(vec!["Brave".into()], &mut rng);
        assert_eq!(padded[0], "Brave");
        assert!(padded[1] != "Brave" && padded[2] != "Brave");
        assert!(!padded[1].is_empty() && !padded[2].is_empty());

        let cut = roster.complete_traits(
            vec!["A".into(), "B".into(), "C".into(), "D".into()],
            &mut rng,
        );
        assert_eq!(cut, ["A".to_string(), "B".into(), "C".into()]);
    }

    #[test]
    fn missing_language_is_rejected() {
        let err = Roster::from_json(r#"{"Deutsch": ["Katze"]}"#, PERSONALITY_TRAITS).unwrap_err();
        assert!(err.to_string().contains("English"));
    }

    #[test]
    fn too_few_traits_is_rejected() {
        assert!(Roster::from_json(ANIMAL_TYPES, r#"{"English": ["Shy", "Brave"]}"#).is_err());
    }
}
