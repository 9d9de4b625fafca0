use std::collections::BTreeSet;
use std::fmt;

/// Canonical pet condition labels.
///
/// Variant order is the display order used by [`StatusSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusTag {
    Hungry,
    Healthy,
    Full,
    Sick,
    Bored,
    Sad,
    /// Terminal: once present it is never removed.
    Deceased,
}

/// Older saves recorded statuses in a localized vocabulary.
const LEGACY_STATUS_NAMES: &[(&str, StatusTag)] = &[
    ("Faminto", StatusTag::Hungry),
    ("Saudavel", StatusTag::Healthy),
    ("Doente", StatusTag::Sick),
    ("Entediado", StatusTag::Bored),
    ("Triste", StatusTag::Sad),
    ("Morto", StatusTag::Deceased),
    ("Nao querendo comer", StatusTag::Full),
];

impl StatusTag {
    pub const COUNT: usize = 7;

    pub const ALL: [StatusTag; Self::COUNT] = [
        StatusTag::Hungry,
        StatusTag::Healthy,
        StatusTag::Full,
        StatusTag::Sick,
        StatusTag::Bored,
        StatusTag::Sad,
        StatusTag::Deceased,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatusTag::Hungry => "Hungry",
            StatusTag::Healthy => "Healthy",
            StatusTag::Full => "Full",
            StatusTag::Sick => "Sick",
            StatusTag::Bored => "Bored",
            StatusTag::Sad => "Sad",
            StatusTag::Deceased => "Deceased",
        }
    }

    /// Resolve a persisted status name, accepting the legacy vocabulary.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == name)
            .or_else(|| {
                LEGACY_STATUS_NAMES
                    .iter()
                    .find(|(legacy, _)| *legacy == name)
                    .map(|&(_, tag)| tag)
            })
    }
}

impl fmt::Display for StatusTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deduplicated set of status tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSet(BTreeSet<StatusTag>);

impl StatusSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, tag: StatusTag) -> bool {
        self.0.contains(&tag)
    }

    pub fn insert(&mut self, tag: StatusTag) {
        self.0.insert(tag);
    }

    /// Add `tag` when `present`, remove it otherwise.
    ///
    /// [`StatusTag::Deceased`] can be added but never removed.
    pub fn set(&mut self, tag: StatusTag, present: bool) {
        if present {
            self.0.insert(tag);
        } else if tag != StatusTag::Deceased {
            self.0.remove(&tag);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = StatusTag> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Tag names joined by `", "`.
    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(StatusTag::as_str).collect()
    }

    /// Comma-separated tag names, or `fallback` for an empty set.
    pub fn describe(&self, fallback: &str) -> String {
        if self.is_empty() {
            fallback.to_string()
        } else {
            self.names().join(", ")
        }
    }
}

impl FromIterator<StatusTag> for StatusSet {
    fn from_iter<I: IntoIterator<Item = StatusTag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
