use std::time::Instant;

use crate::lifecycle::CareAction;

/// Semantic events flowing through the app loop.
///
/// Raw key presses are translated into these by the active screen before
/// they reach the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Tick { now: Instant },
    Resize { cols: u16, rows: u16 },
    Care(CareAction),
    ChatSubmitted(String),
    /// Accept the current candidate under `name` (blank keeps its name).
    Adopt { name: String },
    /// Draw a different candidate.
    Reroll,
    Quit,
}
