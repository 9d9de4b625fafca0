use std::time::Duration;

use pixelpet_sprite::SpriteError;

/// The text/image collaborator failed to produce a usable result.
///
/// Never retried by the core; the caller treats it as a failed turn.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("generator returned an empty response")]
    EmptyText,

    #[error("generator did not provide image bytes")]
    MissingImage,

    #[error("generator backend error: {0}")]
    Backend(String),

    #[error("generator timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("generator unavailable: {0}")]
    Unavailable(String),
}

/// Reading or writing the save file failed.
#[derive(thiserror::Error, Debug)]
pub enum SaveError {
    /// The document exists but cannot be turned into a consistent pet.
    #[error("corrupt save file: {0}")]
    Corrupt(String),

    #[error("save file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode save file: {0}")]
    Encode(#[from] serde_json::Error),
}

impl SaveError {
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }
}

/// Failures surfaced to the interactive loop for one turn.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("{name} has passed away")]
    Deceased { name: String },

    #[error("no message to send")]
    EmptyMessage,

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error(transparent)]
    Sprite(#[from] SpriteError),
}
