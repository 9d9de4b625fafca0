use std::path::Path;

/// Failures while decoding, segmenting or persisting sprite data.
#[derive(thiserror::Error, Debug)]
pub enum SpriteError {
    /// The source image cannot be segmented (e.g. zero area).
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// The image bytes could not be decoded or encoded.
    #[error("image codec error: {0}")]
    Decode(#[from] image::ImageError),

    /// Reading or writing a sheet or atlas file failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The atlas document is malformed or lacks the requested entry.
    #[error("atlas error: {0}")]
    Atlas(String),
}

impl SpriteError {
    pub(crate) fn io(action: &str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            context: format!("failed to {action} {}", path.display()),
            source,
        }
    }
}
