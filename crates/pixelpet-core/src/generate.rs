use crate::error::GenerationError;

/// The external text and image producer.
///
/// Calls block until the backend answers or gives up. Implementations are
/// never retried by the core: any error fails the current turn only.
pub trait Generator {
    /// Produce a non-empty reply for `prompt`.
    fn generate_text(&mut self, prompt: &str) -> Result<String, GenerationError>;

    /// Produce encoded image bytes: PNG, JPEG, WebP or GIF.
    fn generate_image(&mut self, prompt: &str) -> Result<Vec<u8>, GenerationError>;

    /// Short label for logs and the status bar.
    fn name(&self) -> &str;
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn generate_text(&mut self, prompt: &str) -> Result<String, GenerationError> {
        (**self).generate_text(prompt)
    }

    fn generate_image(&mut self, prompt: &str) -> Result<Vec<u8>, GenerationError> {
        (**self).generate_image(prompt)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Trim a text reply, rejecting one that is blank.
pub fn require_text(raw: &str) -> Result<String, GenerationError> {
    let text = raw.trim();
    if text.is_empty() {
        Err(GenerationError::EmptyText)
    } else {
        Ok(text.to_string())
    }
}

/// Reject an empty image payload.
pub fn require_image(bytes: Vec<u8>) -> Result<Vec<u8>, GenerationError> {
    if bytes.is_empty() {
        Err(GenerationError::MissingImage)
    } else {
        Ok(bytes)
    }
}
