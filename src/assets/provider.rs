use std::path::{Path, PathBuf};

use crate::foundation::error::{ReelError, ReelResult};

/// Produces a short motion clip from a still image and a motion prompt.
///
/// Generation itself happens elsewhere; the compositor only calls this for segments that carry
/// a motion prompt but no clip, and treats any error as "use the still image".
pub trait MotionClipProvider: Send + Sync {
    fn generate(&self, image: &Path, prompt: &str) -> ReelResult<PathBuf>;
}

#[derive(Clone, Copy, Debug, Default)]
/// Provider that never produces clips, so every prompt-only segment renders as a still.
pub struct NoMotionProvider;

impl MotionClipProvider for NoMotionProvider {
    fn generate(&self, image: &Path, _prompt: &str) -> ReelResult<PathBuf> {
        Err(ReelError::validation(format!(
            "no motion clip provider configured for '{}'",
            image.display()
        )))
    }
}

#[derive(Clone, Debug)]
/// Provider that looks for a pre-generated clip next to the image (`<stem>.<extension>`).
pub struct SiblingClipProvider {
    extension: String,
}

impl SiblingClipProvider {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }
}

impl Default for SiblingClipProvider {
    fn default() -> Self {
        Self::new("mp4")
    }
}

impl MotionClipProvider for SiblingClipProvider {
    fn generate(&self, image: &Path, _prompt: &str) -> ReelResult<PathBuf> {
        let clip = image.with_extension(&self.extension);
        if clip.is_file() {
            Ok(clip)
        } else {
            Err(ReelError::missing(clip))
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/provider.rs"]
mod tests;
