use std::path::{Path, PathBuf};

pub type ReelResult<T> = Result<T, ReelError>;

#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("missing asset: '{}'", path.display())]
    MissingAsset { path: PathBuf },

    #[error("unreadable asset '{}': {reason}", path.display())]
    UnreadableAsset { path: PathBuf, reason: String },

    #[error("no renderable scenes: every scene was skipped ({skipped} skipped)")]
    NoRenderableScenes { skipped: usize },

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn missing(path: impl AsRef<Path>) -> Self {
        Self::MissingAsset {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn unreadable(path: impl AsRef<Path>, reason: impl std::fmt::Display) -> Self {
        Self::UnreadableAsset {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Whether this error only concerns one asset (and therefore one scene).
    pub fn is_asset_error(&self) -> bool {
        matches!(self, Self::MissingAsset { .. } | Self::UnreadableAsset { .. })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
