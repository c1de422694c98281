use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{ReelError, ReelResult};

fn default_output_name() -> String {
    "video.mp4".to_string()
}

fn default_effect() -> String {
    "static".to_string()
}

fn default_transition() -> String {
    "cut".to_string()
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// Everything one render needs from upstream: a title, where to write, and the scenes.
///
/// Storyboards are produced by collaborators (script generation, image/speech providers) and
/// are read-only to the engine.
pub struct Storyboard {
    /// Title shown on the title card.
    pub title: String,
    /// Directory the final video is written into.
    pub output_dir: PathBuf,
    /// File name of the final video inside `output_dir`.
    #[serde(default = "default_output_name")]
    pub output_name: String,
    /// Scenes; play order is defined by [`Scene::number`], not by position.
    pub scenes: Vec<Scene>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// One narrative beat.
pub struct Scene {
    /// Unique ordinal; defines play order.
    pub number: u32,
    /// Visual segments in spoken order.
    pub segments: Vec<VisualSegment>,
    /// Narration audio. The scene's duration is this file's duration.
    pub audio: PathBuf,
    /// Motion effect name chosen upstream.
    #[serde(default = "default_effect")]
    pub effect: String,
    /// How this scene joins the next one.
    #[serde(default = "default_transition")]
    pub transition: String,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// A unit of spoken text paired with one generated visual.
pub struct VisualSegment {
    /// Spoken text; weights the duration split and feeds optional subtitles.
    #[serde(default)]
    pub text: String,
    /// Still image, required even when a usable motion clip is present: it is loaded up
    /// front as the fallback, and a missing or unreadable still skips the whole scene.
    pub image: PathBuf,
    /// Pre-generated motion clip for this segment.
    #[serde(default)]
    pub clip: Option<PathBuf>,
    /// Prompt for the motion-clip provider when no clip exists yet.
    #[serde(default)]
    pub motion_prompt: Option<String>,
}

impl VisualSegment {
    /// Segment backed only by a still image.
    pub fn still(text: impl Into<String>, image: impl Into<PathBuf>) -> Self {
        Self {
            text: text.into(),
            image: image.into(),
            clip: None,
            motion_prompt: None,
        }
    }

    /// Segment with a motion clip and its still-image fallback.
    pub fn motion(
        text: impl Into<String>,
        image: impl Into<PathBuf>,
        clip: impl Into<PathBuf>,
    ) -> Self {
        Self {
            clip: Some(clip.into()),
            ..Self::still(text, image)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Kind of visual asset behind a segment.
pub enum AssetKind {
    /// A still image held for the whole segment.
    Still,
    /// A short video clip with its own native duration.
    Motion,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// Resolved handle to a visual asset.
pub struct AssetRef {
    /// Local file path.
    pub path: PathBuf,
    /// Declared kind.
    pub kind: AssetKind,
    /// Native duration discovered when the clip was opened (motion clips only).
    pub native_duration: Option<f64>,
}

impl AssetRef {
    pub fn still(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: AssetKind::Still,
            native_duration: None,
        }
    }

    pub fn motion(path: impl Into<PathBuf>, native_duration: f64) -> Self {
        Self {
            path: path.into(),
            kind: AssetKind::Motion,
            native_duration: Some(native_duration),
        }
    }
}

impl Storyboard {
    /// Load a storyboard from JSON; relative paths resolve against the file's directory.
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read storyboard '{}'", path.display()))?;
        let mut board: Self = serde_json::from_str(&text)
            .map_err(|e| ReelError::validation(format!("invalid storyboard json: {e}")))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        board.resolve_relative_to(base);
        board.validate()?;
        Ok(board)
    }

    /// Final output path.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_name)
    }

    /// Rebase every relative path onto `base`.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        let rebase = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        rebase(&mut self.output_dir);
        for scene in &mut self.scenes {
            rebase(&mut scene.audio);
            for seg in &mut scene.segments {
                rebase(&mut seg.image);
                if let Some(clip) = seg.clip.as_mut() {
                    rebase(clip);
                }
            }
        }
    }

    /// Structural checks: unique scene numbers, at least one segment per scene.
    pub fn validate(&self) -> ReelResult<()> {
        if self.output_name.trim().is_empty() {
            return Err(ReelError::validation("output_name must be non-empty"));
        }
        let mut seen = BTreeSet::new();
        for scene in &self.scenes {
            if !seen.insert(scene.number) {
                return Err(ReelError::validation(format!(
                    "duplicate scene number {}",
                    scene.number
                )));
            }
            if scene.segments.is_empty() {
                return Err(ReelError::validation(format!(
                    "scene {} has no visual segments",
                    scene.number
                )));
            }
        }
        Ok(())
    }

    /// Scenes in play order.
    pub fn ordered_scenes(&self) -> Vec<&Scene> {
        let mut scenes: Vec<&Scene> = self.scenes.iter().collect();
        scenes.sort_by_key(|s| s.number);
        scenes
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
