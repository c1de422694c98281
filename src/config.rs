//! Immutable render configuration.
//!
//! Every encoding and styling knob the engine reads lives here and is passed explicitly into
//! [`crate::render_storyboard`]. Nothing is read from global state while rendering.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context as _;

use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ReelError, ReelResult};

/// Output aspect ratio; each maps to a default 1080p-class resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectRatio {
    /// 16:9, 1920x1080.
    #[default]
    #[serde(alias = "16:9")]
    Landscape,
    /// 9:16, 1080x1920.
    #[serde(alias = "9:16")]
    Portrait,
    /// 1:1, 1080x1080.
    #[serde(alias = "1:1")]
    Square,
}

impl AspectRatio {
    /// Default output canvas for this aspect ratio.
    pub fn canvas(self) -> Canvas {
        match self {
            Self::Landscape => Canvas {
                width: 1920,
                height: 1080,
            },
            Self::Portrait => Canvas {
                width: 1080,
                height: 1920,
            },
            Self::Square => Canvas {
                width: 1080,
                height: 1080,
            },
        }
    }
}

impl FromStr for AspectRatio {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "landscape" | "16:9" | "wide" => Ok(Self::Landscape),
            "portrait" | "9:16" | "vertical" => Ok(Self::Portrait),
            "square" | "1:1" => Ok(Self::Square),
            other => Err(ReelError::validation(format!(
                "unknown aspect ratio '{other}' (expected landscape, portrait or square)"
            ))),
        }
    }
}

/// Encoder quality level, passed through to x264.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityPreset {
    /// Fast previews.
    Draft,
    /// Balanced default.
    #[default]
    Standard,
    /// Slow, high quality.
    High,
}

impl QualityPreset {
    /// x264 `-preset` value.
    pub fn x264_preset(self) -> &'static str {
        match self {
            Self::Draft => "ultrafast",
            Self::Standard => "medium",
            Self::High => "slow",
        }
    }

    /// x264 constant rate factor.
    pub fn crf(self) -> u8 {
        match self {
            Self::Draft => 30,
            Self::Standard => 23,
            Self::High => 18,
        }
    }
}

impl FromStr for QualityPreset {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" | "low" => Ok(Self::Draft),
            "standard" | "medium" => Ok(Self::Standard),
            "high" => Ok(Self::High),
            other => Err(ReelError::validation(format!(
                "unknown quality preset '{other}' (expected draft, standard or high)"
            ))),
        }
    }
}

/// Render-wide settings, immutable for the duration of one render.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Output frame rate (whole frames per second).
    pub fps: u32,
    /// Output aspect ratio.
    pub aspect: AspectRatio,
    /// Explicit output resolution; overrides `aspect` when set.
    pub resolution: Option<Canvas>,
    /// Encoder quality level.
    pub quality: QualityPreset,
    /// Title card duration at the start of the timeline, in seconds.
    pub title_secs: f64,
    /// Title card fade in/out duration, in seconds.
    pub title_fade_secs: f64,
    /// Starting font size for the title card.
    pub title_font_px: f32,
    /// Draw each segment's text as a subtitle over its clip.
    pub subtitles: bool,
    /// Starting font size for subtitles.
    pub subtitle_font_px: f32,
    /// Length of a scene-to-scene transition, centred on the boundary.
    pub transition_secs: f64,
    /// Main text colour (straight RGBA8).
    pub theme_rgba8: [u8; 4],
    /// Text shadow colour (straight RGBA8).
    pub shadow_rgba8: [u8; 4],
    /// Shadow offset in pixels (applied to both axes).
    pub shadow_offset_px: f32,
    /// Colour behind letterboxed or transparent content.
    pub background_rgba8: [u8; 4],
    /// TTF/OTF font used for overlays. Overlays are disabled when unset or unreadable.
    pub font_path: Option<PathBuf>,
    /// Worker threads for per-scene asset preparation (defaults to the CPU count).
    pub concurrency: Option<usize>,
    /// Replace an existing output file.
    pub overwrite: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            aspect: AspectRatio::Landscape,
            resolution: None,
            quality: QualityPreset::Standard,
            title_secs: 3.0,
            title_fade_secs: 0.5,
            title_font_px: 96.0,
            subtitles: false,
            subtitle_font_px: 48.0,
            transition_secs: 0.5,
            theme_rgba8: [255, 255, 255, 255],
            shadow_rgba8: [0, 0, 0, 200],
            shadow_offset_px: 3.0,
            background_rgba8: [0, 0, 0, 255],
            font_path: None,
            concurrency: None,
            overwrite: true,
        }
    }
}

impl RenderConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read render config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(text: &str) -> ReelResult<Self> {
        let cfg: Self = serde_json::from_str(text)
            .map_err(|e| ReelError::validation(format!("invalid render config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Output canvas after applying the resolution override.
    pub fn canvas(&self) -> Canvas {
        self.resolution.unwrap_or_else(|| self.aspect.canvas())
    }

    /// Output frame rate.
    pub fn frame_rate(&self) -> ReelResult<Fps> {
        Fps::whole(self.fps)
    }

    /// Check every knob for values the encoder or layout cannot work with.
    pub fn validate(&self) -> ReelResult<()> {
        if self.fps == 0 {
            return Err(ReelError::validation("fps must be non-zero"));
        }
        let canvas = self.canvas();
        if canvas.width == 0 || canvas.height == 0 {
            return Err(ReelError::validation("resolution must be non-zero"));
        }
        if !canvas.width.is_multiple_of(2) || !canvas.height.is_multiple_of(2) {
            // yuv420p output needs even dimensions.
            return Err(ReelError::validation(
                "resolution width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if canvas.width > u32::from(u16::MAX) || canvas.height > u32::from(u16::MAX) {
            return Err(ReelError::validation("resolution exceeds 65535 pixels"));
        }
        if !self.title_secs.is_finite() || self.title_secs < 0.0 {
            return Err(ReelError::validation(
                "title_secs must be finite and >= 0",
            ));
        }
        if !self.title_fade_secs.is_finite()
            || self.title_fade_secs < 0.0
            || self.title_fade_secs * 2.0 > self.title_secs
        {
            return Err(ReelError::validation(
                "title_fade_secs must be >= 0 and at most half of title_secs",
            ));
        }
        if !self.transition_secs.is_finite() || self.transition_secs < 0.0 {
            return Err(ReelError::validation(
                "transition_secs must be finite and >= 0",
            ));
        }
        for (name, px) in [
            ("title_font_px", self.title_font_px),
            ("subtitle_font_px", self.subtitle_font_px),
        ] {
            if !px.is_finite() || px <= 0.0 {
                return Err(ReelError::validation(format!(
                    "{name} must be finite and > 0"
                )));
            }
        }
        if !self.shadow_offset_px.is_finite() {
            return Err(ReelError::validation("shadow_offset_px must be finite"));
        }
        if self.concurrency == Some(0) {
            return Err(ReelError::validation("concurrency must be >= 1 when set"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
