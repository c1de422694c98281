//! Font-size fitting and greedy word wrap.
//!
//! Fitting only needs advances and line heights, so it runs against the [`TextMeasure`] trait.
//! [`FontMeasure`] answers those questions with parley over real font bytes; tests use a
//! fixed-advance measurer instead.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::foundation::error::{ReelError, ReelResult};

/// Shrink step while fitting.
pub const FIT_STEP_PX: f32 = 2.0;
/// Smallest size tried, as a fraction of the start size.
pub const FLOOR_RATIO: f32 = 0.4;
/// Absolute lower bound for the floor.
pub const MIN_FLOOR_PX: f32 = 20.0;

/// Fonts tried, in order, when no font is configured.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Text metrics needed for fitting.
pub trait TextMeasure {
    /// Horizontal advance of `text` set on one line at `size_px`.
    fn advance(&mut self, text: &str, size_px: f32) -> f32;
    /// Distance between consecutive baselines at `size_px`.
    fn line_height(&mut self, size_px: f32) -> f32;
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
/// Box the text must fit; either side may be unconstrained.
pub struct TextBounds {
    pub max_width: Option<f32>,
    pub max_height: Option<f32>,
}

impl TextBounds {
    pub fn new(max_width: f32, max_height: f32) -> Self {
        Self {
            max_width: Some(max_width),
            max_height: Some(max_height),
        }
    }

    pub fn width_only(max_width: f32) -> Self {
        Self {
            max_width: Some(max_width),
            max_height: None,
        }
    }

    pub fn height_only(max_height: f32) -> Self {
        Self {
            max_width: None,
            max_height: Some(max_height),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// Result of [`fit_text`].
pub struct FittedText {
    /// Chosen font size, between the floor and the start size.
    pub size_px: f32,
    /// Wrapped lines, in order.
    pub lines: Vec<String>,
    /// The floor was reached and the text still does not fit.
    pub overflow: bool,
}

/// Smallest size [`fit_text`] will try for a given start size.
pub fn floor_size(start_px: f32) -> f32 {
    (start_px * FLOOR_RATIO).max(MIN_FLOOR_PX).min(start_px)
}

/// Greedy word wrap. Words are never split; a word wider than `max_width` gets its own line.
/// Explicit newlines always break.
pub fn wrap_words<M: TextMeasure + ?Sized>(
    text: &str,
    max_width: Option<f32>,
    size_px: f32,
    measure: &mut M,
) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if line.is_empty() {
                line.push_str(word);
                continue;
            }
            let candidate = format!("{line} {word}");
            let fits = max_width.is_none_or(|w| measure.advance(&candidate, size_px) <= w);
            if fits {
                line = candidate;
            } else {
                lines.push(std::mem::replace(&mut line, word.to_string()));
            }
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines
}

fn fits<M: TextMeasure + ?Sized>(
    lines: &[String],
    bounds: TextBounds,
    size_px: f32,
    measure: &mut M,
) -> bool {
    if let Some(w) = bounds.max_width
        && lines.iter().any(|l| measure.advance(l, size_px) > w)
    {
        return false;
    }
    if let Some(h) = bounds.max_height
        && (lines.len() as f32) * measure.line_height(size_px) > h
    {
        return false;
    }
    true
}

/// Find the largest size, stepping down from `start_px`, at which `text` wraps into `bounds`.
///
/// At the floor the text is returned wrapped anyway with `overflow` set; legibility wins
/// over containment.
pub fn fit_text<M: TextMeasure + ?Sized>(
    text: &str,
    bounds: TextBounds,
    start_px: f32,
    measure: &mut M,
) -> ReelResult<FittedText> {
    if !start_px.is_finite() || start_px <= 0.0 {
        return Err(ReelError::validation(
            "text start size must be finite and > 0",
        ));
    }
    let floor = floor_size(start_px);
    let mut size = start_px;
    loop {
        let lines = wrap_words(text, bounds.max_width, size, measure);
        if fits(&lines, bounds, size, measure) {
            return Ok(FittedText {
                size_px: size,
                lines,
                overflow: false,
            });
        }
        if size <= floor {
            tracing::warn!(
                size_px = size,
                lines = lines.len(),
                "text does not fit at floor size, rendering with overflow"
            );
            return Ok(FittedText {
                size_px: size,
                lines,
                overflow: true,
            });
        }
        size = (size - FIT_STEP_PX).max(floor);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color carried through parley layouts.
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Parley-backed [`TextMeasure`] over one registered font.
pub struct FontMeasure {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family: String,
    font_bytes: Arc<Vec<u8>>,
    font_data: vello_cpu::peniko::FontData,
    font_path: Option<PathBuf>,
}

impl std::fmt::Debug for FontMeasure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontMeasure")
            .field("family", &self.family)
            .field("font_bytes_len", &self.font_bytes.len())
            .field("font_path", &self.font_path)
            .finish()
    }
}

impl FontMeasure {
    /// Register raw font bytes (TTF/OTF).
    pub fn from_bytes(font_bytes: Vec<u8>) -> ReelResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let font_bytes = Arc::new(font_bytes);
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.as_ref().clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            ReelError::validation("no font families registered from font bytes")
        })?;
        let family = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ReelError::validation("registered font family has no name"))?
            .to_string();

        let font_data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font_bytes.as_ref().clone()),
            0,
        );

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family,
            font_bytes,
            font_data,
            font_path: None,
        })
    }

    pub fn from_path(path: &Path) -> ReelResult<Self> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ReelError::missing(path));
            }
            Err(e) => return Err(ReelError::unreadable(path, e)),
        };
        let mut measure = Self::from_bytes(bytes).map_err(|e| ReelError::unreadable(path, e))?;
        measure.font_path = Some(path.to_path_buf());
        Ok(measure)
    }

    /// Load `configured` if given, otherwise the first usable well-known system font.
    ///
    /// Returns `None` (with a warning) when no font can be loaded; overlays are then skipped.
    pub fn discover(configured: Option<&Path>) -> Option<Self> {
        if let Some(path) = configured {
            match Self::from_path(path) {
                Ok(m) => return Some(m),
                Err(e) => {
                    tracing::warn!(font = %path.display(), error = %e, "configured font unusable");
                }
            }
        }
        let found = SYSTEM_FONT_CANDIDATES
            .iter()
            .map(Path::new)
            .filter(|p| p.is_file())
            .find_map(|p| Self::from_path(p).ok());
        if found.is_none() {
            tracing::warn!("no usable font found, text overlays disabled");
        }
        found
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn font_bytes(&self) -> &Arc<Vec<u8>> {
        &self.font_bytes
    }

    /// Font handle for glyph rasterization.
    pub fn font_data(&self) -> &vello_cpu::peniko::FontData {
        &self.font_data
    }

    /// Shape `text` as one unbroken line.
    pub fn layout_line(&mut self, text: &str, size_px: f32) -> parley::Layout<TextBrushRgba8> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(self.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(
            TextBrushRgba8::default(),
        ));
        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }
}

impl TextMeasure for FontMeasure {
    fn advance(&mut self, text: &str, size_px: f32) -> f32 {
        self.layout_line(text, size_px).width()
    }

    fn line_height(&mut self, size_px: f32) -> f32 {
        let h = self.layout_line("Hg", size_px).height();
        if h > 0.0 { h } else { size_px * 1.2 }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/layout.rs"]
mod tests;
