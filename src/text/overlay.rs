use crate::assets::decode::PreparedImage;
use crate::config::RenderConfig;
use crate::foundation::core::{Canvas, Point};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::clamp01;
use crate::text::layout::{FittedText, FontMeasure, TextBounds, TextMeasure, fit_text};

/// Fraction of the canvas the title may cover.
const TITLE_BOX: (f32, f32) = (0.8, 0.4);
/// Fraction of the canvas a subtitle may cover.
const SUBTITLE_BOX: (f32, f32) = (0.9, 0.25);
/// Subtitle distance from the bottom edge, as a fraction of canvas height.
const SUBTITLE_MARGIN: f32 = 0.08;

#[derive(Clone, Copy, Debug, PartialEq)]
/// Colours for the two text passes.
pub struct TextStyle {
    /// Main pass colour (straight RGBA8).
    pub fill_rgba8: [u8; 4],
    /// Shadow pass colour (straight RGBA8).
    pub shadow_rgba8: [u8; 4],
    pub shadow_offset_px: f32,
}

impl TextStyle {
    pub fn from_config(cfg: &RenderConfig) -> Self {
        Self {
            fill_rgba8: cfg.theme_rgba8,
            shadow_rgba8: cfg.shadow_rgba8,
            shadow_offset_px: cfg.shadow_offset_px,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// Where a text block sits on the canvas. Blocks are always centred horizontally.
pub enum Placement {
    Center,
    Bottom { margin_px: f32 },
}

#[derive(Clone, Debug)]
/// A rasterized text block and its top-left position on the canvas.
pub struct TextOverlay {
    pub image: PreparedImage,
    pub origin: Point,
}

impl TextOverlay {
    /// Draw `fitted` into a tight premultiplied raster: every line twice, shadow first, each
    /// line centred within the block.
    pub fn rasterize(
        fitted: &FittedText,
        font: &mut FontMeasure,
        style: &TextStyle,
        canvas: Canvas,
        placement: Placement,
    ) -> ReelResult<Option<Self>> {
        if fitted.lines.is_empty() {
            return Ok(None);
        }
        let size = fitted.size_px;
        let line_h = font.line_height(size);
        let layouts: Vec<_> = fitted
            .lines
            .iter()
            .map(|line| {
                let layout = font.layout_line(line, size);
                let w = layout.width();
                (layout, w)
            })
            .collect();

        let text_w = layouts.iter().map(|(_, w)| *w).fold(0.0f32, f32::max);
        let text_h = line_h * layouts.len() as f32;
        let pad = style.shadow_offset_px.abs().ceil() + 2.0;
        let block_w = (text_w + 2.0 * pad).ceil();
        let block_h = (text_h + 2.0 * pad).ceil();

        let to_u16 = |v: f32| -> ReelResult<u16> {
            if v >= 1.0 && v <= f32::from(u16::MAX) {
                Ok(v as u16)
            } else {
                Err(ReelError::validation(format!(
                    "text block dimension {v} out of range"
                )))
            }
        };
        let (w, h) = (to_u16(block_w)?, to_u16(block_h)?);

        let mut ctx = vello_cpu::RenderContext::new(w, h);
        let passes = [
            (style.shadow_rgba8, style.shadow_offset_px),
            (style.fill_rgba8, 0.0),
        ];
        for (rgba, offset) in passes {
            let [r, g, b, a] = rgba;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            for (i, (layout, line_w)) in layouts.iter().enumerate() {
                let x = pad + (text_w - line_w) / 2.0 + offset;
                let y = pad + line_h * i as f32 + offset;
                ctx.set_transform(vello_cpu::kurbo::Affine::translate((
                    f64::from(x),
                    f64::from(y),
                )));
                for line in layout.lines() {
                    for item in line.items() {
                        let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                            continue;
                        };
                        let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                            id: g.id,
                            x: g.x,
                            y: g.y,
                        });
                        ctx.glyph_run(font.font_data())
                            .font_size(run.run().font_size())
                            .fill_glyphs(glyphs);
                    }
                }
            }
        }
        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);
        let image = PreparedImage::from_premul(
            u32::from(w),
            u32::from(h),
            pixmap.data_as_u8_slice().to_vec(),
        )?;

        let x = (f64::from(canvas.width) - f64::from(w)) / 2.0;
        let y = match placement {
            Placement::Center => (f64::from(canvas.height) - f64::from(h)) / 2.0,
            Placement::Bottom { margin_px } => {
                f64::from(canvas.height) - f64::from(margin_px) - f64::from(h)
            }
        };
        Ok(Some(Self {
            image,
            origin: Point::new(x.round(), y.round().max(0.0)),
        }))
    }
}

fn fitted_overlay(
    text: &str,
    start_px: f32,
    frac: (f32, f32),
    placement: Placement,
    font: &mut FontMeasure,
    cfg: &RenderConfig,
) -> ReelResult<Option<TextOverlay>> {
    let canvas = cfg.canvas();
    let bounds = TextBounds::new(
        canvas.width as f32 * frac.0,
        canvas.height as f32 * frac.1,
    );
    let fitted = fit_text(text, bounds, start_px, font)?;
    tracing::debug!(
        size_px = fitted.size_px,
        lines = fitted.lines.len(),
        overflow = fitted.overflow,
        "fitted text overlay"
    );
    TextOverlay::rasterize(
        &fitted,
        font,
        &TextStyle::from_config(cfg),
        canvas,
        placement,
    )
}

/// Centred title card.
pub fn title_overlay(
    title: &str,
    font: &mut FontMeasure,
    cfg: &RenderConfig,
) -> ReelResult<Option<TextOverlay>> {
    fitted_overlay(
        title,
        cfg.title_font_px,
        TITLE_BOX,
        Placement::Center,
        font,
        cfg,
    )
}

/// Bottom-anchored subtitle.
pub fn subtitle_overlay(
    text: &str,
    font: &mut FontMeasure,
    cfg: &RenderConfig,
) -> ReelResult<Option<TextOverlay>> {
    let margin_px = cfg.canvas().height as f32 * SUBTITLE_MARGIN;
    fitted_overlay(
        text,
        cfg.subtitle_font_px,
        SUBTITLE_BOX,
        Placement::Bottom { margin_px },
        font,
        cfg,
    )
}

/// Title card opacity at timeline time `t`: fades in over `fade_secs`, holds, fades out so it
/// is gone at `title_secs`.
pub fn title_opacity(t: f64, title_secs: f64, fade_secs: f64) -> f32 {
    if !(0.0..title_secs).contains(&t) {
        return 0.0;
    }
    let fade = fade_secs.min(title_secs / 2.0);
    if fade <= 0.0 {
        return 1.0;
    }
    let fade_in = t / fade;
    let fade_out = (title_secs - t) / fade;
    clamp01(fade_in.min(fade_out)) as f32
}

#[cfg(test)]
#[path = "../../tests/unit/text/overlay.rs"]
mod tests;
