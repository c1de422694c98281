//! Per-frame rasterization on the CPU with `vello_cpu`.
//!
//! A frame is a background fill, at most one visual (still image or decoded clip frame) under a
//! motion transform, an optional black dip for transitions, then text overlays.

use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::decode::PreparedImage;
use crate::foundation::core::{Affine, Canvas};
use crate::foundation::error::{ReelError, ReelResult};
use crate::text::overlay::TextOverlay;

/// Cached image paints kept alive across frames.
const IMAGE_CACHE_CAPACITY: usize = 16;

#[derive(Clone, Debug)]
/// CPU-readable RGBA8 frame.
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA8 bytes.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

/// Everything drawn into one frame, bottom to top.
#[derive(Default)]
pub struct FrameLayers<'a> {
    /// Visual and the affine mapping its pixels onto the canvas.
    pub visual: Option<(&'a PreparedImage, Affine)>,
    /// Black overlay opacity in `[0, 1]`.
    pub dip: f32,
    /// Text blocks with their opacity.
    pub overlays: Vec<(&'a TextOverlay, f32)>,
}

struct ImagePaint {
    // Holds the pixel buffer so the pointer key stays unique while cached.
    _source: Arc<Vec<u8>>,
    paint: vello_cpu::Image,
}

/// Reusable frame rasterizer for one canvas size.
pub struct FramePainter {
    canvas: Canvas,
    width: u16,
    height: u16,
    background: [u8; 4],
    ctx: vello_cpu::RenderContext,
    image_cache: HashMap<usize, ImagePaint>,
}

impl FramePainter {
    pub fn new(canvas: Canvas, background_rgba8: [u8; 4]) -> ReelResult<Self> {
        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| ReelError::validation("canvas width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| ReelError::validation("canvas height exceeds u16"))?;
        if width == 0 || height == 0 {
            return Err(ReelError::validation("canvas must be non-empty"));
        }
        Ok(Self {
            canvas,
            width,
            height,
            background: background_rgba8,
            ctx: vello_cpu::RenderContext::new(width, height),
            image_cache: HashMap::new(),
        })
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Rasterize `layers` into a premultiplied frame.
    pub fn paint(&mut self, layers: &FrameLayers<'_>) -> ReelResult<FrameRGBA> {
        let full = vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.width),
            f64::from(self.height),
        );
        let visual_paint = layers
            .visual
            .map(|(img, affine)| Ok::<_, ReelError>((self.image_paint_for(img)?, img, affine)))
            .transpose()?;
        let overlay_paints = layers
            .overlays
            .iter()
            .filter(|(_, opacity)| *opacity > 0.0)
            .map(|(o, opacity)| Ok((self.image_paint_for(&o.image)?, *o, *opacity)))
            .collect::<ReelResult<Vec<_>>>()?;

        let ctx = &mut self.ctx;
        ctx.reset();
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        let [r, g, b, a] = self.background;
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        ctx.fill_rect(&full);

        if let Some((paint, img, affine)) = visual_paint {
            ctx.set_transform(affine_to_cpu(affine));
            ctx.set_paint(paint);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(img.width),
                f64::from(img.height),
            ));
        }

        let dip = layers.dip.clamp(0.0, 1.0);
        if dip > 0.0 {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                0,
                0,
                0,
                (dip * 255.0).round() as u8,
            ));
            ctx.fill_rect(&full);
        }

        for (paint, overlay, opacity) in overlay_paints {
            ctx.set_transform(vello_cpu::kurbo::Affine::translate((
                overlay.origin.x,
                overlay.origin.y,
            )));
            ctx.set_paint(paint);
            let partial = opacity < 1.0;
            if partial {
                ctx.push_opacity_layer(opacity.clamp(0.0, 1.0));
            }
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(overlay.image.width),
                f64::from(overlay.image.height),
            ));
            if partial {
                ctx.pop_layer();
            }
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        ctx.render_to_pixmap(&mut pixmap);

        Ok(FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    fn image_paint_for(&mut self, img: &PreparedImage) -> ReelResult<vello_cpu::Image> {
        let key = Arc::as_ptr(&img.rgba8_premul) as usize;
        if let Some(p) = self.image_cache.get(&key) {
            return Ok(p.paint.clone());
        }
        if self.image_cache.len() >= IMAGE_CACHE_CAPACITY {
            self.image_cache.clear();
        }
        let pixmap = pixmap_from_premul_bytes(&img.rgba8_premul, img.width, img.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.image_cache.insert(
            key,
            ImagePaint {
                _source: img.rgba8_premul.clone(),
                paint: paint.clone(),
            },
        );
        Ok(paint)
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn pixmap_from_premul_bytes(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> ReelResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ReelError::validation("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ReelError::validation("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(ReelError::validation("prepared image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/painter.rs"]
mod tests;
