use super::*;
use crate::effects::motion::MotionEffect;
use crate::foundation::core::Point;
use crate::foundation::math::premultiply_rgba8_in_place;

fn canvas() -> Canvas {
    Canvas {
        width: 16,
        height: 8,
    }
}

fn red_image() -> PreparedImage {
    PreparedImage::from_premul(2, 2, [255u8, 0, 0, 255].repeat(4)).unwrap()
}

fn px(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [
        frame.data[i],
        frame.data[i + 1],
        frame.data[i + 2],
        frame.data[i + 3],
    ]
}

#[test]
fn empty_layers_paint_the_background() {
    let mut p = FramePainter::new(canvas(), [0, 0, 255, 255]).unwrap();
    let f = p.paint(&FrameLayers::default()).unwrap();
    assert_eq!((f.width, f.height), (16, 8));
    assert!(f.premultiplied);
    assert_eq!(px(&f, 0, 0), [0, 0, 255, 255]);
    assert_eq!(px(&f, 15, 7), [0, 0, 255, 255]);
}

#[test]
fn cover_fitted_visual_fills_the_canvas() {
    let img = red_image();
    let affine = MotionEffect::Static
        .curve(16, 8, 1.0)
        .affine_at(0.0, canvas(), img.width, img.height);
    let mut p = FramePainter::new(canvas(), [0, 0, 0, 255]).unwrap();
    let layers = FrameLayers {
        visual: Some((&img, affine)),
        ..FrameLayers::default()
    };
    let f = p.paint(&layers).unwrap();
    for (x, y) in [(0, 0), (8, 4), (15, 7)] {
        let [r, g, b, _] = px(&f, x, y);
        assert!(r > 240 && g < 16 && b < 16, "pixel {x},{y}");
    }
    // Same image again comes from the paint cache.
    let again = p.paint(&layers).unwrap();
    assert_eq!(again.data, f.data);
}

#[test]
fn full_dip_is_black() {
    let img = red_image();
    let affine = MotionEffect::Static
        .curve(16, 8, 1.0)
        .affine_at(0.0, canvas(), 2, 2);
    let mut p = FramePainter::new(canvas(), [0, 0, 0, 255]).unwrap();
    let f = p
        .paint(&FrameLayers {
            visual: Some((&img, affine)),
            dip: 1.0,
            overlays: Vec::new(),
        })
        .unwrap();
    assert_eq!(px(&f, 8, 4), [0, 0, 0, 255]);
}

#[test]
fn overlays_land_at_their_origin_and_respect_zero_opacity() {
    let overlay = TextOverlay {
        image: PreparedImage::from_premul(4, 4, [0u8, 255, 0, 255].repeat(16)).unwrap(),
        origin: Point::new(2.0, 2.0),
    };
    let mut p = FramePainter::new(canvas(), [0, 0, 0, 255]).unwrap();

    let f = p
        .paint(&FrameLayers {
            overlays: vec![(&overlay, 1.0)],
            ..FrameLayers::default()
        })
        .unwrap();
    assert!(px(&f, 3, 3)[1] > 240);
    assert_eq!(px(&f, 10, 3), [0, 0, 0, 255]);

    let hidden = p
        .paint(&FrameLayers {
            overlays: vec![(&overlay, 0.0)],
            ..FrameLayers::default()
        })
        .unwrap();
    assert_eq!(px(&hidden, 3, 3), [0, 0, 0, 255]);
}

/// Solid frame in `rgba8` (straight alpha), premultiplied.
fn solid_frame(canvas: Canvas, rgba8: [u8; 4]) -> FrameRGBA {
    let mut data = rgba8.repeat(canvas.byte_len() / 4);
    premultiply_rgba8_in_place(&mut data);
    FrameRGBA {
        width: canvas.width,
        height: canvas.height,
        data,
        premultiplied: true,
    }
}

#[test]
fn background_only_frame_is_a_solid_fill() {
    let mut p = FramePainter::new(canvas(), [20, 40, 200, 255]).unwrap();
    let f = p.paint(&FrameLayers::default()).unwrap();
    assert_eq!(f.data, solid_frame(canvas(), [20, 40, 200, 255]).data);
}

#[test]
fn oversized_canvas_is_rejected() {
    assert!(
        FramePainter::new(
            Canvas {
                width: 70_000,
                height: 2
            },
            [0; 4]
        )
        .is_err()
    );
}
