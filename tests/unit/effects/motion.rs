use super::*;
use crate::foundation::core::Point;

const EPS: f64 = 1e-9;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < EPS
}

fn endpoints(effect: MotionEffect) -> (MotionTransform, MotionTransform) {
    let c = effect.curve(1920, 1080, 4.0);
    (c.at(0.0), c.at(4.0))
}

#[test]
fn every_deterministic_effect_hits_documented_endpoints() {
    let expect: [(MotionEffect, (f64, f64, f64, f64), (f64, f64, f64, f64)); 11] = [
        (MotionEffect::Static, (1.0, 0.0, 0.0, 0.0), (1.0, 0.0, 0.0, 0.0)),
        (MotionEffect::KenBurnsZoomIn, (1.0, 0.0, 0.0, 0.0), (1.2, 0.0, 0.0, 0.0)),
        (MotionEffect::KenBurnsZoomOut, (1.2, 0.0, 0.0, 0.0), (1.0, 0.0, 0.0, 0.0)),
        (MotionEffect::PanLeft, (1.0, 0.0, 0.0, 0.0), (1.0, -100.0, 0.0, 0.0)),
        (MotionEffect::PanRight, (1.0, 0.0, 0.0, 0.0), (1.0, 100.0, 0.0, 0.0)),
        (MotionEffect::TiltUp, (1.0, 0.0, 0.0, 0.0), (1.0, 0.0, -100.0, 0.0)),
        (MotionEffect::TiltDown, (1.0, 0.0, 0.0, 0.0), (1.0, 0.0, 100.0, 0.0)),
        (MotionEffect::DollyZoom, (1.0, 0.0, 0.0, 0.0), (1.5, 0.0, 0.0, 0.0)),
        (MotionEffect::CraneUp, (1.0, 0.0, 0.0, 0.0), (1.15, 0.0, -60.0, 0.0)),
        (MotionEffect::CraneDown, (1.15, 0.0, 0.0, 0.0), (1.0, 0.0, 60.0, 0.0)),
        (
            MotionEffect::Orbit,
            (1.0, 0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0, ORBIT_SWEEP_RAD),
        ),
    ];
    for (effect, start, end) in expect {
        let (a, b) = endpoints(effect);
        for (got, want) in [(a, start), (b, end)] {
            assert!(
                close(got.scale, want.0)
                    && close(got.offset_x, want.1)
                    && close(got.offset_y, want.2)
                    && close(got.rotation, want.3),
                "{effect:?}: got {got:?}, want {want:?}"
            );
        }
    }
}

#[test]
fn dolly_is_steeper_than_ken_burns() {
    let kb = MotionEffect::KenBurnsZoomIn.curve(100, 100, 2.0).at(1.0);
    let dz = MotionEffect::DollyZoom.curve(100, 100, 2.0).at(1.0);
    assert!(dz.scale > kb.scale);
}

#[test]
fn midpoint_is_linear() {
    let c = MotionEffect::PanRight.curve(640, 360, 10.0);
    assert!(close(c.at(5.0).offset_x, 50.0));
    let c = MotionEffect::KenBurnsZoomIn.curve(640, 360, 10.0);
    assert!(close(c.at(2.5).scale, 1.05));
}

#[test]
fn time_is_clamped_and_zero_duration_stays_at_start() {
    let c = MotionEffect::PanLeft.curve(640, 360, 2.0);
    assert!(close(c.at(-1.0).offset_x, 0.0));
    assert!(close(c.at(99.0).offset_x, -100.0));

    let z = MotionEffect::KenBurnsZoomIn.curve(640, 360, 0.0);
    assert!(close(z.at(0.0).scale, 1.0));
    assert!(close(z.at(1.0).scale, 1.0));
}

#[test]
fn shake_is_bounded_and_unsmoothed() {
    let c = MotionEffect::Shake.curve(1280, 720, 3.0);
    let mut distinct = std::collections::BTreeSet::new();
    for i in 0..200 {
        let m = c.at(f64::from(i) * 0.015);
        assert!(m.offset_x.abs() <= SHAKE_AMPLITUDE_PX);
        assert!(m.offset_y.abs() <= SHAKE_AMPLITUDE_PX);
        assert!(close(m.scale, 1.0));
        assert!(close(m.rotation, 0.0));
        distinct.insert(m.offset_x.to_bits());
    }
    assert!(distinct.len() > 1);
}

#[test]
fn names_parse_leniently_and_unknown_degrades_to_static() {
    for effect in MotionEffect::ALL {
        assert_eq!(MotionEffect::parse(effect.name()), Some(effect));
    }
    assert_eq!(MotionEffect::parse("  Ken-Burns-Zoom-In "), Some(MotionEffect::KenBurnsZoomIn));
    assert_eq!(MotionEffect::parse("none"), Some(MotionEffect::Static));
    assert_eq!(MotionEffect::parse("warp_speed"), None);

    let unknown = MotionEffect::from_name("warp_speed");
    assert_eq!(unknown, MotionEffect::Static);
    let a = unknown.curve(320, 240, 2.0);
    let b = MotionEffect::Static.curve(320, 240, 2.0);
    for t in [0.0, 0.7, 2.0] {
        assert_eq!(a.at(t), b.at(t));
        assert_eq!(
            a.affine_at(t, Canvas { width: 320, height: 240 }, 640, 480),
            b.affine_at(t, Canvas { width: 320, height: 240 }, 640, 480)
        );
    }
}

#[test]
fn static_affine_cover_fits_content_to_canvas_centre() {
    let canvas = Canvas {
        width: 200,
        height: 100,
    };
    let c = MotionEffect::Static.curve(200, 100, 1.0);
    let a = c.affine_at(0.0, canvas, 400, 400);
    // Square content is cover-fitted by width (scale 0.5) and centred.
    let centre = a * Point::new(200.0, 200.0);
    assert!(close(centre.x, 100.0) && close(centre.y, 50.0));
    let left = a * Point::new(0.0, 200.0);
    assert!(close(left.x, 0.0));
}

#[test]
fn pan_overscan_keeps_edges_covered() {
    let canvas = Canvas {
        width: 640,
        height: 360,
    };
    let c = MotionEffect::PanRight.curve(640, 360, 2.0);
    assert!(c.overscan() > 1.0);
    let a = c.affine_at(2.0, canvas, 640, 360);
    // Content's left edge must stay at or left of the canvas' left edge.
    let left = a * Point::new(0.0, 180.0);
    assert!(left.x <= 1e-6, "left edge at {}", left.x);
    assert!(close(MotionEffect::Static.curve(640, 360, 1.0).overscan(), 1.0));
}
