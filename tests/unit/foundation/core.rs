use super::*;

#[test]
fn frame_range_contains_boundaries() {
    let r = FrameRange::new(FrameIndex(2), FrameIndex(5)).unwrap();
    assert!(!r.contains(FrameIndex(1)));
    assert!(r.contains(FrameIndex(2)));
    assert!(r.contains(FrameIndex(4)));
    assert!(!r.contains(FrameIndex(5)));
    assert_eq!(r.local(FrameIndex(4)), 2);
    assert!(FrameRange::new(FrameIndex(3), FrameIndex(2)).is_err());
}

#[test]
fn fps_frames_secs_roundtrip_floor() {
    let fps = Fps::new(30000, 1001).unwrap();
    let secs = fps.frames_to_secs(123);
    assert_eq!(fps.secs_to_frames_floor(secs), 123);
}

#[test]
fn fps_round_handles_non_finite() {
    let fps = Fps::whole(30).unwrap();
    assert_eq!(fps.secs_to_frames_round(2.5), 75);
    assert_eq!(fps.secs_to_frames_round(f64::NAN), 0);
    assert_eq!(fps.secs_to_frames_round(-1.0), 0);
    assert!(Fps::whole(0).is_err());
}

#[test]
fn canvas_center_and_len() {
    let c = Canvas {
        width: 64,
        height: 32,
    };
    assert_eq!(c.center(), Point::new(32.0, 16.0));
    assert_eq!(c.byte_len(), 64 * 32 * 4);
}
