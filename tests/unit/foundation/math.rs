use super::*;

#[test]
fn premul_rounds_to_nearest() {
    let mut px = vec![255u8, 0, 0, 128, 10, 20, 30, 255];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(px, vec![128, 0, 0, 128, 10, 20, 30, 255]);
}

#[test]
fn premultiply_in_place_zeroes_transparent() {
    let mut px = vec![100u8, 50, 200, 0, 100, 50, 200, 128];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[..4], &[0, 0, 0, 0]);
    assert_eq!(px[7], 128);
    assert_eq!(px[4], ((100u16 * 128 + 127) / 255) as u8);
}

#[test]
fn clamp01_and_lerp() {
    assert_eq!(clamp01(f64::NAN), 0.0);
    assert_eq!(clamp01(2.0), 1.0);
    assert_eq!(clamp01(-2.0), 0.0);
    assert!((lerp(1.0, 1.2, 0.5) - 1.1).abs() < 1e-12);
}
