use super::*;

#[test]
fn floor_even_rounds_down_to_even() {
    assert_eq!(floor_even(720.0), 720);
    assert_eq!(floor_even(719.9), 718);
    assert_eq!(floor_even(1279.99), 1278);
    assert_eq!(floor_even(1.0), 0);
    assert_eq!(floor_even(-4.0), 0);
    assert_eq!(floor_even(f64::NAN), 0);
}

#[test]
fn premultiply_handles_edges() {
    let mut px = [200, 100, 50, 255, 200, 100, 50, 0, 255, 255, 255, 128];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[0..4], &[200, 100, 50, 255]);
    assert_eq!(&px[4..8], &[0, 0, 0, 0]);
    assert_eq!(&px[8..12], &[128, 128, 128, 128]);
}

#[test]
fn flatten_over_background() {
    let src = [0, 0, 0, 0, 10, 20, 30, 255];
    let mut dst = [0u8; 8];
    flatten_premul_over_bg(&mut dst, &src, [255, 0, 0, 255]).unwrap();
    assert_eq!(&dst[0..4], &[255, 0, 0, 255]);
    assert_eq!(&dst[4..8], &[10, 20, 30, 255]);
}

#[test]
fn flatten_rejects_mismatched_buffers() {
    let mut dst = [0u8; 4];
    assert!(matches!(
        flatten_premul_over_bg(&mut dst, &[0u8; 8], [0, 0, 0, 255]),
        Err(ExportError::EncoderWriteFailure(_))
    ));
}
