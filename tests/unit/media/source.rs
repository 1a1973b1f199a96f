use super::*;

#[test]
fn native_fps_falls_back_to_thirty() {
    let m = SourceMedia::new(640, 360, 4.0);
    assert_eq!(m.native_fps(), DEFAULT_NATIVE_FPS);
    let m = m.with_frame_rate(Fps::new(30000, 1001).unwrap());
    assert_eq!(m.native_fps(), Fps { num: 30000, den: 1001 });
}

#[test]
fn media_validation() {
    assert!(SourceMedia::new(640, 360, 4.0).validate().is_ok());
    assert!(matches!(
        SourceMedia::new(640, 0, 4.0).validate(),
        Err(ExportError::InvalidSourceDimensions { width: 640, height: 0 })
    ));
    assert!(matches!(
        SourceMedia::new(640, 360, f64::INFINITY).validate(),
        Err(ExportError::Media(_))
    ));
    assert!(matches!(
        SourceMedia::new(640, 360, 0.0).validate(),
        Err(ExportError::Media(_))
    ));
}

#[test]
fn frame_buffer_length_is_checked() {
    assert!(SourceFrame::new(2, 2, vec![0; 16]).is_ok());
    assert!(matches!(
        SourceFrame::new(2, 2, vec![0; 15]),
        Err(ExportError::Media(_))
    ));
    assert!(SourceFrame::new(0, 2, Vec::new()).is_err());
}

#[test]
fn filled_frame_repeats_color() {
    let f = SourceFrame::filled(3, 2, [1, 2, 3, 4]).unwrap();
    assert_eq!(f.rgba8.len(), 24);
    assert!(f.rgba8.chunks_exact(4).all(|px| px == [1, 2, 3, 4]));
}

#[test]
fn media_json_round_trip() {
    let m = SourceMedia::new(1280, 720, 3.5).with_frame_rate(Fps::whole(25).unwrap());
    let text = serde_json::to_string(&m).unwrap();
    let back: SourceMedia = serde_json::from_str(&text).unwrap();
    assert_eq!(back, m);
    let bare: SourceMedia =
        serde_json::from_str(r#"{"width":4,"height":2,"duration_secs":1.0}"#).unwrap();
    assert_eq!(bare.frame_rate, None);
}
