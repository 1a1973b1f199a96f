use super::*;

#[test]
fn terminal_and_active_states() {
    assert!(!ExportState::Idle.is_active());
    assert!(!ExportState::Idle.is_terminal());
    assert!(ExportState::Resolving.is_active());
    assert!(ExportState::Rendering { index: 0, total: 3 }.is_active());
    assert!(ExportState::Finalizing.is_active());
    for s in [
        ExportState::Succeeded,
        ExportState::Cancelled,
        ExportState::Failed {
            kind: ExportErrorKind::EncoderWriteFailure,
        },
    ] {
        assert!(s.is_terminal());
        assert!(!s.is_active());
    }
}

#[test]
fn new_session_is_idle() {
    let s = ExportSession::default();
    assert_eq!(s.state(), ExportState::Idle);
    assert_eq!(s.opts().seek_timeout, DEFAULT_SEEK_TIMEOUT);
    assert_eq!(s.opts().gif_speed, DEFAULT_GIF_SPEED);
    assert!(!s.cancel_handle().is_cancelled());
}

#[test]
fn cancel_handles_share_one_flag() {
    let s = ExportSession::default();
    let a = s.cancel_handle();
    let b = s.cancel_handle();
    a.cancel();
    assert!(b.is_cancelled());
    s.cancel.reset();
    assert!(!a.is_cancelled());
}

#[test]
fn second_claim_while_active_is_rejected() {
    let s = ExportSession::default();
    s.claim().unwrap();
    s.transition(ExportState::Rendering { index: 1, total: 4 });
    assert!(matches!(s.claim(), Err(ExportError::InvalidConfig(_))));
    s.transition(ExportState::Succeeded);
    assert!(s.claim().is_ok());
    assert_eq!(s.state(), ExportState::Resolving);
}

#[test]
fn state_serializes_with_tag() {
    let text = serde_json::to_string(&ExportState::Failed {
        kind: ExportErrorKind::FrameRenderTimeout,
    })
    .unwrap();
    assert_eq!(text, r#"{"state":"failed","kind":"FrameRenderTimeout"}"#);
}
