use super::*;

fn ffmpeg_runs_blocking() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[tokio::test]
async fn unknown_tool_is_not_on_path() {
    assert!(!is_tool_on_path("reelcut-no-such-tool").await);
}

#[tokio::test(flavor = "current_thread")]
async fn ffmpeg_check_agrees_with_a_direct_run() {
    assert_eq!(is_ffmpeg_on_path().await, ffmpeg_runs_blocking());
}

#[tokio::test(flavor = "current_thread")]
async fn tool_check_runs_alongside_other_tasks() {
    let other = tokio::spawn(async { 7 });
    let (found, joined) = tokio::join!(is_tool_on_path("reelcut-no-such-tool"), other);
    assert!(!found);
    assert_eq!(joined.unwrap(), 7);
}
