//! Integration Tests for the Capture Polling Loop
//!
//! Drives the supervisor with a simulated capture process so stalls,
//! closed streams and early exits can be produced on demand.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use std::time::{Duration, Instant};

use test_utils::ChannelSource;
use thermocap::{CaptureError, CaptureSettings, CaptureState, CaptureSupervisor};

fn supervisor() -> CaptureSupervisor {
    CaptureSupervisor::new(
        "/thermal-raw",
        CaptureSettings {
            poll_interval: Duration::from_millis(25),
            max_empty_reads: 3,
            terminate_grace: Duration::from_millis(10),
        },
    )
}

#[tokio::test]
async fn test_stops_on_first_frame_beyond_target() {
    let (mut source, handle) = ChannelSource::with_lines(&["frame #1", "frame #2", "frame #3"]);
    let mut supervisor = supervisor();

    let outcome = supervisor
        .supervise(&mut source, 1, Duration::from_secs(5))
        .await
        .expect("capture should reach the target");

    assert_eq!(outcome.last_frame, 2);
    assert_eq!(handle.consumed(), 2);
    assert_eq!(source.try_unread().as_deref(), Some("frame #3"));
    assert_eq!(supervisor.state(), CaptureState::FrameTargetReached);
}

#[tokio::test]
async fn test_frame_equal_to_target_does_not_stop() {
    let (mut source, handle) =
        ChannelSource::with_lines(&["frame #3", "status ok", "frame #4"]);
    let mut supervisor = supervisor();

    let outcome = supervisor
        .supervise(&mut source, 3, Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(outcome.last_frame, 4);
    assert_eq!(handle.consumed(), 3);
}

#[tokio::test]
async fn test_silent_process_times_out() {
    let (mut source, _handle) = ChannelSource::new();
    let mut supervisor = supervisor();

    let started = Instant::now();
    let err = supervisor
        .supervise(&mut source, 1, Duration::from_millis(200))
        .await
        .unwrap_err();

    assert!(matches!(err, CaptureError::Timeout { .. }));
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(supervisor.state(), CaptureState::TimedOut);
}

#[tokio::test]
async fn test_stalls_are_retried_until_output_arrives() {
    let (mut source, handle) = ChannelSource::new();
    let mut supervisor = supervisor();

    let feeder = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(120)).await;
        handle.send("frame #1");
        handle.send("frame #2");
        handle
    });

    let outcome = supervisor
        .supervise(&mut source, 1, Duration::from_secs(5))
        .await
        .unwrap();
    let _handle = feeder.await.unwrap();

    assert_eq!(outcome.last_frame, 2);
    assert!(outcome.stalls >= 1, "expected at least one stalled poll");
}

#[tokio::test]
async fn test_progress_without_target_still_times_out() {
    let (mut source, handle) = ChannelSource::with_lines(&["frame #1", "frame #1"]);
    let mut supervisor = supervisor();

    let err = supervisor
        .supervise(&mut source, 5, Duration::from_millis(200))
        .await
        .unwrap_err();

    match err {
        CaptureError::Timeout { last_frame, .. } => assert_eq!(last_frame, Some(1)),
        other => panic!("unexpected error: {other:?}"),
    }
    drop(handle);
}

#[tokio::test]
async fn test_exited_process_is_reported() {
    let (mut source, mut handle) = ChannelSource::with_lines(&["connecting", "frame #1"]);
    handle.exit(Some(2));
    let mut supervisor = supervisor();

    let err = supervisor
        .supervise(&mut source, 1, Duration::from_secs(5))
        .await
        .unwrap_err();

    match err {
        CaptureError::ProcessExited {
            exit_code,
            last_frame,
        } => {
            assert_eq!(exit_code, Some(2));
            assert_eq!(last_frame, Some(1));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(supervisor.state(), CaptureState::ProcessDied);
}

#[tokio::test]
async fn test_closed_stream_on_live_process_is_bounded() {
    let (mut source, mut handle) = ChannelSource::new();
    handle.close_stream();
    let mut supervisor = supervisor();

    let started = Instant::now();
    let err = supervisor
        .supervise(&mut source, 1, Duration::from_secs(5))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CaptureError::ProcessExited {
            exit_code: None,
            ..
        }
    ));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_garbled_lines_are_ignored() {
    let (mut source, _handle) = ChannelSource::with_lines(&[
        "\u{fffd}\u{fffd}frame",
        "frame #",
        "",
        "frame #x",
        "got frame #9 of stream",
    ]);
    let mut supervisor = supervisor();

    let outcome = supervisor
        .supervise(&mut source, 1, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(outcome.last_frame, 9);
    assert_eq!(outcome.lines_read, 5);
}
