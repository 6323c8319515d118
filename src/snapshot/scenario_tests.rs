//! Capture cycle timing and still layout, driven on a paused clock.

use crate::catalog::{AssetError, AssetFetcher, LogoAsset};
use crate::pipeline::LiveStatus;
use crate::snapshot::{
    encode_png, CaptureFailure, CaptureOutcome, CaptureSession, SessionState, TriggerRejected,
};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Instant};

const RED: Rgb<u8> = Rgb([255, 0, 0]);
const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

/// Serves a 600x100 green logo after a network-like delay, or fails.
struct SlowLogo {
    delay: Duration,
    available: bool,
}

impl AssetFetcher for SlowLogo {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        time::sleep(self.delay).await;
        if !self.available {
            return Err(AssetError::Status {
                url: url.to_string(),
                status: 404,
            });
        }
        Ok(encode_png(&RgbaImage::from_pixel(600, 100, Rgba([0, 255, 0, 255]))).unwrap())
    }
}

/// 640x480 frame, left half red, right half blue, with an overlay on screen
fn feed() -> (watch::Sender<LiveStatus>, watch::Receiver<LiveStatus>) {
    let frame = RgbImage::from_fn(640, 480, |x, _| if x < 320 { RED } else { BLUE });
    watch::channel(LiveStatus {
        frame: Some(Arc::new(frame)),
        overlay_drawn: true,
    })
}

fn assert_color(still: &RgbaImage, x: u32, y: u32, expected: [u8; 3]) {
    let pixel = still.get_pixel(x, y);
    let close = (0..3).all(|c| pixel[c].abs_diff(expected[c]) <= 2);
    assert!(close, "pixel ({x}, {y}) is {pixel:?}, expected {expected:?}");
}

fn session(available: bool) -> (watch::Sender<LiveStatus>, Arc<CaptureSession<SlowLogo>>) {
    let (tx, rx) = feed();
    let logo = LogoAsset::new(
        "https://assets.example.org/logo.png",
        SlowLogo {
            delay: Duration::from_millis(200),
            available,
        },
    );
    (tx, Arc::new(CaptureSession::new(rx, Some(Arc::new(logo)))))
}

#[tokio::test(start_paused = true)]
async fn test_capture_produces_mirrored_branded_still() {
    let (_feed, session) = session(true);
    let start = Instant::now();
    let outcome = session.trigger().unwrap().await.unwrap();
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_millis(4000), "finished after {elapsed:?}");
    assert!(elapsed < Duration::from_millis(4100), "finished after {elapsed:?}");
    assert_eq!(session.state(), SessionState::Idle);

    let artifact = match outcome {
        CaptureOutcome::Artifact(artifact) => artifact,
        other => panic!("expected an artifact, got {other:?}"),
    };
    assert_eq!(artifact.dimensions(), (1280, 960));

    let still = image::load_from_memory(artifact.png()).unwrap().to_rgba8();
    assert_eq!(still.dimensions(), (1280, 960));

    // Mirrored: the frame's red left half ends up on the right
    assert_color(&still, 100, 600, [0, 0, 255]);
    assert_color(&still, 1180, 600, [255, 0, 0]);

    // Logo: 300x50, centered, 20px from the top
    assert_color(&still, 640, 45, [0, 255, 0]);
    assert_color(&still, 495, 25, [0, 255, 0]);
    assert_color(&still, 785, 65, [0, 255, 0]);
    assert_color(&still, 700, 10, [255, 0, 0]);
    assert_color(&still, 700, 75, [255, 0, 0]);
    assert_color(&still, 480, 45, [0, 0, 255]);
}

#[tokio::test(start_paused = true)]
async fn test_countdown_and_composition_run_side_by_side() {
    let (_feed, session) = session(true);
    let handle = session.trigger().unwrap();

    time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(
        session.state(),
        SessionState::Running {
            countdown: 2,
            composed: true
        }
    );

    handle.await.unwrap();
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_second_trigger_is_rejected_while_running() {
    let (_feed, session) = session(true);
    let handle = session.trigger().unwrap();

    time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(session.trigger().unwrap_err(), TriggerRejected::AlreadyRunning);

    handle.await.unwrap();
    assert!(session.trigger().is_ok(), "idle session accepts a new trigger");
}

#[tokio::test(start_paused = true)]
async fn test_failed_logo_still_finishes_the_cycle() {
    let (_feed, session) = session(false);
    let start = Instant::now();
    let outcome = session.trigger().unwrap().await.unwrap();

    assert!(start.elapsed() >= Duration::from_millis(4000));
    assert!(matches!(
        outcome,
        CaptureOutcome::NoArtifact(CaptureFailure::Logo(AssetError::Status { status: 404, .. }))
    ));
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_overlay_must_be_on_screen() {
    let (feed, session) = session(true);
    feed.send_modify(|status| status.overlay_drawn = false);
    assert_eq!(session.trigger().unwrap_err(), TriggerRejected::NoOverlay);
    assert_eq!(session.state(), SessionState::Idle);
}
