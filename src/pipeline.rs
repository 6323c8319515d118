//! The per-frame loop: capture → landmarks → overlay → preview.

use crate::capture::CaptureSource;
use crate::landmarks::{LandmarkFrame, LandmarkSource};
use crate::output::OutputSink;
use crate::overlay::{OverlayCompositor, OverlayOutcome, SelectionCell};
use anyhow::{Context, Result};
use image::RgbImage;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Log averaged stage timings every this many frames
const STATS_INTERVAL: u64 = 30;

/// What the rest of the app may know about the live stream.
#[derive(Debug, Clone, Default)]
pub struct LiveStatus {
    /// Latest raw camera frame, sensor orientation
    pub frame: Option<Arc<RgbImage>>,
    /// Whether the latest pass painted an overlay
    pub overlay_drawn: bool,
}

pub fn live_feed() -> (watch::Sender<LiveStatus>, watch::Receiver<LiveStatus>) {
    watch::channel(LiveStatus::default())
}

#[derive(Debug, Default)]
struct FrameStats {
    frames: u64,
    capture: Duration,
    detect: Duration,
    composite: Duration,
    output: Duration,
    overlays: u64,
}

impl FrameStats {
    fn log(&self) {
        let avg_ms = |total: Duration| total.as_secs_f64() * 1000.0 / self.frames as f64;
        let capture_ms = avg_ms(self.capture);
        let detect_ms = avg_ms(self.detect);
        let composite_ms = avg_ms(self.composite);
        let output_ms = avg_ms(self.output);
        let total_ms = capture_ms + detect_ms + composite_ms + output_ms;

        tracing::info!(
            "Frame {}: capture={:.1}ms, detect={:.1}ms, composite={:.1}ms, output={:.1}ms, total={:.1}ms, fps={:.1}, overlay={}/{}",
            self.frames,
            capture_ms,
            detect_ms,
            composite_ms,
            output_ms,
            total_ms,
            1000.0 / total_ms,
            self.overlays,
            self.frames
        );
    }
}

/// Turns raw frames into composited frames and publishes the live status.
pub struct FrameProcessor {
    detector: Box<dyn LandmarkSource>,
    compositor: OverlayCompositor,
    selection: Arc<SelectionCell>,
    feed: watch::Sender<LiveStatus>,
    buffer: RgbImage,
    stats: FrameStats,
}

impl FrameProcessor {
    pub fn new(
        detector: Box<dyn LandmarkSource>,
        compositor: OverlayCompositor,
        selection: Arc<SelectionCell>,
        feed: watch::Sender<LiveStatus>,
    ) -> Self {
        Self {
            detector,
            compositor,
            selection,
            feed,
            buffer: RgbImage::new(0, 0),
            stats: FrameStats::default(),
        }
    }

    /// Latest composited frame
    pub fn buffer(&self) -> &RgbImage {
        &self.buffer
    }

    /// Run one frame through detection and compositing.
    ///
    /// A failing detector only costs this frame its overlay.
    pub fn process(&mut self, raw: RgbImage) -> OverlayOutcome {
        let image = Arc::new(raw);

        let detect_start = Instant::now();
        let landmarks = match self.detector.detect(&image) {
            Ok(landmarks) => landmarks,
            Err(err) => {
                tracing::warn!("Landmark detection failed: {:#}", err);
                Vec::new()
            }
        };
        self.stats.detect += detect_start.elapsed();

        let frame = LandmarkFrame::new(Arc::clone(&image), landmarks);

        // Read at the top of the pass so a UI change lands on this very frame
        let selection = self.selection.latest();

        let composite_start = Instant::now();
        let outcome = self.compositor.composite(&frame, &selection, &mut self.buffer);
        self.stats.composite += composite_start.elapsed();

        if outcome.is_drawn() {
            self.stats.overlays += 1;
        }

        self.feed.send_replace(LiveStatus {
            frame: Some(image),
            overlay_drawn: outcome.is_drawn(),
        });

        outcome
    }
}

impl Drop for FrameProcessor {
    /// A stopped or failed loop leaves no frame and no overlay behind
    fn drop(&mut self) {
        self.feed.send_replace(LiveStatus::default());
    }
}

/// Run the frame loop until `stop` is raised.
///
/// Capture and output failures end the loop with an error; they mean the
/// device is gone.
pub fn run_pipeline<C>(
    capture: &mut C,
    mut output: Option<&mut dyn OutputSink>,
    processor: &mut FrameProcessor,
    target_fps: u32,
    stop: &AtomicBool,
) -> Result<()>
where
    C: CaptureSource,
{
    let frame_duration = Duration::from_secs_f32(1.0 / target_fps.max(1) as f32);

    tracing::info!("Starting frame loop at {} fps target", target_fps);

    while !stop.load(Ordering::Relaxed) {
        let loop_start = Instant::now();

        let capture_start = Instant::now();
        let raw = capture
            .capture_frame()
            .context("Failed to capture frame")?;
        processor.stats.capture += capture_start.elapsed();

        processor.process(raw);

        if let Some(output) = output.as_deref_mut() {
            let output_start = Instant::now();
            output
                .write_frame(processor.buffer())
                .context("Failed to write frame")?;
            processor.stats.output += output_start.elapsed();
        }

        processor.stats.frames += 1;
        if processor.stats.frames % STATS_INTERVAL == 0 {
            processor.stats.log();
        }

        // Frame rate limiting
        let elapsed = loop_start.elapsed();
        if elapsed < frame_duration {
            std::thread::sleep(frame_duration - elapsed);
        }
    }

    tracing::info!("Frame loop stopped after {} frames", processor.stats.frames);
    Ok(())
}
