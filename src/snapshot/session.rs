use super::artifact::CaptureArtifact;
use super::composition::{compose_still, encode_png};
use crate::catalog::{AssetError, AssetFetcher, LogoAsset};
use crate::pipeline::LiveStatus;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

/// First value shown by the visible countdown
pub const COUNTDOWN_START: u32 = 4;

pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Delay between the trigger and grabbing the frame for the still
pub const COMPOSITION_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Running {
        /// Seconds left on the visible countdown
        countdown: u32,
        /// Whether the still has been composed (successfully or not)
        composed: bool,
    },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerRejected {
    #[error("a capture is already running")]
    AlreadyRunning,
    #[error("no iris overlay is on screen")]
    NoOverlay,
    #[error("no branding logo is configured")]
    NoLogo,
}

#[derive(Error, Debug)]
pub enum CaptureFailure {
    #[error("no camera frame available")]
    NoFrame,
    #[error("branding logo unavailable: {0}")]
    Logo(#[source] AssetError),
    #[error("failed to encode capture: {0}")]
    Encode(#[source] image::ImageError),
}

/// Result of one finished capture cycle.
#[derive(Debug)]
pub enum CaptureOutcome {
    Artifact(CaptureArtifact),
    NoArtifact(CaptureFailure),
}

/// One-at-a-time timed capture.
///
/// A trigger runs the visible countdown and the delayed still composition
/// side by side, and returns to `Idle` only after both have finished. There
/// is no cancellation: a started capture always completes.
pub struct CaptureSession<F> {
    state: watch::Sender<SessionState>,
    feed: watch::Receiver<LiveStatus>,
    logo: Option<Arc<LogoAsset<F>>>,
}

impl<F> CaptureSession<F>
where
    F: AssetFetcher + 'static,
{
    pub fn new(feed: watch::Receiver<LiveStatus>, logo: Option<Arc<LogoAsset<F>>>) -> Self {
        let (state, _rx) = watch::channel(SessionState::Idle);
        Self { state, feed, logo }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state(), SessionState::Running { .. })
    }

    /// Watch countdown and completion changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Start a capture.
    ///
    /// Rejected without side effects while another capture runs, when no
    /// overlay is on screen, or when no logo is configured. On success the
    /// cycle runs on the tokio runtime; the handle yields its outcome.
    pub fn trigger(self: &Arc<Self>) -> Result<JoinHandle<CaptureOutcome>, TriggerRejected> {
        let logo = self.begin()?;
        tracing::info!("Capture started");

        let session = Arc::clone(self);
        Ok(tokio::spawn(async move { session.run(logo).await }))
    }

    fn begin(&self) -> Result<Arc<LogoAsset<F>>, TriggerRejected> {
        if self.is_running() {
            return Err(TriggerRejected::AlreadyRunning);
        }
        // A closed feed means the frame loop is gone
        if self.feed.has_changed().is_err() || !self.feed.borrow().overlay_drawn {
            return Err(TriggerRejected::NoOverlay);
        }
        let logo = self.logo.clone().ok_or(TriggerRejected::NoLogo)?;

        let started = self.state.send_if_modified(|state| match state {
            SessionState::Idle => {
                *state = SessionState::Running {
                    countdown: COUNTDOWN_START,
                    composed: false,
                };
                true
            }
            SessionState::Running { .. } => false,
        });

        if started {
            Ok(logo)
        } else {
            Err(TriggerRejected::AlreadyRunning)
        }
    }

    async fn run(&self, logo: Arc<LogoAsset<F>>) -> CaptureOutcome {
        let start = Instant::now();
        let ((), outcome) = tokio::join!(self.run_countdown(start), self.run_composition(&logo));

        self.state.send_replace(SessionState::Idle);
        tracing::info!(
            "Capture finished after {:.1}s",
            start.elapsed().as_secs_f64()
        );
        outcome
    }

    async fn run_countdown(&self, start: Instant) {
        let mut ticker = time::interval_at(start + COUNTDOWN_TICK, COUNTDOWN_TICK);
        for remaining in (0..COUNTDOWN_START).rev() {
            ticker.tick().await;
            self.state.send_modify(|state| {
                if let SessionState::Running { countdown, .. } = state {
                    *countdown = remaining;
                }
            });
            tracing::debug!("Countdown {}", remaining);
        }
    }

    async fn run_composition(&self, logo: &LogoAsset<F>) -> CaptureOutcome {
        time::sleep(COMPOSITION_DELAY).await;

        let outcome = match self.compose(logo).await {
            Ok(artifact) => CaptureOutcome::Artifact(artifact),
            Err(failure) => {
                tracing::warn!("Capture produced no image: {}", failure);
                CaptureOutcome::NoArtifact(failure)
            }
        };

        self.state.send_modify(|state| {
            if let SessionState::Running { composed, .. } = state {
                *composed = true;
            }
        });
        outcome
    }

    async fn compose(&self, logo: &LogoAsset<F>) -> Result<CaptureArtifact, CaptureFailure> {
        let frame = self.feed.borrow().frame.clone();
        let frame = frame
            .filter(|f| f.width() > 0 && f.height() > 0)
            .ok_or(CaptureFailure::NoFrame)?;

        let logo = logo.get().await.map_err(CaptureFailure::Logo)?;

        let still = compose_still(&frame, &logo);
        let png = encode_png(&still).map_err(CaptureFailure::Encode)?;
        tracing::debug!(
            "Composed {}x{} still ({} bytes)",
            still.width(),
            still.height(),
            png.len()
        );
        Ok(CaptureArtifact::new(png, still.width(), still.height()))
    }
}
