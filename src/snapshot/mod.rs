mod artifact;
pub mod composition;
mod session;

#[cfg(test)]
mod scenario_tests;

pub use artifact::{deliver, CaptureArtifact, Delivery};
pub use composition::{compose_still, encode_png, CAPTURE_SCALE, LOGO_TOP_MARGIN, LOGO_WIDTH};
pub use session::{
    CaptureFailure, CaptureOutcome, CaptureSession, SessionState, TriggerRejected,
    COMPOSITION_DELAY, COUNTDOWN_START, COUNTDOWN_TICK,
};
