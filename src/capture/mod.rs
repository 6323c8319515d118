//! Frame sources for the live overlay.

mod still;
mod v4l_capture;

pub use still::StillImageSource;
pub use v4l_capture::WebcamCapture;

use anyhow::Result;
use image::RgbImage;

/// Where the frame loop gets its pictures.
///
/// Frames come back in sensor orientation; mirroring for the selfie view
/// happens only at the preview and in the capture still. An error means the
/// device is gone: the frame loop ends and capture is disabled, so sources
/// should not use errors for a single dropped frame.
pub trait CaptureSource {
    fn capture_frame(&mut self) -> Result<RgbImage>;

    /// Negotiated frame size, (width, height)
    fn resolution(&self) -> (u32, u32);
}
