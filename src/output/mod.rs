//! Live preview destinations.

mod loopback;

pub use loopback::{prepare_preview, V4L2Output};

use anyhow::Result;
use image::RgbImage;

/// Receives every composited frame, overlay included.
///
/// Frames arrive in sensor orientation at capture resolution; the sink owns
/// mirroring and scaling to its own size. A write error ends the frame loop
/// just like a lost camera.
pub trait OutputSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;

    /// Size of the frames the sink emits, (width, height)
    fn resolution(&self) -> (u32, u32);
}
