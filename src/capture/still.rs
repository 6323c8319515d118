use super::CaptureSource;
use anyhow::{Context, Result};
use image::RgbImage;
use std::path::Path;

/// Replays one still image as an endless camera feed.
///
/// Lets the overlay run headless (no webcam) against a saved portrait.
pub struct StillImageSource {
    image: RgbImage,
}

impl StillImageSource {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .with_context(|| format!("Failed to open input image {}", path.display()))?
            .to_rgb8();
        tracing::info!(
            "Replaying {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(Self::new(image))
    }
}

impl CaptureSource for StillImageSource {
    fn capture_frame(&mut self) -> Result<RgbImage> {
        Ok(self.image.clone())
    }

    fn resolution(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}
