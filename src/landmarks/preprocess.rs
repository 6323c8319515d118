use super::types::Landmark;
use image::{imageops, RgbImage};
use ndarray::Array4;

/// Preprocessor for converting camera frames to face mesh input tensors
/// and model output back to normalized landmarks
pub struct Preprocessor {
    target_width: u32,
    target_height: u32,
}

impl Preprocessor {
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
        }
    }

    /// Preprocess an RGB image into a normalized NHWC tensor
    ///
    /// Steps:
    /// 1. Stretch to target dimensions (no letterboxing, so normalized
    ///    coordinates map straight back onto the source frame)
    /// 2. Convert to float and normalize to [0, 1]
    ///
    /// Returns: Array4<f32> with shape [1, height, width, 3]
    pub fn preprocess(&self, image: &RgbImage) -> Array4<f32> {
        let _span = tracing::debug_span!("preprocess").entered();

        let resized = if image.dimensions() != (self.target_width, self.target_height) {
            imageops::resize(
                image,
                self.target_width,
                self.target_height,
                imageops::FilterType::Triangle,
            )
        } else {
            image.clone()
        };

        let (width, height) = resized.dimensions();
        let mut tensor = Array4::<f32>::zeros((1, height as usize, width as usize, 3));

        for (x, y, pixel) in resized.enumerate_pixels() {
            for channel in 0..3 {
                tensor[[0, y as usize, x as usize, channel]] = pixel[channel] as f32 / 255.0;
            }
        }

        tensor
    }

    /// Convert flattened `[x, y, z]` triples in model input pixels into
    /// normalized landmarks
    pub fn landmarks_from_output(&self, raw: &[f32]) -> Vec<Landmark> {
        let _span = tracing::debug_span!("postprocess").entered();

        let width = self.target_width as f32;
        let height = self.target_height as f32;

        raw.chunks_exact(3)
            .map(|xyz| Landmark::with_depth(xyz[0] / width, xyz[1] / height, xyz[2] / width))
            .collect()
    }
}
