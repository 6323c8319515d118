use anyhow::Result;
use image::RgbImage;
use std::ops::Range;
use std::sync::Arc;

/// Number of points in a refined face mesh (468 face points + 2 × 5 iris points)
pub const FACE_MESH_LANDMARKS: usize = 478;

/// Eyelid opening of the left eye, traced in drawing order
pub const LEFT_EYE_BOUNDARY: [usize; 16] = [
    33, 246, 161, 160, 159, 158, 157, 173, 133, 155, 154, 153, 145, 144, 163, 7,
];

/// Eyelid opening of the right eye, traced in drawing order
pub const RIGHT_EYE_BOUNDARY: [usize; 16] = [
    263, 466, 388, 387, 386, 385, 384, 398, 362, 382, 381, 380, 374, 373, 390, 249,
];

pub const LEFT_IRIS: Range<usize> = 468..473;
pub const RIGHT_IRIS: Range<usize> = 473..478;

/// A single tracked facial point.
///
/// `x` and `y` are normalized to the frame (0.0-1.0); `z` is the detector's
/// relative depth and is not used for compositing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn with_depth(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Scale to pixel coordinates of a `width` x `height` buffer
    pub fn to_pixels(&self, width: u32, height: u32) -> (f32, f32) {
        (self.x * width as f32, self.y * height as f32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub const BOTH: [Eye; 2] = [Eye::Left, Eye::Right];

    pub fn boundary(self) -> &'static [usize; 16] {
        match self {
            Eye::Left => &LEFT_EYE_BOUNDARY,
            Eye::Right => &RIGHT_EYE_BOUNDARY,
        }
    }

    pub fn iris_range(self) -> Range<usize> {
        match self {
            Eye::Left => LEFT_IRIS,
            Eye::Right => RIGHT_IRIS,
        }
    }
}

/// Landmarks detected in one camera frame, paired with that frame.
///
/// An empty landmark list means no face was found. Frames carry no state
/// from earlier frames.
#[derive(Debug, Clone)]
pub struct LandmarkFrame {
    image: Arc<RgbImage>,
    landmarks: Vec<Landmark>,
}

impl LandmarkFrame {
    pub fn new(image: Arc<RgbImage>, landmarks: Vec<Landmark>) -> Self {
        Self { image, landmarks }
    }

    pub fn without_face(image: Arc<RgbImage>) -> Self {
        Self::new(image, Vec::new())
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn has_face(&self) -> bool {
        !self.landmarks.is_empty()
    }

    /// The iris ring of `eye`, or `None` when the frame is too short to hold it
    pub fn iris_ring(&self, eye: Eye) -> Option<&[Landmark]> {
        self.landmarks.get(eye.iris_range())
    }

    /// The eyelid opening of `eye` in boundary order
    pub fn eyelid_outline(&self, eye: Eye) -> Option<Vec<Landmark>> {
        eye.boundary()
            .iter()
            .map(|&idx| self.landmarks.get(idx).copied())
            .collect()
    }
}

/// Trait for face landmark detectors
/// Allows swapping the ONNX face mesh for other backends or test doubles
pub trait LandmarkSource: Send {
    /// Detect face landmarks in a frame
    ///
    /// # Returns
    /// * `FACE_MESH_LANDMARKS` normalized points for the first face, or an
    ///   empty vector when no face is visible
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<Landmark>>;
}

/// Passthrough detector used when no model is configured: never finds a face.
pub struct NoDetector;

impl LandmarkSource for NoDetector {
    fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<Landmark>> {
        Ok(Vec::new())
    }
}
