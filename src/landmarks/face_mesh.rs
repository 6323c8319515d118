use super::preprocess::Preprocessor;
use super::types::{Landmark, LandmarkSource, FACE_MESH_LANDMARKS};
use anyhow::{anyhow, Result};
use image::RgbImage;
use ort::session::Session;
use std::path::Path;

/// Face mesh model input resolution
const INPUT_SIZE: u32 = 256;

/// Minimum face presence score (after sigmoid) to accept a detection
const PRESENCE_THRESHOLD: f32 = 0.5;

/// Refined face mesh landmark model (478 points including both iris rings)
///
/// The model is stateless: every frame is detected independently. It expects
/// the face to fill most of the frame, which holds for a selfie camera.
pub struct FaceMesh {
    session: Session,
    preprocessor: Preprocessor,
}

impl FaceMesh {
    /// Create a new face mesh detector from an ONNX file
    ///
    /// # Expected model signature
    /// - input: `[1, 256, 256, 3]` RGB in [0, 1]
    /// - output 0: `[.., 1434]` landmark triples in input pixels
    /// - output 1: face presence logit
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let path = model_path.as_ref();

        tracing::info!("Loading face mesh model from {}", path.display());

        let session = load_session(path)
            .map_err(|e| anyhow!("Failed to load model from {}: {e}", path.display()))?;

        tracing::info!("Face mesh model loaded successfully");

        Ok(Self {
            session,
            preprocessor: Preprocessor::new(INPUT_SIZE, INPUT_SIZE),
        })
    }

    fn infer(&mut self, frame: &RgbImage) -> Result<Vec<Landmark>, Box<dyn std::error::Error>> {
        let input_tensor = self.preprocessor.preprocess(frame);

        let _infer_span = tracing::debug_span!("inference").entered();
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        drop(_infer_span);

        if outputs.len() < 2 {
            return Err(format!("face mesh model expected 2 outputs, got {}", outputs.len()).into());
        }

        let presence = outputs[1].try_extract_array::<f32>()?;
        let score = presence.iter().next().copied().map(sigmoid).unwrap_or(0.0);
        if score < PRESENCE_THRESHOLD {
            tracing::trace!("No face (presence {:.2})", score);
            return Ok(Vec::new());
        }

        let coords = outputs[0].try_extract_array::<f32>()?;
        let raw: Vec<f32> = coords.iter().copied().collect();
        let landmarks = self.preprocessor.landmarks_from_output(&raw);

        if landmarks.len() != FACE_MESH_LANDMARKS {
            return Err(format!(
                "face mesh model produced {} landmarks, expected {}",
                landmarks.len(),
                FACE_MESH_LANDMARKS
            )
            .into());
        }

        Ok(landmarks)
    }
}

fn load_session(path: &Path) -> Result<Session, Box<dyn std::error::Error>> {
    Ok(Session::builder()?.commit_from_file(path)?)
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

impl LandmarkSource for FaceMesh {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<Landmark>> {
        let _span = tracing::debug_span!("face_mesh").entered();
        self.infer(frame).map_err(|e| anyhow!("Face mesh inference failed: {e}"))
    }
}
