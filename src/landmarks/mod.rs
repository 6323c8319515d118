mod face_mesh;
mod preprocess;
pub mod types;

pub use face_mesh::FaceMesh;
pub use preprocess::Preprocessor;
pub use types::{
    Eye, Landmark, LandmarkFrame, LandmarkSource, NoDetector, FACE_MESH_LANDMARKS,
    LEFT_EYE_BOUNDARY, LEFT_IRIS, RIGHT_EYE_BOUNDARY, RIGHT_IRIS,
};

use anyhow::Result;

/// Create the default landmark detector (ONNX face mesh)
pub fn create_default_detector(model_path: &str) -> Result<Box<dyn LandmarkSource>> {
    let detector = FaceMesh::new(model_path)?;
    Ok(Box::new(detector))
}
