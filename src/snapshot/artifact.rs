use chrono::{DateTime, Local};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The final still of a capture: PNG bytes plus, once saved, its location.
#[derive(Debug, Clone)]
pub struct CaptureArtifact {
    png: Vec<u8>,
    width: u32,
    height: u32,
    created_at: DateTime<Local>,
    location: Option<PathBuf>,
}

impl CaptureArtifact {
    pub fn new(png: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            png,
            width,
            height,
            created_at: Local::now(),
            location: None,
        }
    }

    pub fn png(&self) -> &[u8] {
        &self.png
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub fn file_name(&self) -> String {
        format!("irislens-{}.png", self.created_at.format("%Y%m%d-%H%M%S%.3f"))
    }

    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Presentation URL of the saved file
    pub fn url(&self) -> Option<String> {
        self.location
            .as_ref()
            .map(|path| format!("file://{}", path.display()))
    }

    /// Write the PNG into `dir` (created if needed) and remember where
    pub fn save(&mut self, dir: &Path) -> io::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        fs::write(&path, &self.png)?;
        tracing::info!("Saved capture to {}", path.display());
        self.location = Some(path.clone());
        Ok(path)
    }
}

/// How a saved artifact reached the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the platform opener
    Shared(PathBuf),
    /// Only written to disk
    Saved(PathBuf),
}

/// Save the artifact and, if `share` is set, hand it to the platform opener.
/// Opening failures fall back to a plain save.
pub fn deliver(artifact: &mut CaptureArtifact, dir: &Path, share: bool) -> io::Result<Delivery> {
    let path = artifact.save(dir)?;
    if !share {
        return Ok(Delivery::Saved(path));
    }

    match open::that(&path) {
        Ok(()) => Ok(Delivery::Shared(path)),
        Err(err) => {
            tracing::warn!("Could not open {}: {}", path.display(), err);
            Ok(Delivery::Saved(path))
        }
    }
}
