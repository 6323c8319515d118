mod fetch;
mod manifest;


pub use fetch::{is_remote, AssetFetcher, DefaultFetcher};
pub use manifest::{CatalogManifest, TextureRecord};

use futures::future::join_all;
use image::RgbaImage;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("server returned {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: image::ImageError,
    },
    #[error("invalid catalog manifest: {0}")]
    Manifest(#[source] serde_json::Error),
}

/// Fetch and decode one image
pub async fn fetch_image<F: AssetFetcher>(fetcher: &F, url: &str) -> Result<RgbaImage, AssetError> {
    let bytes = fetcher.fetch(url).await?;
    let image = image::load_from_memory(&bytes).map_err(|source| AssetError::Decode {
        url: url.to_string(),
        source,
    })?;
    Ok(image.to_rgba8())
}

/// Decoded, ready-to-draw iris textures keyed by id.
///
/// Only textures that decoded successfully are present; `records` lists them
/// in catalog order.
#[derive(Debug, Default)]
pub struct TextureCatalog {
    records: Vec<TextureRecord>,
    textures: HashMap<String, RgbaImage>,
}

impl TextureCatalog {
    /// Fetch and decode every texture concurrently.
    ///
    /// Failed textures are left out and returned alongside the catalog so the
    /// caller can report them; the rest stay usable.
    pub async fn load<F: AssetFetcher>(
        fetcher: &F,
        records: &[TextureRecord],
    ) -> (Self, Vec<AssetError>) {
        let loads = records
            .iter()
            .map(|record| async move { (record, fetch_image(fetcher, &record.image_url).await) });

        let mut catalog = Self::default();
        let mut failures = Vec::new();
        for (record, result) in join_all(loads).await {
            match result {
                Ok(image) => catalog.insert(record.clone(), image),
                Err(err) => {
                    tracing::warn!("Texture {} unavailable: {}", record.id, err);
                    failures.push(err);
                }
            }
        }

        tracing::info!(
            "Loaded {} of {} iris textures",
            catalog.len(),
            records.len()
        );
        (catalog, failures)
    }

    pub fn insert(&mut self, record: TextureRecord, image: RgbaImage) {
        if self.textures.insert(record.id.clone(), image).is_none() {
            self.records.push(record);
        }
    }

    pub fn texture(&self, id: &str) -> Option<&RgbaImage> {
        self.textures.get(id)
    }

    pub fn records(&self) -> &[TextureRecord] {
        &self.records
    }

    pub fn first_id(&self) -> Option<&str> {
        self.records.first().map(|record| record.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Branding logo, fetched on first use and reused afterwards.
///
/// A failed fetch is not remembered: the next capture tries again.
pub struct LogoAsset<F> {
    url: String,
    fetcher: F,
    image: OnceCell<Arc<RgbaImage>>,
}

impl<F: AssetFetcher> LogoAsset<F> {
    pub fn new(url: impl Into<String>, fetcher: F) -> Self {
        Self {
            url: url.into(),
            fetcher,
            image: OnceCell::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn get(&self) -> Result<Arc<RgbaImage>, AssetError> {
        self.image
            .get_or_try_init(|| async {
                tracing::debug!("Loading logo from {}", self.url);
                fetch_image(&self.fetcher, &self.url).await.map(Arc::new)
            })
            .await
            .cloned()
    }
}
