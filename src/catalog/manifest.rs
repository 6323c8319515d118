use super::fetch::{is_remote, AssetFetcher};
use super::AssetError;
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// One selectable texture as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextureRecord {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(alias = "image", alias = "imageURL")]
    pub image_url: String,
}

impl TextureRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image_url: image_url.into(),
        }
    }
}

/// Catalog APIs hand out numeric ids as often as string ones
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "texture id must be a string or number, got {other}"
        ))),
    }
}

/// Texture catalog plus branding, as served by the asset backend or stored
/// next to the textures on disk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogManifest {
    /// Prefix for relative image locations
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(alias = "data")]
    pub textures: Vec<TextureRecord>,
    #[serde(default)]
    pub logo: Option<String>,
}

impl CatalogManifest {
    pub fn from_json(bytes: &[u8]) -> Result<Self, AssetError> {
        serde_json::from_slice(bytes).map_err(AssetError::Manifest)
    }

    /// Fetch and parse a manifest. A local manifest without `base_url`
    /// resolves relative entries against its own directory.
    pub async fn load<F: AssetFetcher>(fetcher: &F, location: &str) -> Result<Self, AssetError> {
        let bytes = fetcher.fetch(location).await?;
        let mut manifest = Self::from_json(&bytes)?;

        if manifest.base_url.is_none() && !is_remote(location) {
            let local = location.strip_prefix("file://").unwrap_or(location);
            manifest.base_url = Path::new(local)
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .map(|dir| dir.display().to_string());
        }

        tracing::info!(
            "Catalog manifest lists {} textures (logo: {})",
            manifest.textures.len(),
            manifest.logo.is_some()
        );
        Ok(manifest)
    }

    pub fn resolve(&self, location: &str) -> String {
        let absolute = location.contains("://") || location.starts_with('/');
        match &self.base_url {
            Some(base) if !absolute => {
                format!("{}/{}", base.trim_end_matches('/'), location.trim_start_matches('/'))
            }
            _ => location.to_string(),
        }
    }

    /// Records with image locations resolved against `base_url`
    pub fn resolved_textures(&self) -> Vec<TextureRecord> {
        self.textures
            .iter()
            .map(|record| TextureRecord {
                image_url: self.resolve(&record.image_url),
                ..record.clone()
            })
            .collect()
    }

    pub fn resolved_logo(&self) -> Option<String> {
        self.logo.as_deref().map(|logo| self.resolve(logo))
    }
}
