use super::AssetError;
use std::future::Future;
use std::path::PathBuf;

/// Source of raw asset bytes (textures, logo, manifest)
pub trait AssetFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, AssetError>> + Send;
}

/// Fetches `http(s)://` URLs over the network and everything else from disk.
#[derive(Clone, Default)]
pub struct DefaultFetcher {
    client: reqwest::Client,
}

impl DefaultFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl AssetFetcher for DefaultFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        if !is_remote(url) {
            let path = PathBuf::from(url.strip_prefix("file://").unwrap_or(url));
            return tokio::fs::read(&path)
                .await
                .map_err(|source| AssetError::Read { path, source });
        }

        tracing::debug!("Fetching {}", url);
        let fetch_err = |source| AssetError::Fetch {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(fetch_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(fetch_err)?;
        Ok(bytes.to_vec())
    }
}
