//! ImageSearchClient - talks to the image-search provider and downloads images.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tokio::io::AsyncWriteExt;

/// Default base URL for the image-search provider.
pub const DEFAULT_SEARCH_BASE_URL: &str = "https://api.unsplash.com";

/// Default timeout for HTTP requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Response from the photo search endpoint.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    urls: ResultUrls,
}

#[derive(Debug, Deserialize)]
struct ResultUrls {
    regular: String,
}

/// Client for the image-search provider.
pub struct ImageSearchClient {
    access_key: String,
    base_url: String,
    http_client: reqwest::Client,
}

impl ImageSearchClient {
    /// Create a client against the default provider.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::MissingAccessKey` if `access_key` is empty.
    pub fn new(access_key: String) -> Result<Self, AssetError> {
        Self::with_base_url(access_key, DEFAULT_SEARCH_BASE_URL.to_string())
    }

    /// Create a client with a custom base URL.
    ///
    /// Useful for testing against a mock server.
    pub fn with_base_url(access_key: String, base_url: String) -> Result<Self, AssetError> {
        if access_key.is_empty() {
            return Err(AssetError::MissingAccessKey);
        }

        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            access_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Search for a single image matching `query`.
    ///
    /// Only the first result of the first page is considered. `Ok(None)` means
    /// the provider answered but had no results.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::HttpError` if the request or JSON parsing fails and
    /// `AssetError::ApiError` if the provider returns a non-success status.
    pub async fn search_first(
        &self,
        query: &str,
        orientation: &str,
    ) -> Result<Option<String>, AssetError> {
        let url = format!("{}/search/photos", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .query(&[
                ("query", query),
                ("page", "1"),
                ("per_page", "1"),
                ("orientation", orientation),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AssetError::ApiError(format!(
                "Image search failed with status {}: {}",
                status, error_text
            )));
        }

        let search: SearchResponse = response.json().await?;
        Ok(search.results.into_iter().next().map(|r| r.urls.regular))
    }

    /// Download an image to disk, creating parent directories as needed.
    ///
    /// The body is streamed so large images never sit fully in memory.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<PathBuf, AssetError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = self.http_client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AssetError::ApiError(format!(
                "Image download failed with status {} for {}",
                status, url
            )));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();

        use futures_util::StreamExt;
        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result?;
            file.write_all(&chunk).await?;
        }

        file.flush().await?;

        Ok(dest.to_path_buf())
    }
}

/// Errors that can occur while searching for or downloading images.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("image search access key not configured")]
    MissingAccessKey,

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
