//! GraphClient - media container creation and publishing over the Graph API.

use std::time::Duration;

use serde::Deserialize;

/// Default base URL for the Graph API.
pub const GRAPH_API_BASE_URL: &str = "https://graph.facebook.com";

/// Default Graph API version.
pub const DEFAULT_API_VERSION: &str = "v17.0";

/// Media type sent when creating a reel container.
const REELS_MEDIA_TYPE: &str = "REELS";

/// Default timeout for HTTP requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Body shape shared by container and publish responses.
#[derive(Debug, Deserialize)]
struct IdResponse {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PermalinkResponse {
    #[serde(default)]
    permalink: Option<String>,
}

/// Client for the media container endpoints of one account.
pub struct GraphClient {
    user_id: String,
    access_token: String,
    base_url: String,
    api_version: String,
    http_client: reqwest::Client,
}

impl GraphClient {
    /// Create a client against the public Graph API.
    pub fn new(user_id: String, access_token: String) -> Result<Self, PublishError> {
        Self::with_base_url(
            user_id,
            access_token,
            GRAPH_API_BASE_URL.to_string(),
            DEFAULT_API_VERSION.to_string(),
        )
    }

    /// Create a client with a custom base URL and API version.
    ///
    /// Useful for testing against a mock server.
    pub fn with_base_url(
        user_id: String,
        access_token: String,
        base_url: String,
        api_version: String,
    ) -> Result<Self, PublishError> {
        if user_id.is_empty() {
            return Err(PublishError::MissingCredential("user id"));
        }
        if access_token.is_empty() {
            return Err(PublishError::MissingCredential("access token"));
        }

        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            user_id,
            access_token,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_version,
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn account_url(&self, edge: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url, self.api_version, self.user_id, edge
        )
    }

    /// Create a reel container for a publicly reachable video.
    ///
    /// Returns the creation id. A response without an `id` is an error.
    pub async fn create_container(
        &self,
        video_url: &str,
        caption: &str,
        share_to_feed: bool,
    ) -> Result<String, PublishError> {
        let share_to_feed = share_to_feed.to_string();
        let response = self
            .http_client
            .post(self.account_url("media"))
            .query(&[
                ("media_type", REELS_MEDIA_TYPE),
                ("video_url", video_url),
                ("caption", caption),
                ("share_to_feed", share_to_feed.as_str()),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(PublishError::ApiError(format!(
                "container creation failed with status {}: {}",
                status, body
            )));
        }

        let parsed: IdResponse = serde_json::from_str(&body)
            .map_err(|_| PublishError::MissingId { body: body.clone() })?;
        match parsed.id {
            Some(id) => {
                log::info!("Created media container {}", id);
                Ok(id)
            }
            None => Err(PublishError::MissingId { body }),
        }
    }

    /// Ask for the container to be published.
    ///
    /// `Ok(None)` means the request went through but no media id came back
    /// yet, which is what an unfinished upload looks like.
    pub async fn publish(&self, creation_id: &str) -> Result<Option<String>, PublishError> {
        let response = self
            .http_client
            .post(self.account_url("media_publish"))
            .query(&[
                ("creation_id", creation_id),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PublishError::ApiError(format!(
                "publish failed with status {}: {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        match serde_json::from_str::<IdResponse>(&body) {
            Ok(IdResponse { id: Some(id) }) => Ok(Some(id)),
            _ => {
                log::debug!("Publish response without id: {}", body);
                Ok(None)
            }
        }
    }

    /// Look up the public link of a published reel.
    pub async fn permalink(&self, media_id: &str) -> Result<Option<String>, PublishError> {
        let url = format!("{}/{}/{}", self.base_url, self.api_version, media_id);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("fields", "permalink"),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PublishError::ApiError(format!(
                "media lookup failed with status {}: {}",
                status, error_text
            )));
        }

        let parsed: PermalinkResponse = response.json().await?;
        Ok(parsed.permalink)
    }
}

/// Errors from the Graph API client and the publish flow.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("{0} not configured")]
    MissingCredential(&'static str),

    #[error("container response has no id: {body}")]
    MissingId { body: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error: {0}")]
    ApiError(String),
}
