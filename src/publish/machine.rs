//! Publish state machine: create a container, then poll until published or out
//! of attempts.
//!
//! ```text
//! Created -> Publishing -> Published
//!                       -> Exhausted
//! ```

use std::time::Duration;

use async_trait::async_trait;

use super::graph::{GraphClient, PublishError};
use crate::config::PublishConfig;

/// Default number of publish attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default wait before each publish attempt (10 seconds).
pub const DEFAULT_ATTEMPT_DELAY: Duration = Duration::from_secs(10);

/// The two calls the state machine makes against the media backend.
#[async_trait]
pub trait MediaApi {
    /// Create a container and return its creation id.
    async fn create_container(&self, video_url: &str, caption: &str)
        -> Result<String, PublishError>;

    /// Request publication; `Ok(None)` means not published yet.
    async fn publish(&self, creation_id: &str) -> Result<Option<String>, PublishError>;
}

/// Graph API binding with a fixed `share_to_feed` setting.
pub struct GraphMediaApi {
    client: GraphClient,
    share_to_feed: bool,
}

impl GraphMediaApi {
    pub fn new(client: GraphClient, share_to_feed: bool) -> Self {
        Self {
            client,
            share_to_feed,
        }
    }

    pub fn client(&self) -> &GraphClient {
        &self.client
    }
}

#[async_trait]
impl MediaApi for GraphMediaApi {
    async fn create_container(
        &self,
        video_url: &str,
        caption: &str,
    ) -> Result<String, PublishError> {
        self.client
            .create_container(video_url, caption, self.share_to_feed)
            .await
    }

    async fn publish(&self, creation_id: &str) -> Result<Option<String>, PublishError> {
        self.client.publish(creation_id).await
    }
}

/// Waits between publish attempts.
#[async_trait]
pub trait Delay {
    async fn wait(&self, duration: Duration);
}

/// Real wall-clock delay.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Attempt budget and pre-attempt wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_ATTEMPT_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &PublishConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            delay: config.attempt_delay(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishState {
    Created,
    Publishing,
    Published,
    Exhausted,
}

impl PublishState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PublishState::Published | PublishState::Exhausted)
    }
}

/// One container on its way to being published.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishJob {
    creation_id: String,
    media_id: Option<String>,
    attempts: u32,
    state: PublishState,
}

impl PublishJob {
    pub fn new(creation_id: String) -> Self {
        Self {
            creation_id,
            media_id: None,
            attempts: 0,
            state: PublishState::Created,
        }
    }

    pub fn creation_id(&self) -> &str {
        &self.creation_id
    }

    pub fn media_id(&self) -> Option<&str> {
        self.media_id.as_deref()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn state(&self) -> PublishState {
        self.state
    }
}

/// How a publish run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published { media_id: String, attempts: u32 },
    /// The container still exists and can be published later.
    Exhausted { creation_id: String, attempts: u32 },
}

/// Drives publish jobs against a media backend.
pub struct Publisher<A: MediaApi, D: Delay> {
    api: A,
    delay: D,
    policy: RetryPolicy,
}

impl<A: MediaApi, D: Delay> Publisher<A, D> {
    pub fn new(api: A, delay: D, policy: RetryPolicy) -> Self {
        Self { api, delay, policy }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Create the media container. Failure here is fatal for the run.
    pub async fn create(&self, video_url: &str, caption: &str) -> Result<PublishJob, PublishError> {
        let creation_id = self.api.create_container(video_url, caption).await?;
        Ok(PublishJob::new(creation_id))
    }

    /// Poll until the job is published or the attempt budget is spent.
    ///
    /// Each attempt is preceded by the policy delay. Errors and responses
    /// without a media id only consume an attempt.
    pub async fn drive(&self, job: &mut PublishJob) -> PublishOutcome {
        if !job.state.is_terminal() {
            job.state = PublishState::Publishing;
        }

        while job.state == PublishState::Publishing {
            if job.attempts >= self.policy.max_attempts {
                job.state = PublishState::Exhausted;
                break;
            }

            self.delay.wait(self.policy.delay).await;
            job.attempts += 1;

            match self.api.publish(&job.creation_id).await {
                Ok(Some(media_id)) => {
                    log::info!(
                        "Published media {} after {} attempt(s)",
                        media_id, job.attempts
                    );
                    job.media_id = Some(media_id);
                    job.state = PublishState::Published;
                }
                Ok(None) => {
                    log::warn!(
                        "Publish attempt {}/{} returned no media id",
                        job.attempts,
                        self.policy.max_attempts
                    );
                }
                Err(e) => {
                    log::warn!(
                        "Publish attempt {}/{} failed: {}",
                        job.attempts,
                        self.policy.max_attempts,
                        e
                    );
                }
            }
        }

        match (&job.state, &job.media_id) {
            (PublishState::Published, Some(media_id)) => PublishOutcome::Published {
                media_id: media_id.clone(),
                attempts: job.attempts,
            },
            _ => {
                log::warn!(
                    "Publishing gave up after {} attempt(s); container {} is still pending",
                    job.attempts,
                    job.creation_id
                );
                PublishOutcome::Exhausted {
                    creation_id: job.creation_id.clone(),
                    attempts: job.attempts,
                }
            }
        }
    }

    /// Create a container and drive it to a terminal state.
    pub async fn publish_reel(
        &self,
        video_url: &str,
        caption: &str,
    ) -> Result<PublishOutcome, PublishError> {
        let mut job = self.create(video_url, caption).await?;
        Ok(self.drive(&mut job).await)
    }
}
