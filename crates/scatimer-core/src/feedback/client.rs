//! HTTP client for the feedback endpoint.
//!
//! Submission is fire-and-forget from the user's point of view: callers
//! log failures and move on. [`FeedbackGate`] keeps the feedback buttons
//! disabled for a short cooldown after every click, whatever the outcome.

use std::time::Duration;

use reqwest::Client;
use tokio::time::Instant;
use url::Url;

use super::{FeedbackRequest, FeedbackSummary, Rating};
use crate::error::{CoreError, Result};
use crate::timer::Mode;

/// How long the buttons stay disabled after a click.
pub const FEEDBACK_COOLDOWN: Duration = Duration::from_secs(2);

const FEEDBACK_PATH: &str = "/api/feedback";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct FeedbackClient {
    http: Client,
    endpoint: Url,
}

impl FeedbackClient {
    /// Create a client for the server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid URL or the HTTP client
    /// cannot be built.
    pub fn new(base_url: &str) -> Result<Self> {
        let endpoint = Url::parse(base_url)?.join(FEEDBACK_PATH)?;
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// POST one rating.
    ///
    /// # Errors
    ///
    /// Network failures and non-2xx responses are returned as errors.
    pub async fn submit(&self, rating: Rating, mode: Mode) -> Result<()> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&FeedbackRequest::new(rating, mode))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::Status {
                status: status.as_u16(),
            });
        }
        tracing::debug!(%rating, %mode, "feedback sent");
        Ok(())
    }

    /// GET the summary.
    ///
    /// # Errors
    ///
    /// Network failures, non-2xx responses and unparseable bodies.
    pub async fn summary(&self) -> Result<FeedbackSummary> {
        let response = self.http.get(self.endpoint.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response.json::<FeedbackSummary>().await?)
    }
}

/// Duplicate-submission guard for the feedback buttons.
#[derive(Debug, Clone)]
pub struct FeedbackGate {
    cooldown: Duration,
    disabled_until: Option<Instant>,
}

impl Default for FeedbackGate {
    fn default() -> Self {
        Self::new(FEEDBACK_COOLDOWN)
    }
}

impl FeedbackGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            disabled_until: None,
        }
    }

    pub fn is_enabled(&self, now: Instant) -> bool {
        self.disabled_until.map_or(true, |until| now >= until)
    }

    /// Register a click. Returns false and does nothing while disabled.
    pub fn try_click(&mut self, now: Instant) -> bool {
        if !self.is_enabled(now) {
            return false;
        }
        self.disabled_until = Some(now + self.cooldown);
        true
    }

    /// When the buttons come back, if they are currently disabled.
    pub fn reenable_at(&self) -> Option<Instant> {
        self.disabled_until
    }
}
