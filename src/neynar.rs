use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::cast::{CastPage, RawCast};
use crate::config::{AppConfig, ConfigError};
use crate::retry::{RetryError, RetryPolicy};

const API_KEY_HEADER: &str = "x-api-key";
const EXPERIMENTAL_HEADER: &str = "x-neynar-experimental";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Neynar request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("Neynar API error: {}", describe_status(.status, .detail))]
    Status { status: StatusCode, detail: String },
    #[error("Neynar response parse failed: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("Farcaster user not found: {0}")]
    UserNotFound(String),
}

impl FetchError {
    /// Transport failures, rate limiting and server errors are worth another
    /// attempt; everything else will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Request(_) => true,
            FetchError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            FetchError::Parse(_) | FetchError::UserNotFound(_) => false,
        }
    }
}

fn describe_status(status: &StatusCode, detail: &str) -> String {
    if detail.is_empty() {
        status.to_string()
    } else {
        format!("{} {}", status, detail)
    }
}

/// Which listing endpoint supplies the casts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastSource {
    UserCasts,
    Feed,
}

impl CastSource {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "user_casts" | "casts" | "user" => Some(CastSource::UserCasts),
            "feed" | "filtered_feed" => Some(CastSource::Feed),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CastSource::UserCasts => "user_casts",
            CastSource::Feed => "feed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarcasterUser {
    pub fid: u64,
    pub username: String,
    pub display_name: Option<String>,
    pub pfp_url: Option<String>,
}

#[derive(Deserialize)]
struct UserLookupResponse {
    user: Option<FarcasterUser>,
}

#[derive(Clone)]
pub struct NeynarClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    fetch_limit: usize,
    retry: RetryPolicy,
}

impl NeynarClient {
    /// Fails with `MissingApiKey` before any request is made when the key is
    /// not configured.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let api_key = config.require_api_key()?.to_string();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.neynar.timeout_ms))
            .build()
            .map_err(|err| ConfigError::InvalidValue {
                name: "neynar".to_string(),
                message: format!("failed to build HTTP client: {}", err),
            })?;

        Ok(Self {
            client,
            api_base: config.neynar.api_base.clone(),
            api_key,
            fetch_limit: config.neynar.fetch_limit,
            retry: config.retry.to_policy(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetches one page of casts from `source`, retrying transient failures.
    pub async fn fetch_casts(
        &self,
        source: CastSource,
        fid: u64,
    ) -> Result<Vec<RawCast>, RetryError<FetchError>> {
        let limit = self.fetch_limit;
        self.retry
            .run(
                source.label(),
                |_| async move {
                    match source {
                        CastSource::UserCasts => self.fetch_user_casts(fid, limit).await,
                        CastSource::Feed => self.fetch_feed(fid, limit).await,
                    }
                },
                FetchError::is_retryable,
            )
            .await
    }

    pub async fn fetch_user_casts(&self, fid: u64, limit: usize) -> Result<Vec<RawCast>, FetchError> {
        let request = self
            .client
            .get(self.endpoint("farcaster/user/casts"))
            .query(&[("fid", fid.to_string()), ("limit", limit.to_string())]);
        let page: CastPage = self.send(request).await?;
        Ok(page.into_casts())
    }

    /// The fid-filtered feed, which matches what Warpcast shows for a user.
    pub async fn fetch_feed(&self, fid: u64, limit: usize) -> Result<Vec<RawCast>, FetchError> {
        let request = self
            .client
            .get(self.endpoint("farcaster/feed"))
            .query(&[
                ("feed_type", "filter".to_string()),
                ("filter_type", "fids".to_string()),
                ("fids", fid.to_string()),
                ("limit", limit.to_string()),
            ])
            .header(EXPERIMENTAL_HEADER, "true");
        let page: CastPage = self.send(request).await?;
        Ok(page.into_casts())
    }

    pub async fn lookup_user_by_username(
        &self,
        username: &str,
    ) -> Result<FarcasterUser, RetryError<FetchError>> {
        let username = username.trim().trim_start_matches('@').to_string();
        self.retry
            .run(
                "user_lookup",
                |_| {
                    let username = username.clone();
                    async move {
                        let request = self
                            .client
                            .get(self.endpoint("farcaster/user/by_username"))
                            .query(&[("username", username.as_str())]);
                        let body: UserLookupResponse = match self.send(request).await {
                            Err(FetchError::Status { status, .. })
                                if status == StatusCode::NOT_FOUND =>
                            {
                                return Err(FetchError::UserNotFound(username));
                            }
                            other => other?,
                        };
                        body.user.ok_or(FetchError::UserNotFound(username))
                    }
                },
                FetchError::is_retryable,
            )
            .await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, FetchError> {
        let response = request
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(FetchError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status,
                detail: error_body.trim().to_string(),
            });
        }

        let body = response.text().await.map_err(FetchError::Request)?;
        debug!(status = %status, bytes = body.len(), "Neynar response received");
        serde_json::from_str(&body).map_err(FetchError::Parse)
    }
}
