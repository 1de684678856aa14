use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::config::AppSection;
use crate::dashboard::EmptyStateView;
use crate::{RankedCast, TopCastsReport};

/// Largest `limit` a client may request.
pub const MAX_API_LIMIT: usize = 25;

#[derive(Debug, Deserialize)]
pub struct CastsQuery {
    pub fid: Option<String>,
    pub username: Option<String>,
    pub limit: Option<String>,
}

impl CastsQuery {
    pub fn parsed_fid(&self) -> Result<Option<u64>, ApiError> {
        match self.fid.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => value
                .parse::<u64>()
                .ok()
                .filter(|fid| *fid > 0)
                .map(Some)
                .ok_or_else(|| {
                    ApiError::new(StatusCode::BAD_REQUEST, "FID must be a positive integer")
                }),
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Requested cut-off clamped to `1..=MAX_API_LIMIT`; `default` when absent.
    pub fn limit_or(&self, default: usize) -> Result<usize, ApiError> {
        let limit = match self.limit.as_deref().map(str::trim) {
            None | Some("") => default,
            Some(value) => value.parse::<usize>().map_err(|_| {
                ApiError::new(StatusCode::BAD_REQUEST, "limit must be a positive integer")
            })?,
        };
        Ok(limit.clamp(1, MAX_API_LIMIT))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCastsResponse {
    pub fid: u64,
    pub casts: Vec<RankedCast>,
    pub total_casts: usize,
    pub total_engagement: u64,
    pub empty_state: Option<EmptyStateView>,
}

impl ApiCastsResponse {
    pub fn from_report(report: TopCastsReport, username: Option<&str>) -> Self {
        let empty_state = if report.casts.is_empty() {
            Some(EmptyStateView::new(report.casts_fetched, username))
        } else {
            None
        };
        Self {
            fid: report.fid,
            casts: report.casts,
            total_casts: report.casts_fetched,
            total_engagement: report.total_engagement,
            empty_state,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub redirect_url: String,
}

/// Mini App manifest served at `/.well-known/farcaster.json`.
#[derive(Debug, Serialize)]
pub struct MiniAppManifest {
    pub frame: ManifestFrame,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestFrame {
    pub version: String,
    pub name: String,
    pub home_url: String,
    pub icon_url: String,
    pub image_url: String,
    pub button_title: String,
    pub splash_image_url: String,
    pub splash_background_color: String,
    pub description: String,
    pub primary_category: String,
    pub tags: Vec<String>,
}

impl MiniAppManifest {
    pub fn from_app(app: &AppSection) -> Self {
        Self {
            frame: ManifestFrame {
                version: "1".to_string(),
                name: app.name.clone(),
                home_url: app.url.clone(),
                icon_url: app.icon_url.clone(),
                image_url: app.splash_url.clone(),
                button_title: app.button_text.clone(),
                splash_image_url: app.splash_url.clone(),
                splash_background_color: app.splash_background_color.clone(),
                description: app.description.clone(),
                primary_category: "social".to_string(),
                tags: app.tags.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// JSON error response: `{"error": "..."}` with the given status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
