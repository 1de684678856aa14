pub mod api;
pub mod cast;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod neynar;
pub mod ranking;
pub mod retry;
pub mod server;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::cast::RawCast;
use crate::neynar::{CastSource, NeynarClient};
use crate::ranking::RankingPipeline;

pub use error::{Error, Result};

/// Number of casts shown on the dashboard.
pub const DEFAULT_TOP_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastAuthor {
    pub name: String,
    pub username: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub likes: u64,
    pub recasts: u64,
    pub replies: u64,
}

/// A cast with its engagement total and its position in one ranking result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCast {
    pub text: String,
    pub author: CastAuthor,
    pub engagement: Engagement,
    pub timestamp: String,
    pub total_engagement: u64,
    pub rank: usize,
    pub hash: String,
    pub embeds: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCastsReport {
    pub fid: u64,
    pub casts: Vec<RankedCast>,
    /// Casts returned upstream, before filtering.
    pub casts_fetched: usize,
    pub total_engagement: u64,
}

impl TopCastsReport {
    pub fn new(fid: u64, casts: Vec<RankedCast>, casts_fetched: usize) -> Self {
        let total_engagement = casts
            .iter()
            .fold(0u64, |sum, cast| sum.saturating_add(cast.total_engagement));
        Self {
            fid,
            casts,
            casts_fetched,
            total_engagement,
        }
    }
}

/// Ranks `casts` by engagement and keeps the top `limit`.
pub fn rank_casts(casts: Vec<RawCast>, limit: usize) -> Vec<RankedCast> {
    RankingPipeline::with_limit(limit).rank(casts)
}

pub async fn fetch_top_casts(
    client: &NeynarClient,
    source: CastSource,
    fid: u64,
    pipeline: &RankingPipeline,
) -> Result<TopCastsReport> {
    let casts = client.fetch_casts(source, fid).await?;
    let casts_fetched = casts.len();
    let ranked = pipeline.rank(casts);
    info!(
        fid,
        source = source.label(),
        fetched = casts_fetched,
        ranked = ranked.len(),
        "ranked casts"
    );
    Ok(TopCastsReport::new(fid, ranked, casts_fetched))
}

pub fn format_number(value: u64) -> String {
    let mut chars: Vec<char> = value.to_string().chars().collect();
    let mut result = String::new();
    let mut count = 0usize;

    while let Some(ch) = chars.pop() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(ch);
        count += 1;
    }

    result.chars().rev().collect()
}
