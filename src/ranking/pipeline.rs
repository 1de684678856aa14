use serde_json::Value;
use tracing::debug;

use crate::cast::RawCast;
use crate::ranking::{EngagementScorer, TextFilter};
use crate::{CastAuthor, Engagement, RankedCast};

/// A cast after normalization and scoring, before it has a rank.
#[derive(Debug, Clone)]
pub struct ScoredCast {
    pub hash: String,
    pub text: String,
    pub author: CastAuthor,
    pub engagement: Engagement,
    pub timestamp: String,
    pub embeds: Vec<Value>,
    pub total_engagement: u64,
}

impl ScoredCast {
    pub fn from_raw(cast: RawCast) -> Self {
        let engagement = cast.engagement();
        let author = cast.author();
        Self {
            hash: cast.hash.unwrap_or_default(),
            text: cast.text.unwrap_or_default(),
            author,
            engagement,
            timestamp: cast.timestamp.unwrap_or_default(),
            embeds: cast.embeds.unwrap_or_default(),
            total_engagement: 0,
        }
    }

    fn into_ranked(self, rank: usize) -> RankedCast {
        RankedCast {
            text: self.text,
            author: self.author,
            engagement: self.engagement,
            timestamp: self.timestamp,
            total_engagement: self.total_engagement,
            rank,
            hash: self.hash,
            embeds: self.embeds,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RankingPipeline {
    filter: TextFilter,
    scorer: EngagementScorer,
    limit: usize,
}

impl RankingPipeline {
    pub fn new(filter: TextFilter, scorer: EngagementScorer, limit: usize) -> Self {
        Self {
            filter,
            scorer,
            limit,
        }
    }

    pub fn with_limit(limit: usize) -> Self {
        Self::new(TextFilter::new(), EngagementScorer::new(), limit)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Same pipeline with a different cut-off.
    pub fn limited_to(&self, limit: usize) -> Self {
        Self {
            limit,
            ..self.clone()
        }
    }

    pub fn score(&self, casts: Vec<RawCast>) -> Vec<ScoredCast> {
        let (kept, dropped) = self.filter.apply(casts);
        if dropped > 0 {
            debug!(dropped, kept = kept.len(), "dropped casts without text");
        }

        kept.into_iter()
            .map(|cast| {
                let mut scored = ScoredCast::from_raw(cast);
                scored.total_engagement = self.scorer.score(&scored.engagement);
                scored
            })
            .collect()
    }

    /// Filter, score, order by total engagement (ties keep input order),
    /// keep the top `limit` and number them from 1.
    pub fn rank(&self, casts: Vec<RawCast>) -> Vec<RankedCast> {
        let mut scored = self.score(casts);

        // slice::sort_by is stable
        scored.sort_by(|a, b| b.total_engagement.cmp(&a.total_engagement));
        scored.truncate(self.limit);

        scored
            .into_iter()
            .enumerate()
            .map(|(index, cast)| cast.into_ranked(index + 1))
            .collect()
    }
}

impl Default for RankingPipeline {
    fn default() -> Self {
        Self::with_limit(crate::DEFAULT_TOP_LIMIT)
    }
}
