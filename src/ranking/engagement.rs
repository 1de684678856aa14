use crate::Engagement;

/// Unweighted engagement total: likes + recasts + replies.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngagementScorer;

impl EngagementScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, engagement: &Engagement) -> u64 {
        engagement
            .likes
            .saturating_add(engagement.recasts)
            .saturating_add(engagement.replies)
    }
}
