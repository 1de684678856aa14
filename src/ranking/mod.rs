pub mod engagement;
pub mod filter;
pub mod pipeline;

pub use engagement::EngagementScorer;
pub use filter::TextFilter;
pub use pipeline::{RankingPipeline, ScoredCast};
