//! Presentation-independent view of a ranking result.
//!
//! Everything here is derived data: the CLI prints it and the HTTP API
//! returns it, but neither needs to know how casts were fetched or ranked.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::OnceLock;

use crate::{CastAuthor, Engagement, RankedCast, TopCastsReport};

const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyState {
    NeverCast,
    FewCasts,
    LowEngagement,
    NoEngagement,
}

impl EmptyState {
    /// Picks the encouragement shown when nothing could be ranked, based on
    /// how many casts the user has at all.
    pub fn classify(casts_fetched: usize) -> Self {
        match casts_fetched {
            0 => EmptyState::NeverCast,
            1..=5 => EmptyState::FewCasts,
            count if count >= 10 => EmptyState::LowEngagement,
            _ => EmptyState::NoEngagement,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            EmptyState::NeverCast => "🤔",
            EmptyState::FewCasts => "📈",
            EmptyState::LowEngagement | EmptyState::NoEngagement => "😅",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            EmptyState::NeverCast => "Mehhh be active more!",
            EmptyState::FewCasts => "Cast more fren, you can do it!",
            EmptyState::LowEngagement => "Need more engagement, fren!",
            EmptyState::NoEngagement => "No engagement yet",
        }
    }

    pub fn message(self, username: Option<&str>, casts_fetched: usize) -> String {
        match self {
            EmptyState::NeverCast => format!(
                "Hey @{}, looks like you haven't cast yet. Time to share your thoughts with the world!",
                username.filter(|name| !name.is_empty()).unwrap_or("anon")
            ),
            EmptyState::FewCasts => format!(
                "You've got {} cast{} but need more activity to see analytics. Keep casting and watch your engagement grow!",
                casts_fetched,
                if casts_fetched == 1 { "" } else { "s" }
            ),
            EmptyState::LowEngagement => format!(
                "You've posted {} casts but they're not getting much love. Try engaging with others first, use trending topics, or post when your audience is most active!",
                casts_fetched
            ),
            EmptyState::NoEngagement => "Your casts need some love! Try posting at peak times or engaging with the community first.".to_string(),
        }
    }

    pub fn tip(self) -> Option<&'static str> {
        match self {
            EmptyState::NeverCast => Some(
                "Start with introducing yourself, share your interests, or comment on trending topics!",
            ),
            EmptyState::FewCasts => Some(
                "Post regularly, engage with others, and your analytics will start showing up soon.",
            ),
            EmptyState::LowEngagement => Some(
                "Reply to trending casts, ask questions, share hot takes, and engage authentically with the community!",
            ),
            EmptyState::NoEngagement => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyStateView {
    pub kind: EmptyState,
    pub emoji: String,
    pub title: String,
    pub message: String,
    pub tip: Option<String>,
}

impl EmptyStateView {
    pub fn new(casts_fetched: usize, username: Option<&str>) -> Self {
        let kind = EmptyState::classify(casts_fetched);
        Self {
            kind,
            emoji: kind.emoji().to_string(),
            title: kind.title().to_string(),
            message: kind.message(username, casts_fetched),
            tip: kind.tip().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaItem {
    Image { url: String },
    Video { url: String, content_type: String },
    Youtube { url: String },
}

/// Pulls displayable media out of cast embeds. Embeds come in several
/// shapes; the first matching rule wins for each embed.
pub fn extract_media(embeds: &[Value]) -> Vec<MediaItem> {
    let mut images = Vec::new();
    let mut videos = Vec::new();

    for embed in embeds {
        let url = embed.get("url").and_then(Value::as_str);
        let content_type = embed
            .get("metadata")
            .and_then(|metadata| metadata.get("content_type"))
            .and_then(Value::as_str);

        match (url, content_type) {
            (Some(url), Some(kind)) if kind.starts_with("image/") => {
                images.push(MediaItem::Image {
                    url: url.to_string(),
                });
                continue;
            }
            (Some(url), Some(kind)) if kind.starts_with("video/") => {
                videos.push(MediaItem::Video {
                    url: url.to_string(),
                    content_type: kind.to_string(),
                });
                continue;
            }
            (Some(url), Some(kind)) if kind.starts_with("text/html") && is_youtube_url(url) => {
                if let Some(embed_url) = youtube_embed_url(url) {
                    videos.push(MediaItem::Youtube { url: embed_url });
                }
                continue;
            }
            _ => {}
        }

        if let (Some("image"), Some(url)) = (embed.get("type").and_then(Value::as_str), url) {
            images.push(MediaItem::Image {
                url: url.to_string(),
            });
        } else if let Some(list) = embed.get("images").and_then(Value::as_array) {
            images.extend(list.iter().filter_map(image_from_value));
        } else if let Some(url) = url.filter(|url| looks_like_image(url)) {
            images.push(MediaItem::Image {
                url: url.to_string(),
            });
        } else if let Some(url) = embed.get("image").and_then(Value::as_str) {
            images.push(MediaItem::Image {
                url: url.to_string(),
            });
        }
    }

    images.extend(videos);
    images
}

fn image_from_value(value: &Value) -> Option<MediaItem> {
    let url = value
        .as_str()
        .or_else(|| value.get("url").and_then(Value::as_str))?;
    Some(MediaItem::Image {
        url: url.to_string(),
    })
}

fn looks_like_image(url: &str) -> bool {
    let lower = url.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.contains(ext))
}

fn is_youtube_url(url: &str) -> bool {
    url.contains("youtube.com") || url.contains("youtu.be")
}

fn youtube_id_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"(?i)(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?)/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#,
        )
        .expect("youtube id pattern is valid")
    })
}

fn youtube_link_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\s*https?://(?:www\.)?(?:youtube\.com/watch\?v=|youtu\.be/)\S*")
            .expect("youtube link pattern is valid")
    })
}

pub fn youtube_embed_url(url: &str) -> Option<String> {
    youtube_id_regex()
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|id| format!("https://www.youtube.com/embed/{}", id.as_str()))
}

/// Cast text without YouTube links, which are shown as embedded video.
pub fn clean_cast_text(text: &str) -> String {
    youtube_link_regex().replace_all(text, "").trim().to_string()
}

pub fn warpcast_url(hash: &str) -> String {
    format!("https://warpcast.com/~/conversations/{}", hash)
}

fn parse_timestamp(timestamp: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(timestamp.trim())
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// "Just now", "5h ago" or "3d ago"; `None` when the timestamp is unreadable.
pub fn relative_time(timestamp: &str, now: DateTime<Utc>) -> Option<String> {
    let posted = parse_timestamp(timestamp)?;
    let hours = (now - posted).num_hours();
    let label = if hours < 1 {
        "Just now".to_string()
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else {
        format!("{}d ago", hours / 24)
    };
    Some(label)
}

/// e.g. "Mar 5, 2025, 02:30 PM" (UTC).
pub fn full_timestamp(timestamp: &str) -> Option<String> {
    let posted = parse_timestamp(timestamp)?;
    Some(posted.format("%b %-d, %Y, %I:%M %p").to_string())
}

pub fn format_compact(value: u64) -> String {
    if value >= 1_000_000 {
        format!("{:.1}M", value as f64 / 1_000_000.0)
    } else if value >= 1_000 {
        format!("{:.1}K", value as f64 / 1_000.0)
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CastEntry {
    pub rank: usize,
    pub text: String,
    pub engagement: Engagement,
    pub total_engagement: u64,
    pub posted: Option<String>,
    pub posted_at: Option<String>,
    pub url: Option<String>,
    pub media: Vec<MediaItem>,
}

impl CastEntry {
    pub fn from_ranked(cast: &RankedCast, now: DateTime<Utc>) -> Self {
        Self {
            rank: cast.rank,
            text: clean_cast_text(&cast.text),
            engagement: cast.engagement,
            total_engagement: cast.total_engagement,
            posted: relative_time(&cast.timestamp, now),
            posted_at: full_timestamp(&cast.timestamp),
            url: Some(cast.hash.as_str())
                .filter(|hash| !hash.is_empty())
                .map(warpcast_url),
            media: extract_media(&cast.embeds),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub owner: Option<CastAuthor>,
    pub entries: Vec<CastEntry>,
    pub total_engagement: u64,
    pub casts_fetched: usize,
    pub empty_state: Option<EmptyStateView>,
}

impl DashboardView {
    /// `username` addresses the empty-state message when no cast names the
    /// owner.
    pub fn build(report: &TopCastsReport, username: Option<&str>, now: DateTime<Utc>) -> Self {
        let owner = report.casts.first().map(|cast| cast.author.clone());
        let entries: Vec<CastEntry> = report
            .casts
            .iter()
            .map(|cast| CastEntry::from_ranked(cast, now))
            .collect();
        let empty_state = if entries.is_empty() {
            Some(EmptyStateView::new(report.casts_fetched, username))
        } else {
            None
        };

        Self {
            owner,
            entries,
            total_engagement: report.total_engagement,
            casts_fetched: report.casts_fetched,
            empty_state,
        }
    }
}
