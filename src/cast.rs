//! Upstream cast payloads as Neynar returns them.
//!
//! Every field is optional: responses differ between endpoints (the user
//! casts endpoint reports `likes_count`, older feed responses carry the full
//! `likes` list) and partially populated casts are common. Defaulting happens
//! here, in the accessors, so the ranking code only ever sees complete values.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::{CastAuthor, Engagement};

/// One page of casts from any of the cast-listing endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CastPage {
    #[serde(default)]
    casts: Option<Vec<RawCast>>,
}

impl CastPage {
    pub fn into_casts(self) -> Vec<RawCast> {
        self.casts.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCast {
    pub hash: Option<String>,
    pub text: Option<String>,
    pub author: Option<RawAuthor>,
    pub reactions: Option<RawReactions>,
    pub replies: Option<RawReplies>,
    pub timestamp: Option<String>,
    pub embeds: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAuthor {
    #[serde(default, deserialize_with = "lenient_count")]
    pub fid: Option<u64>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub pfp_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReactions {
    #[serde(default, deserialize_with = "lenient_count")]
    pub likes_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub recasts_count: Option<u64>,
    pub likes: Option<Vec<Value>>,
    pub recasts: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReplies {
    #[serde(default, deserialize_with = "lenient_count")]
    pub count: Option<u64>,
}

impl RawCast {
    /// True when the cast carries non-whitespace text.
    pub fn has_text(&self) -> bool {
        self.text
            .as_deref()
            .map(|text| !text.trim().is_empty())
            .unwrap_or(false)
    }

    pub fn engagement(&self) -> Engagement {
        let reactions = self.reactions.as_ref();
        let likes = reactions
            .and_then(|reactions| {
                reactions
                    .likes_count
                    .or_else(|| reactions.likes.as_ref().map(|list| list.len() as u64))
            })
            .unwrap_or(0);
        let recasts = reactions
            .and_then(|reactions| {
                reactions
                    .recasts_count
                    .or_else(|| reactions.recasts.as_ref().map(|list| list.len() as u64))
            })
            .unwrap_or(0);
        let replies = self
            .replies
            .as_ref()
            .and_then(|replies| replies.count)
            .unwrap_or(0);

        Engagement {
            likes,
            recasts,
            replies,
        }
    }

    pub fn author(&self) -> CastAuthor {
        let author = self.author.clone().unwrap_or_default();
        let username = author.username.unwrap_or_default();
        let name = author
            .display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| username.clone());
        CastAuthor {
            name,
            username,
            avatar: author.pfp_url,
        }
    }
}

/// Accepts integers, non-negative floats and numeric strings; anything else
/// (negative numbers, objects, garbage strings) reads as absent.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.is_finite() && *float >= 0.0)
                .map(|float| float.trunc() as u64)
        }),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    }))
}
