use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::OffsetConfig;
use crate::error::{PlayerError, Result};

pub mod identifier;

pub use identifier::{embed_url, extract_id, thumbnail_url};

/// A catalog entry for a single exercise video.
///
/// Offsets and `mute` stay as raw JSON so that malformed catalog values fall
/// back to defaults instead of rejecting the whole catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoDescriptor {
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_offset: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_offset: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mute: Option<Value>,
}

/// Playback parameters resolved from a descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVideo {
    pub video_id: String,
    pub title: String,
    pub start_offset: f64,
    pub end_offset: f64,
    pub mute: bool,
}

impl VideoDescriptor {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            start_offset: None,
            end_offset: None,
            mute: None,
        }
    }

    pub fn with_start_offset(mut self, seconds: f64) -> Self {
        self.start_offset = Some(Value::from(seconds));
        self
    }

    pub fn with_end_offset(mut self, seconds: f64) -> Self {
        self.end_offset = Some(Value::from(seconds));
        self
    }

    pub fn with_mute(mut self, mute: bool) -> Self {
        self.mute = Some(Value::Bool(mute));
        self
    }

    /// Identifier of this video on the platform, if the URL yields one
    pub fn video_id(&self) -> Option<String> {
        extract_id(&self.url)
    }

    pub fn resolve_start_offset(&self, default: f64) -> f64 {
        resolve_offset(self.start_offset.as_ref(), default)
    }

    pub fn resolve_end_offset(&self, default: f64) -> f64 {
        resolve_offset(self.end_offset.as_ref(), default)
    }

    /// Muted only when the catalog says exactly `true`
    pub fn should_mute(&self) -> bool {
        matches!(self.mute, Some(Value::Bool(true)))
    }

    /// Resolve identifier, offsets and mute against the configured defaults
    pub fn resolve(&self, offsets: &OffsetConfig) -> Result<ResolvedVideo> {
        let video_id = self
            .video_id()
            .ok_or_else(|| PlayerError::UnresolvableVideo(self.url.clone()))?;

        Ok(ResolvedVideo {
            video_id,
            title: self.title.clone(),
            start_offset: self.resolve_start_offset(offsets.default_start_offset),
            end_offset: self.resolve_end_offset(offsets.default_end_offset),
            mute: self.should_mute(),
        })
    }
}

/// Numbers and numeric strings are accepted; anything negative, non-finite or
/// non-numeric falls back to `default`.
fn resolve_offset(raw: Option<&Value>, default: f64) -> f64 {
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed
        .filter(|offset| offset.is_finite() && *offset >= 0.0)
        .unwrap_or(default)
}

/// Two catalog entries are the same video when both URL and title match
pub fn same_video(a: &VideoDescriptor, b: &VideoDescriptor) -> bool {
    a.url == b.url && a.title == b.title
}

/// Find the first video whose URL resolves to `video_id`
pub fn find_video_by_id<'a>(videos: &'a [VideoDescriptor], video_id: &str) -> Option<&'a VideoDescriptor> {
    if video_id.is_empty() {
        return None;
    }
    videos
        .iter()
        .find(|video| video.video_id().as_deref() == Some(video_id))
}
