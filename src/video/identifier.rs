/// Platform identifier extraction and embed/thumbnail URL construction
use crate::error::Result;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;
use url::Url;

/// Minimum length accepted for a bare trailing path segment
const MIN_BARE_ID_LEN: usize = 10;

fn shorts_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"/shorts/([a-zA-Z0-9_-]+)").ok())
        .as_ref()
}

fn embed_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"/embed/([a-zA-Z0-9_-]+)").ok())
        .as_ref()
}

/// Extract the video identifier from a watch, shorts or embed URL.
///
/// Resolution order, first match wins:
/// 1. `v` query parameter
/// 2. segment after `/shorts/`
/// 3. segment after `/embed/`
/// 4. last non-empty path segment, if at least 10 characters long
///
/// Returns `None` when the URL does not parse or nothing matches.
pub fn extract_id(url: &str) -> Option<String> {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("Error extracting video ID from {}: {}", url, e);
            return None;
        }
    };

    if let Some((_, v)) = parsed.query_pairs().find(|(key, _)| key == "v") {
        if !v.is_empty() {
            return Some(v.into_owned());
        }
    }

    let path = parsed.path();

    for pattern in [shorts_pattern(), embed_pattern()].into_iter().flatten() {
        if let Some(captures) = pattern.captures(path) {
            return Some(captures[1].to_string());
        }
    }

    path.split('/')
        .rev()
        .find(|part| !part.is_empty())
        .filter(|candidate| candidate.chars().count() >= MIN_BARE_ID_LEN)
        .map(str::to_string)
}

/// Build the embed URL for an identifier.
///
/// `enablejsapi=1` and `start` are always present, `mute=1` only when muted.
/// Autoplay is never part of the URL; it is driven over the command channel.
pub fn embed_url(embed_base: &str, video_id: &str, start_offset: f64, mute: bool) -> Result<Url> {
    let mut url = Url::parse(&format!("{}/{}", embed_base.trim_end_matches('/'), video_id))?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("enablejsapi", "1");
        query.append_pair("start", &start_offset.to_string());
        if mute {
            query.append_pair("mute", "1");
        }
    }
    Ok(url)
}

/// Thumbnail URL shown in listings
pub fn thumbnail_url(thumbnail_base: &str, video_id: &str) -> String {
    format!("{}/{}/hqdefault.jpg", thumbnail_base.trim_end_matches('/'), video_id)
}
