//! YouTube link extraction from donation comments.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref YOUTUBE_LINK: Option<Regex> = Regex::new(
        r"(?:https?://)?(?:www\.)?(?:youtube\.com/watch\?v=|youtu\.be/)([a-zA-Z0-9_-]+)"
    )
    .ok();
}

/// Extract the video id of the first YouTube link in `text`.
pub fn extract_video_id(text: &str) -> Option<&str> {
    let captures = YOUTUBE_LINK.as_ref()?.captures(text)?;
    captures.get(1).map(|m| m.as_str())
}

/// Extract the first YouTube link in `text` as a canonical watch URL.
pub fn extract_url(text: &str) -> Option<String> {
    extract_video_id(text).map(|id| format!("https://www.youtube.com/watch?v={id}"))
}
