use once_cell::sync::Lazy;
use regex::Regex;

// The three canonical URL shapes; anything else is rejected at validation.
static WATCH_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(?:www\.)?youtube\.com/watch\?(?:[^#]*&)?v=([A-Za-z0-9_-]{6,20})")
        .expect("invalid watch URL pattern")
});
static SHORT_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(?:www\.)?youtu\.be/([A-Za-z0-9_-]{6,20})")
        .expect("invalid short URL pattern")
});
static EMBED_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(?:www\.)?youtube\.com/embed/([A-Za-z0-9_-]{6,20})")
        .expect("invalid embed URL pattern")
});

/// Extracts the video id from a watch, youtu.be, or embed URL.
pub fn extract_video_id(url: &str) -> Option<&str> {
    [&*WATCH_URL, &*SHORT_URL, &*EMBED_URL]
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub fn embed_url(video_id: &str) -> String {
    format!("https://www.youtube.com/embed/{}", video_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_urls_are_recognized() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_video_id("https://youtube.com/watch?list=PL123&v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn short_urls_are_recognized() {
        assert_eq!(extract_video_id("https://youtu.be/abc123"), Some("abc123"));
    }

    #[test]
    fn embed_urls_are_recognized() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn other_urls_are_rejected() {
        assert_eq!(extract_video_id("https://example.com/x"), None);
        assert_eq!(extract_video_id("https://vimeo.com/12345678"), None);
        assert_eq!(extract_video_id("not a url"), None);
    }

    #[test]
    fn embed_url_builds_canonical_form() {
        assert_eq!(
            embed_url("dQw4w9WgXcQ"),
            "https://www.youtube.com/embed/dQw4w9WgXcQ"
        );
    }
}
