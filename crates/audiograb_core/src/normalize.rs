use percent_encoding::percent_decode_str;
use url::{form_urlencoded, Url};

/// Host used for every canonical watch URL.
pub const CANONICAL_HOST: &str = "www.youtube.com";

const WATCH_HOSTS: &[&str] = &["youtube.com", "www.youtube.com", "m.youtube.com"];
const SHORT_LINK_HOST: &str = "youtu.be";

/// Canonicalize a video-sharing URL to `https://www.youtube.com/watch?v=<id>`.
///
/// Watch-page URLs keep only their `v` parameter and short links are expanded.
/// Anything that does not parse, or parses but is not a recognized video URL,
/// is returned exactly as given.
pub fn normalize_video_url(input: &str) -> String {
    let Ok(parsed) = Url::parse(input) else {
        return input.to_string();
    };

    match video_id(&parsed) {
        Some(id) => canonical_watch_url(&id),
        None => input.to_string(),
    }
}

fn video_id(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    if WATCH_HOSTS.contains(&host) {
        if url.path() != "/watch" {
            return None;
        }
        return url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())
            .filter(|id| !id.is_empty());
    }
    if host == SHORT_LINK_HOST {
        let segment = url.path_segments()?.find(|segment| !segment.is_empty())?;
        let id = percent_decode_str(segment).decode_utf8_lossy().into_owned();
        return Some(id).filter(|id| !id.is_empty());
    }
    None
}

fn canonical_watch_url(id: &str) -> String {
    // Form-encode so that re-parsing yields the same id (keeps normalization idempotent).
    let encoded: String = form_urlencoded::byte_serialize(id.as_bytes()).collect();
    format!("https://{CANONICAL_HOST}/watch?v={encoded}")
}
