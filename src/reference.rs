use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CANONICAL_ID: Regex = Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("compile canonical ID pattern");
    static ref LINK_PATTERNS: Vec<Regex> = [
        r"[?&]v=([A-Za-z0-9_-]{11})",
        r"youtu\.be/([A-Za-z0-9_-]{11})",
        r"/embed/([A-Za-z0-9_-]{11})",
        r"/shorts/([A-Za-z0-9_-]{11})",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("compile video link pattern"))
    .collect();
}

/// Reduces a free-form video reference (a bare ID or a watch, short,
/// embed or shorts link) to its canonical 11-character video ID.
/// Anything unrecognized is returned unchanged.
///
/// ```
/// use course_admin::reference::normalize;
/// assert_eq!(normalize("https://youtu.be/dQw4w9WgXcQ?t=42"), "dQw4w9WgXcQ");
/// assert_eq!(normalize("not a video"), "not a video");
/// ```
pub fn normalize(input: &str) -> String {
    if is_canonical(input) {
        return input.to_owned();
    }

    LINK_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(input))
        .and_then(|captures| captures.get(1))
        .map_or_else(|| input.to_owned(), |id| id.as_str().to_owned())
}

/// Whether `input` is already a canonical video ID.
pub fn is_canonical(input: &str) -> bool {
    CANONICAL_ID.is_match(input)
}
