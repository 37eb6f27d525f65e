use regex::{Regex, RegexBuilder};

/// Case-insensitive matcher for the applied search keyword, mirroring how the
/// collection filter compares text.
pub fn build_highlight_regex(keyword: &str) -> Option<Regex> {
    let trimmed = keyword.trim();
    if trimmed.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(trimmed))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Splits `text` into `(segment, is_match)` runs for the given matcher.
pub fn split_matches<'t>(text: &'t str, regex: Option<&Regex>) -> Vec<(&'t str, bool)> {
    let Some(regex) = regex else {
        return vec![(text, false)];
    };
    let mut segments = Vec::new();
    let mut last = 0;
    for found in regex.find_iter(text) {
        if found.start() > last {
            segments.push((&text[last..found.start()], false));
        }
        segments.push((found.as_str(), true));
        last = found.end();
    }
    if last < text.len() || segments.is_empty() {
        segments.push((&text[last..], false));
    }
    segments
}
