use lazy_regex::{lazy_regex, Lazy};
use regex::Regex;

/// First `http://` or `https://` run up to the next whitespace.
static RE_URL: Lazy<Regex> = lazy_regex!(r"(?i)https?://\S+");

/// Return the first URL in `text`, if any.
///
/// The match stops at whitespace only, so trailing punctuation stays part
/// of the URL.
pub fn extract_first_url(text: &str) -> Option<&str> {
    RE_URL.find(text).map(|m| m.as_str())
}
