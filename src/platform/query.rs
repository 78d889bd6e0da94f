//! Page URL query parsing

/// Raw (still percent-encoded) value of `key` in a `location.search` string.
///
/// The leading `?` is optional; the first occurrence wins and a key without
/// `=` reads as an empty value.
pub fn query_param<'a>(search: &'a str, key: &str) -> Option<&'a str> {
    search
        .trim_start_matches('?')
        .split('&')
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(k, _)| *k == key)
        .map(|(_, value)| value)
}
