//! Feature selection encoded in the URL fragment (`#f=<featureId>`).

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::surface::Navigator;

/// Everything but the unreserved URI characters.
const FRAGMENT_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Reads `key` from a query-string shaped fragment.
///
/// A leading `#` is ignored and keys and values are percent-decoded; `+` is
/// kept as is. An empty value counts as no selection.
pub fn parse_selection(fragment: &str, key: &str) -> Option<String> {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    fragment
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(name, _)| decode(name) == key)
        .map(|(_, value)| decode(value))
        .filter(|value| !value.is_empty())
}

/// Fragment selecting `feature_id`.
pub fn selection_fragment(key: &str, feature_id: &str) -> String {
    format!("{key}={}", utf8_percent_encode(feature_id, FRAGMENT_VALUE))
}

/// Marker click handler: rewrites only the fragment, keeping the current path.
pub fn select_feature(navigator: &dyn Navigator, key: &str, feature_id: &str) {
    navigator.set_fragment(selection_fragment(key, feature_id));
}

fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_selected_feature() {
        assert_eq!(parse_selection("f=f2", "f").as_deref(), Some("f2"));
        assert_eq!(parse_selection("#z=1&f=abc", "f").as_deref(), Some("abc"));
    }

    #[test]
    fn absent_or_empty_means_no_selection() {
        assert_eq!(parse_selection("", "f"), None);
        assert_eq!(parse_selection("g=1", "f"), None);
        assert_eq!(parse_selection("f=", "f"), None);
        assert_eq!(parse_selection("f", "f"), None);
    }

    #[test]
    fn values_are_percent_decoded() {
        assert_eq!(parse_selection("f=a%2Fb%20c", "f").as_deref(), Some("a/b c"));
        assert_eq!(parse_selection("f=a+b", "f").as_deref(), Some("a+b"));
        assert_eq!(parse_selection("f=100%", "f").as_deref(), Some("100%"));
    }

    #[test]
    fn fragment_round_trips() {
        let fragment = selection_fragment("f", "tree/42");
        assert_eq!(fragment, "f=tree%2F42");
        assert_eq!(parse_selection(&fragment, "f").as_deref(), Some("tree/42"));

        let fragment = selection_fragment("f", "a+b c");
        assert_eq!(fragment, "f=a%2Bb%20c");
        assert_eq!(parse_selection(&fragment, "f").as_deref(), Some("a+b c"));
    }
}
