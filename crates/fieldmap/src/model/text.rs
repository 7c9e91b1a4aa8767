use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Text keyed by language code (`"en"`, `"pt"`, ...).
///
/// Lookups never fail: a language with no entry reads as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedText(BTreeMap<String, String>);

impl LocalizedText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single-language text.
    pub fn single(lang: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new().with(lang, value)
    }

    pub fn get(&self, lang: &str) -> &str {
        self.0.get(lang).map(String::as_str).unwrap_or("")
    }

    /// Returns a copy with `lang` set to `value`.
    pub fn with(&self, lang: impl Into<String>, value: impl Into<String>) -> Self {
        let mut entries = self.0.clone();
        entries.insert(lang.into(), value.into());
        Self(entries)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(lang, value)| (lang.as_str(), value.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for LocalizedText
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(lang, value)| (lang.into(), value.into()))
                .collect(),
        )
    }
}
