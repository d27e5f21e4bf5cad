//! Header storage and request-header rules.

use indexmap::IndexMap;

/// Request headers a script may never set.
const UNSAFE_HEADERS: [&str; 17] = [
    "accept-charset",
    "accept-encoding",
    "connection",
    "content-length",
    "cookie",
    "cookie2",
    "content-transfer-encoding",
    "date",
    "expect",
    "host",
    "keep-alive",
    "referer",
    "te",
    "transfer-encoding",
    "upgrade",
    "user-agent",
    "via",
];

/// Response headers hidden from `getResponseHeader`/`getAllResponseHeaders`.
const HIDDEN_RESPONSE_HEADERS: [&str; 2] = ["set-cookie", "set-cookie2"];

/// Returns true if `name` is controlled by the transport and may not be set.
///
/// Matches the fixed blocklist case-insensitively, plus any name starting
/// with `Proxy-` or `Sec-`.
#[must_use]
pub fn is_unsafe_header(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    UNSAFE_HEADERS.contains(&lower.as_str())
        || lower.starts_with("proxy-")
        || lower.starts_with("sec-")
}

/// Returns true if a response header is never exposed to scripts.
#[must_use]
pub fn is_hidden_response_header(name: &str) -> bool {
    HIDDEN_RESPONSE_HEADERS
        .iter()
        .any(|hidden| hidden.eq_ignore_ascii_case(name))
}

/// Ordered header list with case-insensitive lookup.
///
/// Names keep the casing of their first insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: IndexMap<String, String>,
}

impl Headers {
    /// Creates an empty header list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .keys()
            .position(|key| key.eq_ignore_ascii_case(name))
    }

    /// Sets `name` to `value`, replacing any existing value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(index) => {
                if let Some((_, existing)) = self.entries.get_index_mut(index) {
                    *existing = value;
                }
            }
            None => {
                self.entries.insert(name, value);
            }
        }
    }

    /// Adds `value` under `name`, joining with `", "` if already present.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(index) => {
                if let Some((_, existing)) = self.entries.get_index_mut(index) {
                    existing.push_str(", ");
                    existing.push_str(&value);
                }
            }
            None => {
                self.entries.insert(name, value);
            }
        }
    }

    /// Returns the value for `name`, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name)
            .and_then(|index| self.entries.get_index(index))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the stored name and value for `name`, ignoring case.
    #[must_use]
    pub fn get_entry(&self, name: &str) -> Option<(&str, &str)> {
        self.position(name)
            .and_then(|index| self.entries.get_index(index))
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Returns true if `name` is present, ignoring case.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Removes `name`, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.position(name)?;
        self.entries.shift_remove_index(index).map(|(_, value)| value)
    }

    /// Returns the number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Headers {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for Headers {
    fn from(entries: Vec<(K, V)>) -> Self {
        entries.into_iter().collect()
    }
}

impl IntoIterator for Headers {
    type Item = (String, String);
    type IntoIter = indexmap::map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
