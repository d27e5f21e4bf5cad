//! Query string parsing.

use indexmap::IndexMap;

/// Parsed query parameters.
///
/// A key written without `=` maps to `None`.
pub type Query = IndexMap<String, Option<String>>;

/// Returns the part of `url` after the first `?`, if any.
#[must_use]
pub fn query_string(url: &str) -> Option<&str> {
    url.split_once('?').map(|(_, query)| query)
}

/// Parses the query string of `url`.
///
/// Pairs are split on `&`, each pair on its first `=`. Pairs with an empty
/// key are skipped and the last value wins for repeated keys. Keys and
/// values are kept exactly as written.
#[must_use]
pub fn parse_query(url: &str) -> Query {
    let mut query = Query::new();
    let Some(raw) = query_string(url) else {
        return query;
    };
    for pair in raw.split('&') {
        let (key, value) = match pair.split_once('=') {
            Some((key, value)) => (key, Some(value)),
            None => (pair, None),
        };
        if key.is_empty() {
            continue;
        }
        query.insert(key.to_string(), value.map(String::from));
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_query() {
        assert!(parse_query("/users").is_empty());
        assert!(parse_query("/users?").is_empty());
    }

    #[test]
    fn test_pairs_and_bare_keys() {
        let query = parse_query("/search?q=rust&page=2&verbose");
        assert_eq!(query.get("q"), Some(&Some("rust".to_string())));
        assert_eq!(query.get("page"), Some(&Some("2".to_string())));
        assert_eq!(query.get("verbose"), Some(&None));
    }

    #[test]
    fn test_empty_key_skipped() {
        let query = parse_query("/?=orphan&a=1&&");
        assert_eq!(query.len(), 1);
        assert_eq!(query.get("a"), Some(&Some("1".to_string())));
    }

    #[test]
    fn test_last_value_wins() {
        let query = parse_query("/?a=1&b=2&a=3");
        assert_eq!(query.get("a"), Some(&Some("3".to_string())));
        let keys: Vec<_> = query.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_splits_on_first_separators() {
        let query = parse_query("/?expr=a=b&next=x?y");
        assert_eq!(query.get("expr"), Some(&Some("a=b".to_string())));
        assert_eq!(query.get("next"), Some(&Some("x?y".to_string())));
    }

    #[test]
    fn test_pairs_kept_raw() {
        let query = parse_query("/?a%3Db=1&name=John%20Doe&city=New+York");
        assert_eq!(query.get("a%3Db"), Some(&Some("1".to_string())));
        assert!(!query.contains_key("a=b"));
        assert_eq!(query.get("name"), Some(&Some("John%20Doe".to_string())));
        assert_eq!(query.get("city"), Some(&Some("New+York".to_string())));
    }
}
