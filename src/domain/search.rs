//! Case-insensitive substring search over feature labels.
//!
//! Search is independent of the tree shape: it runs over the flat feature
//! list and returns ids in input order.

use crate::domain::Feature;

/// Pre-lowercased search haystacks for a feature list.
#[derive(Debug, Clone)]
pub struct SearchIndex<'a> {
    entries: Vec<(&'a str, String)>,
}

impl<'a> SearchIndex<'a> {
    /// Indexes the display label of every feature (the id when the label is
    /// empty).
    #[must_use]
    pub fn new(features: &'a [Feature]) -> Self {
        let entries = features
            .iter()
            .map(|feature| (feature.id.as_str(), feature.display_label().to_lowercase()))
            .collect();
        Self { entries }
    }

    /// Returns the ids of all features whose haystack contains `query`.
    ///
    /// The query is trimmed and lowercased first. An empty query matches
    /// nothing.
    #[must_use]
    pub fn query(&self, query: &str) -> Vec<&'a str> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.entries
            .iter()
            .filter(|(_, haystack)| haystack.contains(&needle))
            .map(|&(id, _)| id)
            .collect()
    }

    /// Number of indexed features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One-shot search; see [`SearchIndex::query`].
#[must_use]
pub fn search<'a>(features: &'a [Feature], query: &str) -> Vec<&'a str> {
    SearchIndex::new(features).query(query)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn features() -> Vec<Feature> {
        vec![
            Feature::new("root").with_label("Car"),
            Feature::new("engine").with_label("Engine"),
            Feature::new("electric").with_label("Electric Engine"),
            Feature::new("gps").with_label(""),
        ]
    }

    #[test]
    fn empty_feature_list_matches_nothing() {
        assert!(search(&[], "x").is_empty());
    }

    #[test_case(""; "empty")]
    #[test_case("   "; "whitespace only")]
    fn blank_query_matches_nothing(query: &str) {
        assert!(search(&features(), query).is_empty());
    }

    #[test]
    fn search_is_case_insensitive() {
        let features = vec![Feature::new("a").with_label("Hello")];
        assert_eq!(search(&features, "HELLO"), ["a"]);
    }

    #[test_case("engine", &["engine", "electric"]; "matches preserve input order")]
    #[test_case("  ENG ", &["engine", "electric"]; "query is trimmed")]
    #[test_case("gps", &["gps"]; "falls back to id for empty label")]
    #[test_case("car", &["root"]; "label not id")]
    #[test_case("root", &[]; "id ignored when label present")]
    #[test_case("diesel", &[]; "no match")]
    fn substring_matches(query: &str, expected: &[&str]) {
        let features = features();
        assert_eq!(search(&features, query), expected);
    }

    #[test]
    fn index_can_be_reused() {
        let features = features();
        let index = SearchIndex::new(&features);

        assert_eq!(index.len(), 4);
        assert_eq!(index.query("electric"), ["electric"]);
        assert_eq!(index.query("car"), ["root"]);
    }
}
