//! Longest-match-first multi-pattern replacement.

use super::MappingError;
use aho_corasick::{AhoCorasick, MatchKind};
use std::collections::BTreeMap;

/// Replaces every old identifier with its new identifier in a single pass.
///
/// Patterns are ordered by descending length (ties broken lexically) and
/// matched leftmost-first, so an identifier that is a prefix of a longer one
/// can never cut the longer one in half.
#[derive(Debug, Clone)]
pub struct Replacer {
    patterns: Vec<String>,
    replacements: Vec<String>,
    automaton: Option<AhoCorasick>,
}

impl Replacer {
    /// Builds a replacer from an old→new mapping.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::Replacer`] if the automaton cannot be built.
    pub fn new(mapping: &BTreeMap<String, String>) -> Result<Self, MappingError> {
        let mut pairs: Vec<(&String, &String)> = mapping
            .iter()
            .filter(|(old, _)| !old.is_empty())
            .collect();
        pairs.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let patterns: Vec<String> = pairs.iter().map(|(old, _)| (*old).clone()).collect();
        let replacements: Vec<String> = pairs.iter().map(|(_, new)| (*new).clone()).collect();

        let automaton = if patterns.is_empty() {
            None
        } else {
            Some(
                AhoCorasick::builder()
                    .match_kind(MatchKind::LeftmostFirst)
                    .build(&patterns)?,
            )
        };

        Ok(Self {
            patterns,
            replacements,
            automaton,
        })
    }

    /// Returns a copy of this replacer with one additional entry.
    ///
    /// An existing entry for `old` is overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::Replacer`] if the automaton cannot be built.
    pub fn with_entry(&self, old: &str, new: &str) -> Result<Self, MappingError> {
        let mut mapping: BTreeMap<String, String> = self
            .patterns
            .iter()
            .cloned()
            .zip(self.replacements.iter().cloned())
            .collect();
        mapping.insert(old.to_string(), new.to_string());
        Self::new(&mapping)
    }

    /// Returns true if there is nothing to replace.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns the number of patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Replaces all occurrences in a string.
    #[must_use]
    pub fn replace(&self, haystack: &str) -> String {
        match &self.automaton {
            Some(automaton) => automaton.replace_all(haystack, &self.replacements),
            None => haystack.to_string(),
        }
    }

    /// Replaces all occurrences in arbitrary bytes.
    #[must_use]
    pub fn replace_bytes(&self, haystack: &[u8]) -> Vec<u8> {
        match &self.automaton {
            Some(automaton) => automaton.replace_all_bytes(haystack, &self.replacements),
            None => haystack.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn longest_identifier_wins() {
        let replacer = Replacer::new(&mapping(&[("a/b", "x"), ("a/b/c", "y")])).unwrap();
        assert_eq!(replacer.replace("a/b/c/d"), "y/d");
        assert_eq!(replacer.replace("a/b/d"), "x/d");
    }

    #[test]
    fn replaces_all_occurrences() {
        let replacer = Replacer::new(&mapping(&[(
            "github.com/old/lib",
            "gitlab.com/new/lib",
        )]))
        .unwrap();
        let text = "see github.com/old/lib and github.com/old/lib/v2";
        assert_eq!(
            replacer.replace(text),
            "see gitlab.com/new/lib and gitlab.com/new/lib/v2"
        );
    }

    #[test]
    fn empty_replacer_is_identity() {
        let replacer = Replacer::new(&BTreeMap::new()).unwrap();
        assert!(replacer.is_empty());
        assert_eq!(replacer.replace("unchanged"), "unchanged");
        assert_eq!(replacer.replace_bytes(b"\xffraw"), b"\xffraw".to_vec());
    }

    #[test]
    fn with_entry_extends_mapping() {
        let replacer = Replacer::new(&mapping(&[("a", "b")])).unwrap();
        let extended = replacer.with_entry("self/module", "new/module").unwrap();
        assert_eq!(extended.len(), 2);
        assert_eq!(extended.replace("a self/module"), "b new/module");
        assert_eq!(replacer.len(), 1);
    }
}
