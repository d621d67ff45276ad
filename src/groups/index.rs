//! Word Group Index
//!
//! Parses comma-separated group definitions into dense group ids and a
//! word -> groups membership map.

use hashbrown::HashMap;
use tracing::warn;

/// Dense 0-based group identifier
pub type GroupId = usize;

/// A user-defined set of words scored as one concept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordGroup {
    pub id: GroupId,
    /// Trimmed original definition, used as the output header
    pub label: String,
    /// Distinct member words in definition order
    pub members: Vec<String>,
}

/// Group metadata plus the many-to-many word membership map
#[derive(Debug, Clone, Default)]
pub struct WordGroupIndex {
    groups: Vec<WordGroup>,
    membership: HashMap<String, Vec<GroupId>>,
}

impl WordGroupIndex {
    /// Build the index from raw definitions. Blank definitions are dropped
    /// before ids are assigned.
    pub fn from_definitions<I, S>(definitions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = Self::default();

        for definition in definitions {
            let label = definition.as_ref().trim();
            if label.is_empty() {
                continue;
            }

            let id = index.groups.len();
            let mut members: Vec<String> = Vec::new();

            for word in label.split(',').map(str::trim).filter(|w| !w.is_empty()) {
                if members.iter().any(|m| m == word) {
                    continue;
                }
                members.push(word.to_string());
                index
                    .membership
                    .entry_ref(word)
                    .or_insert_with(Vec::new)
                    .push(id);
            }

            if members.is_empty() {
                warn!("Word group {} ({:?}) contains no words", id, label);
            }

            index.groups.push(WordGroup {
                id,
                label: label.to_string(),
                members,
            });
        }

        index
    }

    /// Groups a word belongs to, if any
    #[inline]
    pub fn groups_of(&self, word: &str) -> Option<&[GroupId]> {
        self.membership.get(word).map(Vec::as_slice)
    }

    /// Check if a word belongs to at least one group
    pub fn contains_word(&self, word: &str) -> bool {
        self.membership.contains_key(word)
    }

    /// All groups in id order
    pub fn groups(&self) -> &[WordGroup] {
        &self.groups
    }

    /// Group by id
    pub fn get(&self, id: GroupId) -> Option<&WordGroup> {
        self.groups.get(id)
    }

    /// Output header labels in id order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.label.as_str())
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if there are no groups
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of distinct words across all groups
    pub fn word_count(&self) -> usize {
        self.membership.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_ids_skip_blank() {
        let index = WordGroupIndex::from_definitions(["king, queen", "", "   ", " man,woman "]);

        assert_eq!(index.len(), 2);
        assert_eq!(index.groups()[0].id, 0);
        assert_eq!(index.groups()[1].id, 1);
        assert_eq!(index.groups()[1].label, "man,woman");
        assert_eq!(index.groups()[1].members, vec!["man", "woman"]);
    }

    #[test]
    fn test_labels_are_trimmed_definitions() {
        let index = WordGroupIndex::from_definitions(["  authority, obey, respect  "]);
        let labels: Vec<&str> = index.labels().collect();
        assert_eq!(labels, vec!["authority, obey, respect"]);
    }

    #[test]
    fn test_word_in_multiple_groups() {
        let index = WordGroupIndex::from_definitions(["king, queen", "queen, princess"]);

        assert_eq!(index.groups_of("queen"), Some(&[0, 1][..]));
        assert_eq!(index.groups_of("king"), Some(&[0][..]));
        assert_eq!(index.groups_of("princess"), Some(&[1][..]));
        assert_eq!(index.word_count(), 3);
    }

    #[test]
    fn test_case_sensitive() {
        let index = WordGroupIndex::from_definitions(["King"]);
        assert!(index.contains_word("King"));
        assert!(!index.contains_word("king"));
    }

    #[test]
    fn test_empty_tokens_and_repeats() {
        let index = WordGroupIndex::from_definitions(["a,,b, a ,"]);
        assert_eq!(index.groups()[0].members, vec!["a", "b"]);
        assert_eq!(index.groups_of("a"), Some(&[0][..]));
    }

    #[test]
    fn test_group_without_words_keeps_id() {
        let index = WordGroupIndex::from_definitions([",,", "x"]);
        assert_eq!(index.len(), 2);
        assert!(index.groups()[0].members.is_empty());
        assert_eq!(index.groups_of("x"), Some(&[1][..]));
    }
}
