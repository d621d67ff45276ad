//! Group Centroids
//!
//! Running per-group sums fed while the model streams in, finalized into
//! mean vectors once loading completes.

use super::index::{GroupId, WordGroupIndex};

/// Accumulates member vectors for every group during model loading
#[derive(Debug)]
pub struct CentroidBuilder<'a> {
    index: &'a WordGroupIndex,
    dimension: usize,
    /// Flat `groups x dimension` running sums
    sums: Vec<f64>,
    found: Vec<usize>,
}

impl<'a> CentroidBuilder<'a> {
    /// Create a builder with zeroed sums for every group in `index`
    pub fn new(index: &'a WordGroupIndex, dimension: usize) -> Self {
        Self {
            index,
            dimension,
            sums: vec![0.0; index.len() * dimension],
            found: vec![0; index.len()],
        }
    }

    /// Feed one model row. Words outside every group are ignored.
    ///
    /// Returns true if the word belonged to at least one group.
    pub fn observe(&mut self, word: &str, vector: &[f64]) -> bool {
        debug_assert_eq!(vector.len(), self.dimension, "Vector dimensions must match");

        let Some(groups) = self.index.groups_of(word) else {
            return false;
        };

        for &group in groups {
            self.found[group] += 1;
            let start = group * self.dimension;
            for (sum, x) in self.sums[start..start + self.dimension]
                .iter_mut()
                .zip(vector)
            {
                *sum += x;
            }
        }
        true
    }

    /// Number of member words seen so far for a group
    pub fn found(&self, group: GroupId) -> usize {
        self.found[group]
    }

    /// Divide each sum by its found count. Groups with no recognized words
    /// become [`Centroid::Degenerate`].
    pub fn finish(self) -> GroupCentroids {
        let dimension = self.dimension;
        let centroids = self
            .found
            .iter()
            .enumerate()
            .map(|(group, &found)| {
                if found == 0 {
                    return Centroid::Degenerate;
                }
                let n = found as f64;
                let start = group * dimension;
                let mean = self.sums[start..start + dimension]
                    .iter()
                    .map(|sum| sum / n)
                    .collect();
                Centroid::Defined { mean, found }
            })
            .collect();

        GroupCentroids {
            centroids,
            dimension,
        }
    }
}

/// A group's finalized direction
#[derive(Debug, Clone, PartialEq)]
pub enum Centroid {
    /// Mean of `found` recognized member vectors
    Defined { mean: Vec<f64>, found: usize },
    /// No member word of the group exists in the model
    Degenerate,
}

impl Centroid {
    /// The mean vector, if the group had any recognized words
    pub fn vector(&self) -> Option<&[f64]> {
        match self {
            Centroid::Defined { mean, .. } => Some(mean),
            Centroid::Degenerate => None,
        }
    }

    /// Number of member words found in the model
    pub fn found(&self) -> usize {
        match self {
            Centroid::Defined { found, .. } => *found,
            Centroid::Degenerate => 0,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, Centroid::Degenerate)
    }
}

/// Finalized centroids in group-id order. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupCentroids {
    centroids: Vec<Centroid>,
    dimension: usize,
}

impl GroupCentroids {
    pub fn get(&self, group: GroupId) -> Option<&Centroid> {
        self.centroids.get(group)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Centroid> {
        self.centroids.iter()
    }

    /// Ids of groups with zero recognized words
    pub fn degenerate(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.centroids
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_degenerate())
            .map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.centroids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(defs: &[&str], rows: &[(&str, [f64; 2])]) -> GroupCentroids {
        let index = WordGroupIndex::from_definitions(defs);
        let mut builder = CentroidBuilder::new(&index, 2);
        for (word, v) in rows {
            builder.observe(word, v);
        }
        builder.finish()
    }

    #[test]
    fn test_centroid_is_mean_of_members() {
        let centroids = build(&["king,queen"], &[("king", [1.0, 0.0]), ("queen", [0.0, 1.0])]);

        let c = centroids.get(0).unwrap();
        assert_eq!(c.found(), 2);
        assert_eq!(c.vector().unwrap(), &[0.5, 0.5]);
    }

    #[test]
    fn test_unmatched_words_contribute_nothing() {
        let centroids = build(
            &["king,queen,emperor"],
            &[("king", [2.0, 4.0]), ("man", [100.0, 100.0])],
        );

        let c = centroids.get(0).unwrap();
        assert_eq!(c.found(), 1);
        assert_eq!(c.vector().unwrap(), &[2.0, 4.0]);
    }

    #[test]
    fn test_shared_word_feeds_both_groups() {
        let rows_without = [("king", [1.0, 0.0]), ("cat", [0.0, 1.0])];
        let before = build(&["king,queen", "cat,queen"], &rows_without);
        assert_eq!(before.get(0).unwrap().vector().unwrap(), &[1.0, 0.0]);
        assert_eq!(before.get(1).unwrap().vector().unwrap(), &[0.0, 1.0]);

        let rows_with = [("king", [1.0, 0.0]), ("cat", [0.0, 1.0]), ("queen", [1.0, 1.0])];
        let after = build(&["king,queen", "cat,queen"], &rows_with);
        assert_eq!(after.get(0).unwrap().vector().unwrap(), &[1.0, 0.5]);
        assert_eq!(after.get(1).unwrap().vector().unwrap(), &[0.5, 1.0]);
        assert_eq!(after.get(0).unwrap().found(), 2);
        assert_eq!(after.get(1).unwrap().found(), 2);
    }

    #[test]
    fn test_group_without_model_words_is_degenerate() {
        let centroids = build(&["king", "unicorn,dragon"], &[("king", [1.0, 0.0])]);

        assert!(!centroids.get(0).unwrap().is_degenerate());
        assert!(centroids.get(1).unwrap().is_degenerate());
        assert_eq!(centroids.get(1).unwrap().vector(), None);
        assert_eq!(centroids.degenerate().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_observe_reports_membership() {
        let index = WordGroupIndex::from_definitions(["a"]);
        let mut builder = CentroidBuilder::new(&index, 2);
        assert!(builder.observe("a", &[1.0, 1.0]));
        assert!(!builder.observe("b", &[1.0, 1.0]));
        assert_eq!(builder.found(0), 1);
    }
}
