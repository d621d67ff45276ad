//! Document Scorer
//!
//! Mean document vector against every group centroid.

use super::document::{Document, ScoreRow};
use super::similarity::{cosine_similarity, mean_vector, Similarity, UndefinedReason};
use crate::groups::{Centroid, GroupCentroids};
use crate::model::VectorModel;

/// Pure scoring over a loaded model and finalized centroids
#[derive(Debug, Clone, Copy)]
pub struct DocumentScorer<'s> {
    model: &'s VectorModel,
    centroids: &'s GroupCentroids,
}

impl<'s> DocumentScorer<'s> {
    pub fn new(model: &'s VectorModel, centroids: &'s GroupCentroids) -> Self {
        debug_assert_eq!(
            model.dimension(),
            centroids.dimension(),
            "Model and centroid dimensions must match"
        );
        Self { model, centroids }
    }

    /// Mean vector of the tokens found in the model, with the match count.
    ///
    /// Every occurrence counts, so repeated tokens weigh more.
    pub fn document_vector<S: AsRef<str>>(&self, tokens: &[S]) -> Option<(Vec<f64>, usize)> {
        mean_vector(
            tokens.iter().filter_map(|t| self.model.get(t.as_ref())),
            self.model.dimension(),
        )
    }

    /// Similarities in group-id order plus the number of matched tokens
    pub fn score_tokens<S: AsRef<str>>(&self, tokens: &[S]) -> (Vec<Similarity>, usize) {
        let Some((doc, matched)) = self.document_vector(tokens) else {
            let undefined = Similarity::Undefined(UndefinedReason::NoRecognizedTokens);
            return (vec![undefined; self.centroids.len()], 0);
        };

        let scores = self
            .centroids
            .iter()
            .map(|centroid| match centroid {
                Centroid::Defined { mean, .. } => cosine_similarity(mean, &doc),
                Centroid::Degenerate => Similarity::Undefined(UndefinedReason::NoRecognizedGroupWords),
            })
            .collect();

        (scores, matched)
    }

    /// Score one document
    pub fn score(&self, document: &Document) -> ScoreRow {
        let (scores, matched_tokens) = self.score_tokens(&document.tokens);
        ScoreRow {
            id: document.id.clone(),
            scores,
            matched_tokens,
        }
    }
}
