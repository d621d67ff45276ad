//! Scoring Module
//!
//! Document vectors, cosine similarity against group centroids, and a
//! worker pool for scoring many documents at once.

mod document;
mod pool;
mod scorer;
mod similarity;

pub use document::{Document, DocumentId, ScoreRow};
pub use pool::{ScoringPool, ScoringPoolConfig};
pub use scorer::DocumentScorer;
pub use similarity::{cosine_similarity, mean_vector, Similarity, UndefinedReason};
