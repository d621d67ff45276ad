//! DDR - Distributed Dictionary Representation
//!
//! Scores tokenized documents against user-defined word groups using a
//! pretrained word-embedding model. Each group is represented by the mean
//! of its members' vectors, each document by the mean of its recognized
//! tokens' vectors, and the score is their cosine similarity.

pub mod config;
pub mod error;
pub mod groups;
pub mod input;
pub mod model;
pub mod output;
pub mod scoring;
pub mod session;

pub use config::{HeaderMode, LoadOptions, SessionConfig, VocabularySize};
pub use error::{ConfigError, DdrError, InputError, LoadError, ParseError, Result};
pub use groups::{Centroid, GroupCentroids, WordGroupIndex};
pub use input::DocumentReader;
pub use model::{LoadStats, VectorModel};
pub use output::ResultEmitter;
pub use scoring::{Document, DocumentId, DocumentScorer, ScoreRow, ScoringPool, ScoringPoolConfig, Similarity};
pub use session::Session;
