//! Documents and Score Rows

use serde::{Deserialize, Serialize};

use super::similarity::Similarity;

/// Caller-supplied identifiers carried through scoring untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentId {
    pub file_id: String,
    #[serde(default)]
    pub segment_id: String,
    #[serde(default)]
    pub sequence_number: u64,
}

impl DocumentId {
    pub fn new(file_id: impl Into<String>, segment_id: impl Into<String>, sequence_number: u64) -> Self {
        Self {
            file_id: file_id.into(),
            segment_id: segment_id.into(),
            sequence_number,
        }
    }
}

/// An already-tokenized document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub tokens: Vec<String>,
}

impl Document {
    pub fn new<I, S>(id: DocumentId, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }
}

/// One similarity per group, in group-id order
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRow {
    pub id: DocumentId,
    pub scores: Vec<Similarity>,
    /// Tokens found in the model
    pub matched_tokens: usize,
}
