//! Scoring Session
//!
//! A validated configuration, a loaded model and its group centroids.
//! Immutable once opened; share it by reference across scoring threads.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::SessionConfig;
use crate::error::{ConfigError, Result};
use crate::groups::{GroupCentroids, WordGroupIndex};
use crate::model::{load_model, LoadStats, VectorModel};
use crate::scoring::{Document, DocumentScorer, ScoreRow};

/// Loaded model plus word groups, ready to score documents
#[derive(Debug)]
pub struct Session {
    model: VectorModel,
    groups: WordGroupIndex,
    centroids: GroupCentroids,
    stats: LoadStats,
}

impl Session {
    /// Validate `config` and load its model
    pub fn open(config: &SessionConfig) -> Result<Self> {
        Self::open_with_cancel(config, &CancellationToken::new())
    }

    /// Like [`open`](Self::open), giving up with `Cancelled` once `cancel`
    /// fires
    pub fn open_with_cancel(config: &SessionConfig, cancel: &CancellationToken) -> Result<Self> {
        let opts = config.validate()?;

        let groups = WordGroupIndex::from_definitions(&config.group_definitions);
        if groups.is_empty() {
            return Err(ConfigError::NoWordGroups.into());
        }
        info!(
            "{} word groups over {} distinct words",
            groups.len(),
            groups.word_count()
        );

        let loaded = load_model(&opts, &groups, cancel)?;

        for id in loaded.centroids.degenerate() {
            if let Some(group) = groups.get(id) {
                warn!(
                    "None of the words in group {:?} are in the model; its scores will be blank",
                    group.label
                );
            }
        }

        Ok(Self {
            model: loaded.model,
            groups,
            centroids: loaded.centroids,
            stats: loaded.stats,
        })
    }

    pub fn model(&self) -> &VectorModel {
        &self.model
    }

    pub fn groups(&self) -> &WordGroupIndex {
        &self.groups
    }

    pub fn centroids(&self) -> &GroupCentroids {
        &self.centroids
    }

    /// Group labels in column order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.groups.labels()
    }

    pub fn stats(&self) -> &LoadStats {
        &self.stats
    }

    /// Borrowing scorer for worker threads
    pub fn scorer(&self) -> DocumentScorer<'_> {
        DocumentScorer::new(&self.model, &self.centroids)
    }

    /// Score one document
    pub fn score(&self, document: &Document) -> ScoreRow {
        self.scorer().score(document)
    }
}
