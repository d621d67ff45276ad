//! Model Loader
//!
//! Two strategies over the same row parser and centroid accumulation:
//! - `KnownSize`: vocabulary size supplied up front, one pass straight into
//!   a pre-allocated matrix
//! - `DiscoverSize`: first pass builds the word index and group sums without
//!   keeping rows, second pass fills a matrix sized from the first

use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::reader::ModelReader;
use super::stats::LoadStats;
use super::table::{allocate_matrix, VectorModel, Vocabulary};
use crate::config::{LoadOptions, VocabularySize};
use crate::error::LoadError;
use crate::groups::{CentroidBuilder, GroupCentroids, WordGroupIndex};

/// Everything produced by a successful load
#[derive(Debug)]
pub struct LoadedModel {
    pub model: VectorModel,
    pub centroids: GroupCentroids,
    pub stats: LoadStats,
}

/// A way of streaming a model file into memory
pub trait LoadStrategy: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Load the model and group centroids. Nothing is returned on error.
    fn load(
        &self,
        opts: &LoadOptions,
        groups: &WordGroupIndex,
        cancel: &CancellationToken,
    ) -> Result<LoadedModel, LoadError>;
}

/// Single pass into a matrix of the declared size
#[derive(Debug, Clone, Copy)]
pub struct KnownSize {
    pub rows: usize,
}

/// Two passes: discover the row count, then fill the matrix
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoverSize;

/// Pick the strategy for the configured vocabulary size
pub fn strategy_for(vocabulary: VocabularySize) -> Box<dyn LoadStrategy> {
    match vocabulary {
        VocabularySize::Known(rows) => Box::new(KnownSize { rows }),
        VocabularySize::Unknown => Box::new(DiscoverSize),
    }
}

/// Load with the strategy selected by `opts`
pub fn load_model(
    opts: &LoadOptions,
    groups: &WordGroupIndex,
    cancel: &CancellationToken,
) -> Result<LoadedModel, LoadError> {
    let strategy = strategy_for(opts.vocabulary);
    info!(
        "Loading model {} ({} dims) with {} strategy",
        opts.path.display(),
        opts.dim(),
        strategy.name()
    );

    let loaded = strategy.load(opts, groups, cancel)?;
    info!("Model loaded: {}", loaded.stats.summary());
    Ok(loaded)
}

/// Stream every row once, assigning indices to new words and feeding group
/// sums. `on_new_row` sees the vector of each first occurrence.
fn scan<F>(
    reader: &mut ModelReader<'_>,
    vocabulary: &mut Vocabulary,
    centroids: &mut CentroidBuilder<'_>,
    stats: &mut LoadStats,
    mut on_new_row: F,
) -> Result<(), LoadError>
where
    F: FnMut(&[f64], usize) -> Result<(), LoadError>,
{
    while let Some(row) = reader.next_row()? {
        if vocabulary.insert(row.word).is_none() {
            stats.duplicates += 1;
            continue;
        }
        on_new_row(row.vector, row.line)?;
        if centroids.observe(row.word, row.vector) {
            stats.group_words_found += 1;
        }
    }

    stats.lines = reader.lines_read();
    stats.blank_lines = reader.blank_lines();
    stats.lossy_words = reader.lossy_words();
    if stats.lossy_words > 0 {
        warn!(
            "{} model words contained bytes invalid in the configured encoding; \
             words that decode alike are treated as duplicates",
            stats.lossy_words
        );
    }
    stats.rows = vocabulary.len();
    Ok(())
}

/// Re-read the file and store each word's first vector at the index the
/// first pass gave it. Any row the first pass did not see means the file
/// changed in between.
fn fill_matrix(
    reader: &mut ModelReader<'_>,
    vocabulary: &Vocabulary,
    dimension: usize,
) -> Result<Vec<f64>, LoadError> {
    let rows = vocabulary.len();
    let mut data = allocate_matrix(rows, dimension)?;
    let mut next = 0usize;
    while let Some(row) = reader.next_row()? {
        match vocabulary.get(row.word) {
            Some(index) if index == next => {
                data.extend_from_slice(row.vector);
                next += 1;
            }
            Some(index) if index < next => {}
            _ => return Err(LoadError::SourceChanged { line: row.line }),
        }
    }
    if next != rows {
        return Err(LoadError::SourceChanged {
            line: reader.lines_read(),
        });
    }
    Ok(data)
}

fn check_cancelled(cancel: &CancellationToken) -> Result<(), LoadError> {
    if cancel.is_cancelled() {
        return Err(LoadError::Cancelled);
    }
    Ok(())
}

impl LoadStrategy for KnownSize {
    fn name(&self) -> &'static str {
        "known-size"
    }

    fn load(
        &self,
        opts: &LoadOptions,
        groups: &WordGroupIndex,
        cancel: &CancellationToken,
    ) -> Result<LoadedModel, LoadError> {
        let start = Instant::now();
        let dimension = opts.dim();
        check_cancelled(cancel)?;

        let mut data = allocate_matrix(self.rows, dimension)?;
        let capacity = self.rows * dimension;
        let mut vocabulary = Vocabulary::new();
        vocabulary.try_reserve(self.rows, dimension)?;

        let mut centroids = CentroidBuilder::new(groups, dimension);
        let mut stats = LoadStats::new(self.name());
        let mut reader = ModelReader::open(opts, cancel)?;

        scan(
            &mut reader,
            &mut vocabulary,
            &mut centroids,
            &mut stats,
            |vector, line| {
                if data.len() == capacity {
                    return Err(LoadError::VocabularyOverflow {
                        declared: self.rows,
                        line,
                    });
                }
                data.extend_from_slice(vector);
                Ok(())
            },
        )?;
        check_cancelled(cancel)?;

        if let Some(header) = reader.header() {
            if header.vocabulary != self.rows {
                warn!(
                    "Model header declares {} rows but vocabulary size is configured as {}",
                    header.vocabulary, self.rows
                );
            }
        }
        if stats.rows < self.rows {
            debug!(
                "Model has {} distinct rows, {} fewer than configured",
                stats.rows,
                self.rows - stats.rows
            );
        }

        stats.passes = 1;
        stats.matrix_bytes = data.capacity() * std::mem::size_of::<f64>();
        stats.elapsed = start.elapsed();

        Ok(LoadedModel {
            model: VectorModel::from_parts(vocabulary, data, dimension),
            centroids: centroids.finish(),
            stats,
        })
    }
}

impl LoadStrategy for DiscoverSize {
    fn name(&self) -> &'static str {
        "discover-size"
    }

    fn load(
        &self,
        opts: &LoadOptions,
        groups: &WordGroupIndex,
        cancel: &CancellationToken,
    ) -> Result<LoadedModel, LoadError> {
        let start = Instant::now();
        let dimension = opts.dim();
        check_cancelled(cancel)?;

        // Pass 1: word index and group sums only
        let mut vocabulary = Vocabulary::new();
        let mut centroids = CentroidBuilder::new(groups, dimension);
        let mut stats = LoadStats::new(self.name());
        {
            let mut reader = ModelReader::open(opts, cancel)?;
            scan(
                &mut reader,
                &mut vocabulary,
                &mut centroids,
                &mut stats,
                |_, _| Ok(()),
            )?;
        }
        let centroids = centroids.finish();
        let rows = vocabulary.len();
        debug!("First pass found {} distinct rows", rows);
        check_cancelled(cancel)?;

        // Pass 2: fill the matrix in index order
        let mut reader = ModelReader::open(opts, cancel)?;
        let data = fill_matrix(&mut reader, &vocabulary, dimension)?;
        check_cancelled(cancel)?;

        stats.passes = 2;
        stats.matrix_bytes = data.capacity() * std::mem::size_of::<f64>();
        stats.elapsed = start.elapsed();

        Ok(LoadedModel {
            model: VectorModel::from_parts(vocabulary, data, dimension),
            centroids,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HeaderMode, SessionConfig};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &[u8] = b"5 3\n\
        king 0.5 0.1 -0.2\n\
        queen 0.4 0.3 -0.1\n\
        man 0.2 -0.6 0.9\n\
        king 9 9 9\n\
        \n\
        woman 0.1 0.7 0.3\n\
        child -0.3 0.2 0.05\n";

    fn write_model(contents: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file.flush().unwrap();
        file
    }

    fn options(file: &NamedTempFile, dim: i64, vocab: i64) -> LoadOptions {
        SessionConfig::default()
            .with_file_path(file.path())
            .with_vector_dimension(dim)
            .with_vocabulary_size(vocab)
            .with_groups(["king, queen", "queen, woman", "unicorn"])
            .validate()
            .unwrap()
    }

    fn load(opts: &LoadOptions) -> Result<LoadedModel, LoadError> {
        let groups = WordGroupIndex::from_definitions(["king, queen", "queen, woman", "unicorn"]);
        load_model(opts, &groups, &CancellationToken::new())
    }

    #[test]
    fn test_strategy_selection() {
        assert_eq!(strategy_for(VocabularySize::Known(5)).name(), "known-size");
        assert_eq!(strategy_for(VocabularySize::Unknown).name(), "discover-size");
    }

    #[test]
    fn test_known_size_load() {
        let file = write_model(SAMPLE);
        let loaded = load(&options(&file, 3, 5)).unwrap();

        assert_eq!(loaded.model.len(), 5);
        assert_eq!(loaded.model.index_of("king"), Some(0));
        assert_eq!(loaded.model.index_of("child"), Some(4));
        assert_eq!(loaded.model.get("king"), Some(&[0.5, 0.1, -0.2][..]));
        assert_eq!(loaded.stats.passes, 1);
        assert_eq!(loaded.stats.duplicates, 1);
        assert_eq!(loaded.stats.blank_lines, 1);
    }

    #[test]
    fn test_strategies_agree() {
        let file = write_model(SAMPLE);
        let known = load(&options(&file, 3, 5)).unwrap();
        let discovered = load(&options(&file, 3, -1)).unwrap();

        assert_eq!(discovered.stats.passes, 2);
        assert_eq!(known.model, discovered.model);
        assert_eq!(known.centroids, discovered.centroids);
        for (word, index) in known.model.words() {
            assert_eq!(discovered.model.index_of(word), Some(index));
            assert_eq!(discovered.model.get(word), known.model.get(word));
        }
    }

    #[test]
    fn test_duplicates_do_not_feed_centroids() {
        let file = write_model(SAMPLE);
        let loaded = load(&options(&file, 3, -1)).unwrap();

        let c = loaded.centroids.get(0).unwrap();
        assert_eq!(c.found(), 2);
        let mean = c.vector().unwrap();
        assert!((mean[0] - 0.45).abs() < 1e-12);
        assert!((mean[1] - 0.2).abs() < 1e-12);
        assert!((mean[2] + 0.15).abs() < 1e-12);

        assert_eq!(loaded.centroids.get(1).unwrap().found(), 2);
        assert!(loaded.centroids.get(2).unwrap().is_degenerate());
        assert_eq!(loaded.stats.group_words_found, 3);
    }

    #[test]
    fn test_smaller_model_than_declared() {
        let file = write_model(SAMPLE);
        let loaded = load(&options(&file, 3, 100)).unwrap();
        assert_eq!(loaded.model.len(), 5);
        assert_eq!(loaded.model.row(4), Some(&[-0.3, 0.2, 0.05][..]));
    }

    #[test]
    fn test_vocabulary_overflow() {
        let file = write_model(SAMPLE);
        let err = load(&options(&file, 3, 2)).unwrap_err();
        assert!(matches!(
            err,
            LoadError::VocabularyOverflow {
                declared: 2,
                line: 4
            }
        ));
    }

    #[test]
    fn test_parse_error_aborts_both_strategies() {
        let file = write_model(b"king 1 0\nqueen 0 x\n");
        for vocab in [2, -1] {
            match load(&options(&file, 2, vocab)) {
                Err(LoadError::Parse(e)) => assert_eq!(e.line, 2),
                other => panic!("expected parse error, got {:?}", other.map(|l| l.stats)),
            }
        }
    }

    #[test]
    fn test_cancelled_before_load() {
        let file = write_model(SAMPLE);
        let groups = WordGroupIndex::from_definitions(["king"]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        for vocab in [5, -1] {
            let err = load_model(&options(&file, 3, vocab), &groups, &cancel).unwrap_err();
            assert!(matches!(err, LoadError::Cancelled));
        }
    }

    /// First-pass vocabulary for `file`
    fn first_pass(opts: &LoadOptions, cancel: &CancellationToken) -> Result<Vocabulary, LoadError> {
        let groups = WordGroupIndex::from_definitions(["king"]);
        let mut vocabulary = Vocabulary::new();
        let mut centroids = CentroidBuilder::new(&groups, opts.dim());
        let mut stats = LoadStats::new("test");
        let mut reader = ModelReader::open(opts, cancel)?;
        scan(&mut reader, &mut vocabulary, &mut centroids, &mut stats, |_, _| Ok(()))?;
        Ok(vocabulary)
    }

    #[test]
    fn test_file_changed_between_passes() {
        let cancel = CancellationToken::new();
        let file = write_model(b"king 1 0\nqueen 0 1\nman 1 1\n");
        let opts = options(&file, 2, -1);
        let vocabulary = first_pass(&opts, &cancel).unwrap();

        // New word in the second pass
        let changed = write_model(b"king 1 0\nwoman 0 1\nman 1 1\n");
        let mut reader = ModelReader::open(&options(&changed, 2, -1), &cancel).unwrap();
        let err = fill_matrix(&mut reader, &vocabulary, 2).unwrap_err();
        assert!(matches!(err, LoadError::SourceChanged { line: 2 }));

        // Rows reordered
        let reordered = write_model(b"queen 0 1\nking 1 0\nman 1 1\n");
        let mut reader = ModelReader::open(&options(&reordered, 2, -1), &cancel).unwrap();
        let err = fill_matrix(&mut reader, &vocabulary, 2).unwrap_err();
        assert!(matches!(err, LoadError::SourceChanged { line: 1 }));

        // Truncated
        let truncated = write_model(b"king 1 0\nqueen 0 1\n");
        let mut reader = ModelReader::open(&options(&truncated, 2, -1), &cancel).unwrap();
        let err = fill_matrix(&mut reader, &vocabulary, 2).unwrap_err();
        assert!(matches!(err, LoadError::SourceChanged { line: 2 }));

        // Unchanged file fills every row
        let mut reader = ModelReader::open(&opts, &cancel).unwrap();
        let data = fill_matrix(&mut reader, &vocabulary, 2).unwrap();
        assert_eq!(data, vec![1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_cancelled_during_pass() {
        let mut contents = Vec::new();
        for i in 0..5000 {
            writeln!(contents, "w{} {} 1", i, i).unwrap();
        }
        let file = write_model(&contents);
        let opts = options(&file, 2, -1);

        let cancel = CancellationToken::new();
        let mut reader = ModelReader::open(&opts, &cancel).unwrap();
        let mut read = 0;
        while read < 100 {
            reader.next_row().unwrap().unwrap();
            read += 1;
        }
        cancel.cancel();
        loop {
            match reader.next_row() {
                Ok(Some(_)) => read += 1,
                Ok(None) => panic!("reader finished despite cancellation"),
                Err(e) => {
                    assert!(matches!(e, LoadError::Cancelled));
                    break;
                }
            }
        }
        assert_eq!(read, 4095);

        let err = first_pass(&opts, &cancel).unwrap_err();
        assert!(matches!(err, LoadError::Cancelled));
    }

    #[test]
    fn test_lossy_words_collapse_into_duplicates() {
        let file = write_model(b"k\xFF 1 0\nk\xFE 0 1\nking 1 1\n");
        for vocab in [3, -1] {
            let loaded = load(&options(&file, 2, vocab)).unwrap();
            assert_eq!(loaded.stats.lossy_words, 2);
            assert_eq!(loaded.stats.duplicates, 1);
            assert_eq!(loaded.model.get("k\u{FFFD}"), Some(&[1.0, 0.0][..]));
        }
    }

    #[test]
    fn test_huge_known_size_is_resource_exhausted() {
        let file = write_model(SAMPLE);
        let err = load(&options(&file, 3, i64::MAX)).unwrap_err();
        assert!(matches!(err, LoadError::ResourceExhausted { .. }));
    }

    #[test]
    fn test_headerless_file_both_strategies() {
        let file = write_model(b"a 1 2\nb 3 4\n");
        let mut opts = options(&file, 2, 2);
        opts.header = HeaderMode::Absent;
        let known = load(&opts).unwrap();

        opts.vocabulary = VocabularySize::Unknown;
        let discovered = load(&opts).unwrap();
        assert_eq!(known.model, discovered.model);
        assert_eq!(discovered.model.get("b"), Some(&[3.0, 4.0][..]));
    }
}
