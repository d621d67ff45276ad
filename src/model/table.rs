//! Vector Model
//!
//! Word -> row index map plus one contiguous `rows x dimension` matrix.

use hashbrown::HashMap;

use crate::error::LoadError;

/// Word -> row index map filled in first-occurrence order
#[derive(Debug, Default)]
pub(crate) struct Vocabulary {
    map: HashMap<String, usize>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve room for `additional` words, reporting allocation failure
    pub fn try_reserve(&mut self, additional: usize, dimension: usize) -> Result<(), LoadError> {
        self.map
            .try_reserve(additional)
            .map_err(|_| LoadError::ResourceExhausted {
                rows: additional,
                dimension,
            })
    }

    /// Assign the next index to `word` if it is new.
    ///
    /// Returns `None` for a word that was already present; its index is kept.
    pub fn insert(&mut self, word: &str) -> Option<usize> {
        if self.map.contains_key(word) {
            return None;
        }
        let index = self.map.len();
        self.map.insert(word.to_string(), index);
        Some(index)
    }

    #[inline]
    pub fn get(&self, word: &str) -> Option<usize> {
        self.map.get(word).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}

/// Allocate an empty matrix with room for exactly `rows x dimension` values.
///
/// The returned vector never reallocates while it is filled row by row.
pub(crate) fn allocate_matrix(rows: usize, dimension: usize) -> Result<Vec<f64>, LoadError> {
    let exhausted = || LoadError::ResourceExhausted { rows, dimension };
    let len = rows.checked_mul(dimension).ok_or_else(exhausted)?;

    let mut data = Vec::new();
    data.try_reserve_exact(len).map_err(|_| exhausted())?;
    Ok(data)
}

/// Immutable word -> vector table
#[derive(Debug, Clone, PartialEq)]
pub struct VectorModel {
    index: HashMap<String, usize>,
    data: Vec<f64>,
    dimension: usize,
}

impl VectorModel {
    pub(crate) fn from_parts(vocabulary: Vocabulary, data: Vec<f64>, dimension: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            vocabulary.len() * dimension,
            "Matrix size must match vocabulary"
        );
        Self {
            index: vocabulary.map,
            data,
            dimension,
        }
    }

    /// Vector for a word (exact, case-sensitive match)
    #[inline]
    pub fn get(&self, word: &str) -> Option<&[f64]> {
        self.index_of(word).map(|i| self.row_unchecked(i))
    }

    /// Row index assigned to a word
    #[inline]
    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.index.get(word).copied()
    }

    /// Vector at a row index
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        (index < self.len()).then(|| self.row_unchecked(index))
    }

    #[inline]
    fn row_unchecked(&self, index: usize) -> &[f64] {
        let start = index * self.dimension;
        &self.data[start..start + self.dimension]
    }

    /// Check if a word exists in the model
    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    /// Iterate over `(word, row index)` pairs in arbitrary order
    pub fn words(&self) -> impl Iterator<Item = (&str, usize)> {
        self.index.iter().map(|(w, &i)| (w.as_str(), i))
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Vector width
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Bytes held by the vector matrix
    pub fn matrix_bytes(&self) -> usize {
        self.data.capacity() * std::mem::size_of::<f64>()
    }
}
