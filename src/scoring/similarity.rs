//! Vector Similarity Functions
//!
//! Cosine similarity in double precision with an explicit result for
//! directions that are not defined.

use std::fmt;

/// Why a similarity could not be computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndefinedReason {
    /// None of the document's tokens exist in the model
    NoRecognizedTokens,
    /// None of the group's words exist in the model
    NoRecognizedGroupWords,
    /// One of the vectors has zero magnitude
    ZeroNorm,
    /// A vector component overflowed while averaging
    NonFinite,
}

/// Cosine similarity between a document and a group, or the sentinel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Similarity {
    Value(f64),
    Undefined(UndefinedReason),
}

impl Similarity {
    /// The numeric similarity, if defined
    pub fn value(&self) -> Option<f64> {
        match self {
            Similarity::Value(v) => Some(*v),
            Similarity::Undefined(_) => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Similarity::Value(_))
    }
}

/// Undefined renders as an empty field
impl fmt::Display for Similarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Similarity::Value(v) => write!(f, "{}", v),
            Similarity::Undefined(_) => Ok(()),
        }
    }
}

/// Largest absolute component, or infinity if any component is not finite
#[inline]
fn max_abs(v: &[f64]) -> f64 {
    v.iter().fold(0.0f64, |m, x| if x.is_finite() { m.max(x.abs()) } else { f64::INFINITY })
}

/// Cosine similarity in [-1, 1], or the reason it is undefined.
///
/// Each vector is scaled by its largest absolute component before the dot
/// product and norms are accumulated, so large components cannot overflow.
#[inline]
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Similarity {
    debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let scale_a = max_abs(a);
    let scale_b = max_abs(b);
    if !scale_a.is_finite() || !scale_b.is_finite() {
        return Similarity::Undefined(UndefinedReason::NonFinite);
    }
    if scale_a == 0.0 || scale_b == 0.0 {
        return Similarity::Undefined(UndefinedReason::ZeroNorm);
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (x / scale_a, y / scale_b);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    // Both norms are at least 1 after scaling
    Similarity::Value((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}

/// Elementwise mean of the vectors yielded, or `None` if there were none
pub fn mean_vector<'a, I>(vectors: I, dimension: usize) -> Option<(Vec<f64>, usize)>
where
    I: IntoIterator<Item = &'a [f64]>,
{
    let mut sum = vec![0.0f64; dimension];
    let mut count = 0usize;
    for v in vectors {
        debug_assert_eq!(v.len(), dimension, "Vector dimensions must match");
        for (s, x) in sum.iter_mut().zip(v) {
            *s += x;
        }
        count += 1;
    }

    if count == 0 {
        return None;
    }
    let n = count as f64;
    for s in sum.iter_mut() {
        *s /= n;
    }
    Some((sum, count))
}
