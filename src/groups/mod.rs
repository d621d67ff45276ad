//! Word Groups
//!
//! User-defined word groups and their embedding centroids.

mod centroid;
mod index;

pub use centroid::{Centroid, CentroidBuilder, GroupCentroids};
pub use index::{GroupId, WordGroup, WordGroupIndex};
