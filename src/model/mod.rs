//! Vector Model Module
//!
//! Pretrained word-embedding file loading and the in-memory word -> vector
//! table.

mod loader;
mod reader;
mod stats;
mod table;

pub use loader::{load_model, strategy_for, DiscoverSize, KnownSize, LoadStrategy, LoadedModel};
pub use reader::{parse_header, parse_row, ModelHeader};
pub use stats::LoadStats;
pub use table::VectorModel;
