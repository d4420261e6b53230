//! Curated opening catalogue: records, loading and selector grouping.

pub mod catalogue;
pub mod error;
pub mod lichess;
pub mod record;

pub use catalogue::{Catalogue, GroupOption, DEFAULT_MAX_GROUP_SIZE};
pub use error::CatalogueError;
pub use record::OpeningRecord;
