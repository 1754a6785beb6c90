//! The searchable site index: data model, construction and search

mod builder;
mod model;
mod search;

pub use builder::{BuildOutcome, IndexBuilder, LINKS_SAMPLED_PER_PAGE};
pub use model::{Index, IndexMetadata, LinkRecord, PageRecord};
pub use search::{search, search_index, Finding, FindingType, SearchMode, SearchQuery, SearchResults};
