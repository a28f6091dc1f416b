//! Data models for harvested and acquired documents.

mod document;

pub use document::{DocumentRecord, RankedRecord, RawCandidate, OPTIONAL_FIELD_SENTINEL};
