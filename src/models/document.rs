//! Document models for the harvest-and-acquire pipeline.
//!
//! A `RawCandidate` is one result item as observed on a search page, with
//! optional fields still in their raw display form. Ranking normalizes
//! candidates into `RankedRecord`s, and a successful acquisition produces
//! the persisted `DocumentRecord`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel stored for optional fields whose sub-element was absent.
pub const OPTIONAL_FIELD_SENTINEL: &str = "N/A";

/// One harvested, not-yet-ranked metadata record.
///
/// Transient: produced per result item and consumed by ranking, never
/// persisted. `views_raw`/`pages_raw`/`upload_date_raw` hold the display
/// strings as observed (e.g. "12,345 vues") or [`OPTIONAL_FIELD_SENTINEL`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawCandidate {
    pub title: String,
    pub url: String,
    pub views_raw: String,
    pub pages_raw: String,
    pub upload_date_raw: String,
}

/// A deduplicated, normalized candidate destined for acquisition.
///
/// `views` and `pages` are always numeric here; no raw display strings
/// survive normalization. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedRecord {
    pub title: String,
    pub url: String,
    pub views: u64,
    pub pages: u64,
    pub upload_date: String,
}

impl RankedRecord {
    /// Derive the canonical on-disk file name from the record's URL slug.
    ///
    /// The last path segment is mangled to uppercase alphanumerics with
    /// underscores, matching the layout acquisition renames files into.
    pub fn file_name(&self) -> String {
        let slug = self.url.rsplit('/').next().unwrap_or(&self.url);
        let mangled: String = slug
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}.pdf", mangled)
    }
}

/// The persisted unit describing one acquired document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Unique identifier within the storage sink.
    pub id: String,
    /// File name within the download directory.
    pub file_name: String,
    /// Path relative to the download root.
    pub file_path: String,
    /// File type of the stored content.
    pub file_type: String,
    /// Document title as harvested.
    pub title: Option<String>,
    /// URL the document was harvested from.
    pub source_url: Option<String>,
    /// Page count, when known.
    pub pages: Option<u64>,
    /// View count, when known.
    pub views: Option<u64>,
    /// Text content extracted downstream, if any.
    pub extracted_text: Option<String>,
    /// Tags for categorization.
    pub tags: Vec<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Create a record for a freshly acquired file.
    pub fn new(id: String, file_name: String, file_path: String) -> Self {
        Self {
            id,
            file_name,
            file_path,
            file_type: "pdf".to_string(),
            title: None,
            source_url: None,
            pages: None,
            views: None,
            extracted_text: None,
            tags: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Create a record from the ranked metadata that drove the acquisition.
    pub fn from_ranked(record: &RankedRecord, file_name: String, file_path: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_name,
            file_path,
            file_type: "pdf".to_string(),
            title: Some(record.title.clone()),
            source_url: Some(record.url.clone()),
            pages: Some(record.pages),
            views: Some(record.views),
            extracted_text: None,
            tags: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Attach extracted text. The single permitted mutation after creation.
    pub fn enrich_text(&mut self, text: String) {
        self.extracted_text = Some(text);
    }
}
