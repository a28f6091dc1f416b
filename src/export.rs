//! The ranked-record CSV contract.
//!
//! The export file is written after ranking and read back before
//! acquisition, so its schema is a stable contract: exactly the five
//! columns `Title, Link, Views, Pages, Upload Date`, UTF-8, one row per
//! record in ranked order. A missing file, missing column, or empty file
//! is fatal to a run — there is nothing to acquire.

use std::path::Path;

use crate::error::ExportError;
use crate::models::RankedRecord;

pub const TITLE: &str = "Title";
pub const LINK: &str = "Link";
pub const VIEWS: &str = "Views";
pub const PAGES: &str = "Pages";
pub const UPLOAD_DATE: &str = "Upload Date";

/// Column names, in on-disk order.
pub const COLUMNS: [&str; 5] = [TITLE, LINK, VIEWS, PAGES, UPLOAD_DATE];

/// Write ranked records to the export file, ranked order preserved.
pub fn write_records(path: &Path, records: &[RankedRecord]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(COLUMNS)?;
    for record in records {
        let views = record.views.to_string();
        let pages = record.pages.to_string();
        writer.write_record([
            record.title.as_str(),
            record.url.as_str(),
            views.as_str(),
            pages.as_str(),
            record.upload_date.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Read the export file back, validating the contract.
///
/// Rows without a link are dropped; numeric fields that fail to parse fall
/// back to 0 (the file may have been edited by hand between runs).
pub fn read_records(path: &Path) -> Result<Vec<RankedRecord>, ExportError> {
    if !path.exists() {
        return Err(ExportError::Missing(path.to_path_buf()));
    }

    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let position = |name: &'static str| -> Result<usize, ExportError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(ExportError::MissingColumn(name))
    };
    let title_idx = position(TITLE)?;
    let link_idx = position(LINK)?;
    let views_idx = position(VIEWS)?;
    let pages_idx = position(PAGES)?;
    let date_idx = position(UPLOAD_DATE)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let url = row.get(link_idx).unwrap_or("").trim();
        if url.is_empty() {
            continue;
        }
        records.push(RankedRecord {
            title: row.get(title_idx).unwrap_or("").to_string(),
            url: url.to_string(),
            views: row.get(views_idx).and_then(|v| v.parse().ok()).unwrap_or(0),
            pages: row.get(pages_idx).and_then(|v| v.parse().ok()).unwrap_or(0),
            upload_date: row.get(date_idx).unwrap_or("").to_string(),
        });
    }

    if records.is_empty() {
        return Err(ExportError::NoRows);
    }
    Ok(records)
}
